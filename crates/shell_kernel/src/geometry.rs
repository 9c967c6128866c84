//! Pure geometry engine: pointer-to-zone resolution, zone rectangle
//! templates, and multi-window layout computation.
//!
//! Nothing in this module touches shell state; callers feed rectangles in
//! and write the results back through the window registry.

use crate::model::{LayoutMode, PointerPosition, SnapZone, WindowRect};

/// Edge band threshold for the pointer decision table, in percent.
const EDGE_BAND_PCT: i64 = 10;
/// Cascade offset applied per window, in pixels.
const CASCADE_STEP: (i32, i32) = (32, 28);
/// Cascade window size as a percentage of the container.
const CASCADE_SIZE_PCT: (i64, i64) = (60, 60);

/// Zone rectangle templates as `(x%, y%, w%, h%)` of the container.
const ZONE_TEMPLATES: [(SnapZone, (i64, i64, i64, i64)); 10] = [
    (SnapZone::TopLeft, (0, 0, 50, 50)),
    (SnapZone::TopRight, (50, 0, 50, 50)),
    (SnapZone::BottomLeft, (0, 50, 50, 50)),
    (SnapZone::BottomRight, (50, 50, 50, 50)),
    (SnapZone::Left, (0, 0, 50, 100)),
    (SnapZone::Right, (50, 0, 50, 100)),
    (SnapZone::Top, (0, 0, 100, 50)),
    (SnapZone::Bottom, (0, 50, 100, 50)),
    (SnapZone::Center, (20, 15, 60, 70)),
    (SnapZone::Maximize, (0, 0, 100, 100)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Low,
    Mid,
    High,
}

fn band(offset: i64, extent: i64) -> Band {
    // Percent position of the pointer along one axis.
    let pct = offset * 100 / extent.max(1);
    if pct < EDGE_BAND_PCT {
        Band::Low
    } else if pct > 100 - EDGE_BAND_PCT {
        Band::High
    } else {
        Band::Mid
    }
}

/// Resolves the snap zone under a pointer inside `container`.
///
/// Total over the container interior: every position maps to exactly one of
/// the four corners, four edges, or `Center`. `Center` covers the interior
/// band on both axes; `Maximize` is never produced here.
pub fn zone_for_pointer(pointer: PointerPosition, container: WindowRect) -> SnapZone {
    let x_band = band((pointer.x - container.x) as i64, container.w as i64);
    let y_band = band((pointer.y - container.y) as i64, container.h as i64);
    match (x_band, y_band) {
        (Band::Low, Band::Low) => SnapZone::TopLeft,
        (Band::High, Band::Low) => SnapZone::TopRight,
        (Band::Mid, Band::Low) => SnapZone::Top,
        (Band::Low, Band::High) => SnapZone::BottomLeft,
        (Band::High, Band::High) => SnapZone::BottomRight,
        (Band::Mid, Band::High) => SnapZone::Bottom,
        (Band::Low, Band::Mid) => SnapZone::Left,
        (Band::High, Band::Mid) => SnapZone::Right,
        (Band::Mid, Band::Mid) => SnapZone::Center,
    }
}

/// Resolves a zone's percentage template against an actual container.
pub fn rect_for_zone(zone: SnapZone, container: WindowRect) -> WindowRect {
    let (_, (x_pct, y_pct, w_pct, h_pct)) = ZONE_TEMPLATES
        .iter()
        .find(|(z, _)| *z == zone)
        .copied()
        .unwrap_or((SnapZone::Maximize, (0, 0, 100, 100)));
    let w = container.w as i64;
    let h = container.h as i64;
    WindowRect {
        x: container.x + (w * x_pct / 100) as i32,
        y: container.y + (h * y_pct / 100) as i32,
        w: (w * w_pct / 100) as i32,
        h: (h * h_pct / 100) as i32,
    }
}

/// Computes `count` rectangles laying windows out inside `container`.
///
/// Zero windows yields an empty layout.
pub fn layout_for(count: usize, mode: LayoutMode, container: WindowRect) -> Vec<WindowRect> {
    if count == 0 {
        return Vec::new();
    }
    match mode {
        LayoutMode::Cascade => cascade(count, container),
        LayoutMode::TileHorizontal => tile(count, container, true),
        LayoutMode::TileVertical => tile(count, container, false),
        LayoutMode::Grid => grid(count, container),
    }
}

fn cascade(count: usize, container: WindowRect) -> Vec<WindowRect> {
    let w = (container.w as i64 * CASCADE_SIZE_PCT.0 / 100) as i32;
    let h = (container.h as i64 * CASCADE_SIZE_PCT.1 / 100) as i32;
    (0..count)
        .map(|i| WindowRect {
            x: container.x + CASCADE_STEP.0 * i as i32,
            y: container.y + CASCADE_STEP.1 * i as i32,
            w,
            h,
        })
        .collect()
}

fn tile(count: usize, container: WindowRect, horizontal: bool) -> Vec<WindowRect> {
    (0..count)
        .map(|i| {
            if horizontal {
                let (start, end) = split_bounds(container.x, container.w, i, count);
                WindowRect {
                    x: start,
                    y: container.y,
                    w: end - start,
                    h: container.h,
                }
            } else {
                let (start, end) = split_bounds(container.y, container.h, i, count);
                WindowRect {
                    x: container.x,
                    y: start,
                    w: container.w,
                    h: end - start,
                }
            }
        })
        .collect()
}

fn grid(count: usize, container: WindowRect) -> Vec<WindowRect> {
    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    (0..count)
        .map(|i| {
            let row = i / cols;
            let col = i % cols;
            let (x0, x1) = split_bounds(container.x, container.w, col, cols);
            let (y0, y1) = split_bounds(container.y, container.h, row, rows);
            WindowRect {
                x: x0,
                y: y0,
                w: x1 - x0,
                h: y1 - y0,
            }
        })
        .collect()
}

/// Start/end of slot `i` when dividing `extent` into `slots` equal parts.
///
/// Boundaries are computed as `i * extent / slots` so adjacent slots share
/// edges exactly and the last slot ends on the container edge.
fn split_bounds(origin: i32, extent: i32, i: usize, slots: usize) -> (i32, i32) {
    let extent = extent as i64;
    let start = origin + (i as i64 * extent / slots as i64) as i32;
    let end = origin + ((i as i64 + 1) * extent / slots as i64) as i32;
    (start, end)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CONTAINER: WindowRect = WindowRect {
        x: 0,
        y: 0,
        w: 1000,
        h: 800,
    };

    fn at(x_pct: i32, y_pct: i32) -> PointerPosition {
        PointerPosition {
            x: CONTAINER.w * x_pct / 100,
            y: CONTAINER.h * y_pct / 100,
        }
    }

    #[test]
    fn pointer_zone_decision_table() {
        assert_eq!(zone_for_pointer(at(5, 5), CONTAINER), SnapZone::TopLeft);
        assert_eq!(zone_for_pointer(at(50, 5), CONTAINER), SnapZone::Top);
        assert_eq!(zone_for_pointer(at(95, 5), CONTAINER), SnapZone::TopRight);
        assert_eq!(zone_for_pointer(at(5, 50), CONTAINER), SnapZone::Left);
        assert_eq!(zone_for_pointer(at(50, 50), CONTAINER), SnapZone::Center);
        assert_eq!(zone_for_pointer(at(95, 50), CONTAINER), SnapZone::Right);
        assert_eq!(zone_for_pointer(at(5, 95), CONTAINER), SnapZone::BottomLeft);
        assert_eq!(zone_for_pointer(at(50, 95), CONTAINER), SnapZone::Bottom);
        assert_eq!(
            zone_for_pointer(at(95, 95), CONTAINER),
            SnapZone::BottomRight
        );
    }

    #[test]
    fn center_is_interior_only_and_maximize_unreachable() {
        for x in (0..100).step_by(7) {
            for y in (0..100).step_by(7) {
                let zone = zone_for_pointer(at(x, y), CONTAINER);
                assert_ne!(zone, SnapZone::Maximize);
                if zone == SnapZone::Center {
                    assert!((10..=90).contains(&x), "x={x}");
                    assert!((10..=90).contains(&y), "y={y}");
                }
            }
        }
    }

    #[test]
    fn zone_rect_resolves_percent_template() {
        assert_eq!(
            rect_for_zone(SnapZone::Left, CONTAINER),
            WindowRect {
                x: 0,
                y: 0,
                w: 500,
                h: 800
            }
        );
        assert_eq!(
            rect_for_zone(SnapZone::BottomRight, CONTAINER),
            WindowRect {
                x: 500,
                y: 400,
                w: 500,
                h: 400
            }
        );
        assert_eq!(rect_for_zone(SnapZone::Maximize, CONTAINER), CONTAINER);
    }

    #[test]
    fn grid_layout_uses_ceil_sqrt_columns_and_covers_all_windows() {
        for count in [1usize, 2, 3, 4, 5, 7, 9, 10] {
            let rects = layout_for(count, LayoutMode::Grid, CONTAINER);
            assert_eq!(rects.len(), count);

            let cols = (count as f64).sqrt().ceil() as usize;
            let rows = count.div_ceil(cols);
            let area: i64 = rects.iter().map(|r| r.w as i64 * r.h as i64).sum();
            let full_rows_area =
                CONTAINER.w as i64 * CONTAINER.h as i64 / rows as i64 * ((count / cols) as i64);
            assert!(area <= CONTAINER.w as i64 * CONTAINER.h as i64);
            assert!(area >= full_rows_area, "count={count}");

            // No pairwise overlap.
            for (i, a) in rects.iter().enumerate() {
                for b in rects.iter().skip(i + 1) {
                    let disjoint = a.x + a.w <= b.x
                        || b.x + b.w <= a.x
                        || a.y + a.h <= b.y
                        || b.y + b.h <= a.y;
                    assert!(disjoint, "count={count}: {a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn zero_window_layouts_are_empty() {
        for mode in [
            LayoutMode::Cascade,
            LayoutMode::TileHorizontal,
            LayoutMode::TileVertical,
            LayoutMode::Grid,
        ] {
            assert_eq!(layout_for(0, mode, CONTAINER), Vec::new());
        }
    }

    #[test]
    fn horizontal_tiles_share_boundaries() {
        let rects = layout_for(3, LayoutMode::TileHorizontal, CONTAINER);
        assert_eq!(rects[0].x, 0);
        assert_eq!(rects[0].x + rects[0].w, rects[1].x);
        assert_eq!(rects[1].x + rects[1].w, rects[2].x);
        assert_eq!(rects[2].x + rects[2].w, CONTAINER.w);
        assert!(rects.iter().all(|r| r.h == CONTAINER.h));
    }

    #[test]
    fn cascade_offsets_each_window_by_a_fixed_step() {
        let rects = layout_for(3, LayoutMode::Cascade, CONTAINER);
        assert_eq!(rects[1].x - rects[0].x, rects[2].x - rects[1].x);
        assert_eq!(rects[1].y - rects[0].y, rects[2].y - rects[1].y);
        assert!(rects.iter().all(|r| r.w == rects[0].w && r.h == rects[0].h));
    }
}
