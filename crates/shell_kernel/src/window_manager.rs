//! Shared window-registry transition helpers used by the shell reducer.

use crate::model::{ShellState, WindowId, WindowRecord, WindowState};

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 220;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 140;

/// Focuses and raises `window_id` within its z-tier.
///
/// Returns `false` when the window does not exist. Always-on-top windows are
/// kept in a permanently higher tier by [`normalize_window_stack`], so
/// raising a normal window never covers them.
pub fn focus_window(state: &mut ShellState, window_id: WindowId) -> bool {
    let Some(index) = state.windows.iter().position(|w| w.id == window_id) else {
        return false;
    };

    for window in &mut state.windows {
        window.is_focused = false;
    }
    let mut window = state.windows.remove(index);
    window.is_focused = true;
    if window.state == WindowState::Minimized {
        restore_window(&mut window);
    }
    state.windows.push(window);
    normalize_window_stack(state);
    true
}

/// Normalizes stacking and focus invariants for all managed windows.
///
/// The window vec is kept bottom-to-top with the normal tier below the
/// always-on-top tier; `z_index` mirrors the vec position. Minimized windows
/// and windows on inactive desktops cannot hold focus. When nothing holds
/// focus, the topmost eligible window on the active desktop takes it.
pub fn normalize_window_stack(state: &mut ShellState) {
    let mut normal: Vec<WindowRecord> = Vec::with_capacity(state.windows.len());
    let mut pinned: Vec<WindowRecord> = Vec::new();
    for window in state.windows.drain(..) {
        if window.on_top_tier() {
            pinned.push(window);
        } else {
            normal.push(window);
        }
    }
    normal.extend(pinned);
    state.windows = normal;

    let active_desktop = state.active_desktop;
    let mut has_focused = false;
    for (idx, window) in state.windows.iter_mut().enumerate() {
        window.z_index = (idx + 1) as u32;
        if window.minimized() || window.desktop_id != active_desktop {
            window.is_focused = false;
        }
        if window.is_focused {
            if has_focused {
                window.is_focused = false;
            } else {
                has_focused = true;
            }
        }
    }

    if !has_focused {
        if let Some(top) = state
            .windows
            .iter_mut()
            .rev()
            .find(|w| !w.minimized() && w.desktop_id == active_desktop)
        {
            top.is_focused = true;
        }
    }
}

/// Records the current rectangle before a window leaves `Normal`.
pub fn save_restore_rect(window: &mut WindowRecord) {
    if window.state == WindowState::Normal {
        window.restore_rect = Some(window.rect);
    }
}

/// Returns a window to `Normal`, restoring its pre-transition rectangle.
pub fn restore_window(window: &mut WindowRecord) {
    if let Some(rect) = window.restore_rect.take() {
        window.rect = rect;
    }
    window.state = WindowState::Normal;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shell_kernel_contract::{ApplicationId, RenderTargetHandle};

    use super::*;
    use crate::model::{DesktopId, WindowFlags, WindowRect};

    fn record(id: u64, always_on_top: bool) -> WindowRecord {
        WindowRecord {
            id: WindowId(id),
            app_id: ApplicationId::trusted("system.test"),
            title: format!("w{id}"),
            rect: WindowRect::default(),
            restore_rect: None,
            z_index: 0,
            is_focused: false,
            state: WindowState::Normal,
            desktop_id: DesktopId(1),
            group_id: None,
            tab_group_id: None,
            flags: WindowFlags {
                always_on_top,
                ..Default::default()
            },
            render_target: RenderTargetHandle(0),
        }
    }

    #[test]
    fn focusing_a_normal_window_never_covers_the_pinned_tier() {
        let mut state = ShellState::default();
        state.windows.push(record(1, false));
        state.windows.push(record(2, true));
        state.windows.push(record(3, false));
        normalize_window_stack(&mut state);

        assert!(focus_window(&mut state, WindowId(1)));

        let order: Vec<u64> = state.windows.iter().map(|w| w.id.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
        let pinned = state.windows.iter().find(|w| w.id == WindowId(2)).unwrap();
        let focused = state.windows.iter().find(|w| w.id == WindowId(1)).unwrap();
        assert!(pinned.z_index > focused.z_index);
        assert!(focused.is_focused);
    }

    #[test]
    fn minimized_windows_cannot_hold_focus() {
        let mut state = ShellState::default();
        state.windows.push(record(1, false));
        state.windows.push(record(2, false));
        state.windows[1].is_focused = true;
        state.windows[1].state = WindowState::Minimized;

        normalize_window_stack(&mut state);

        assert_eq!(state.focused_window_id(), Some(WindowId(1)));
    }

    #[test]
    fn restore_returns_the_saved_rectangle() {
        let mut window = record(1, false);
        let original = window.rect;
        save_restore_rect(&mut window);
        window.state = WindowState::Maximized;
        window.rect = WindowRect {
            x: 0,
            y: 0,
            w: 1920,
            h: 1080,
        };

        restore_window(&mut window);

        assert_eq!(window.state, WindowState::Normal);
        assert_eq!(window.rect, original);
        assert_eq!(window.restore_rect, None);
    }
}
