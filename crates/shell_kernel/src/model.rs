//! Authoritative data model for the desktop shell kernel.

use serde::{Deserialize, Serialize};
use shell_kernel_contract::{ApplicationId, RenderTargetHandle};

/// Schema version for persisted shortcut snapshots.
pub const SHORTCUT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_WINDOW_WIDTH: i32 = 420;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DesktopId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabGroupId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }

    /// Whether a pointer position falls inside this rectangle.
    pub fn contains(self, p: PointerPosition) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: 48,
            y: 48,
            w: DEFAULT_WINDOW_WIDTH,
            h: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

/// Snap target regions a window can be committed into.
///
/// `Maximize` is reachable only through templates/actions, never from the
/// pointer decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapZone {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Top,
    Bottom,
    Center,
    Maximize,
}

/// Layout algorithm bound to a window group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMode {
    Cascade,
    TileHorizontal,
    TileVertical,
    Grid,
}

/// Lifecycle state of a managed window. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Snapped(SnapZone),
    /// Picture-in-picture: floating in the always-on-top tier.
    Pip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlags {
    pub resizable: bool,
    pub always_on_top: bool,
    pub single_instance: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            resizable: true,
            always_on_top: false,
            single_instance: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub app_id: ApplicationId,
    pub title: String,
    pub rect: WindowRect,
    pub restore_rect: Option<WindowRect>,
    pub z_index: u32,
    pub is_focused: bool,
    pub state: WindowState,
    pub desktop_id: DesktopId,
    pub group_id: Option<GroupId>,
    pub tab_group_id: Option<TabGroupId>,
    pub flags: WindowFlags,
    pub render_target: RenderTargetHandle,
}

impl WindowRecord {
    /// Whether this window paints above the normal tier.
    pub fn on_top_tier(&self) -> bool {
        self.flags.always_on_top || self.state == WindowState::Pip
    }

    pub fn minimized(&self) -> bool {
        self.state == WindowState::Minimized
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDesktop {
    pub id: DesktopId,
    pub name: String,
    pub wallpaper_id: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGroup {
    pub id: GroupId,
    pub name: String,
    /// Member ids; insertion-ordered, duplicate-free.
    pub members: Vec<WindowId>,
    pub layout: LayoutMode,
    /// Monotonic creation order (the kernel carries no clock).
    pub created_order: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGroup {
    pub id: TabGroupId,
    /// Member ids in tab order.
    pub members: Vec<WindowId>,
    /// The single member currently visible.
    pub active_tab: WindowId,
}

/// Short-lived drag gesture state; exists only between pointer-down on a
/// titlebar and pointer-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    /// Pointer position at drag start.
    pub started_at: PointerPosition,
    pub pointer: PointerPosition,
    /// Snap preview; applied to the window only on commit.
    pub candidate_zone: Option<SnapZone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub dragging: Option<DragSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellState {
    pub next_window_id: u64,
    pub next_desktop_id: u64,
    pub next_group_id: u64,
    pub next_tab_group_id: u64,
    pub group_creation_counter: u64,
    pub windows: Vec<WindowRecord>,
    pub desktops: Vec<VirtualDesktop>,
    pub active_desktop: DesktopId,
    pub groups: Vec<WindowGroup>,
    pub tab_groups: Vec<TabGroup>,
}

impl Default for ShellState {
    fn default() -> Self {
        let primary = DesktopId(1);
        Self {
            next_window_id: 1,
            next_desktop_id: 2,
            next_group_id: 1,
            next_tab_group_id: 1,
            group_creation_counter: 0,
            windows: Vec::new(),
            desktops: vec![VirtualDesktop {
                id: primary,
                name: "Desktop 1".to_string(),
                wallpaper_id: "default".to_string(),
                is_active: true,
            }],
            active_desktop: primary,
            groups: Vec::new(),
            tab_groups: Vec::new(),
        }
    }
}

impl ShellState {
    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| w.id)
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Windows the view layer should paint: records on the active desktop.
    ///
    /// Tab-group members that are not the active tab are logically present
    /// but excluded from the visible set.
    pub fn visible_windows(&self) -> Vec<&WindowRecord> {
        self.windows
            .iter()
            .filter(|w| w.desktop_id == self.active_desktop)
            .filter(|w| match w.tab_group_id {
                Some(tab_group_id) => self
                    .tab_groups
                    .iter()
                    .find(|t| t.id == tab_group_id)
                    .map(|t| t.active_tab == w.id)
                    .unwrap_or(true),
                None => true,
            })
            .collect()
    }
}
