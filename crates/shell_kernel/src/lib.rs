//! Desktop shell kernel: window registry, virtual desktops, snap/tile
//! geometry, grouping, shortcuts, and the serialized event dispatcher.
//!
//! The kernel is host-agnostic. All state transitions run through
//! [`reduce_shell`]; hosts feed input to a [`ShellDispatcher`] and execute
//! the side-effect intents it resolves. Rendering, storage, and real input
//! devices live outside this crate.

pub mod actions;
pub mod chord;
pub mod dispatcher;
pub mod geometry;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod shortcuts;
pub mod window_manager;

pub use actions::{Action, ActionRegistry, ShellActionKind};
pub use chord::{canonical_chord, KeyEvent};
pub use dispatcher::{ShellDispatcher, ShellEvent};
pub use model::{
    DesktopId, DragSession, GroupId, InteractionState, LayoutMode, PointerPosition, ShellState,
    SnapZone, TabGroup, TabGroupId, VirtualDesktop, WindowGroup, WindowId, WindowRecord,
    WindowRect, WindowState,
};
pub use persistence::{encode_shortcuts, hydrate_shortcuts, ShortcutSnapshot};
pub use reducer::{reduce_shell, KernelEffect, KernelError, KernelIncident, ShellAction};
pub use shortcuts::{
    BindingScope, FocusContext, ShortcutBinding, ShortcutError, ShortcutTable,
};
