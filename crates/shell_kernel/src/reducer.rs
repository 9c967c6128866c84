//! Reducer actions, effect intents, and transition logic for the shell kernel.
//!
//! [`reduce_shell`] is the authoritative state transition engine for the
//! window registry, virtual desktops, grouping layer, and drag sessions. It
//! runs to completion for every action; callers (the dispatcher) never
//! observe partial transitions.

use thiserror::Error;

use shell_kernel_contract::{AppLifecycleEvent, AppRegistration};

use crate::geometry::{layout_for, rect_for_zone, zone_for_pointer};
use crate::model::{
    DesktopId, DragSession, GroupId, InteractionState, LayoutMode, PointerPosition, ShellState,
    SnapZone, TabGroup, TabGroupId, VirtualDesktop, WindowFlags, WindowGroup, WindowId,
    WindowRecord, WindowRect, WindowState, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
};
use crate::window_manager::{
    focus_window, normalize_window_stack, restore_window, save_restore_rect, MIN_WINDOW_HEIGHT,
    MIN_WINDOW_WIDTH,
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_shell`] to mutate [`ShellState`].
pub enum ShellAction {
    /// Open a new window for a registered app.
    OpenWindow(AppRegistration),
    /// Close a window and cascade group/tab membership removal.
    CloseWindow { window_id: WindowId },
    /// Focus (and raise) a window.
    FocusWindow { window_id: WindowId },
    /// Taskbar-style toggle: focus, minimize, or restore.
    ToggleWindow { window_id: WindowId },
    /// Minimize a window.
    MinimizeWindow { window_id: WindowId },
    /// Restore a window to its normal state and rectangle.
    RestoreWindow { window_id: WindowId },
    /// Maximize a window to the provided viewport.
    MaximizeWindow {
        window_id: WindowId,
        viewport: WindowRect,
    },
    /// Snap a window into a zone resolved against the viewport.
    SnapWindow {
        window_id: WindowId,
        zone: SnapZone,
        viewport: WindowRect,
    },
    /// Return a snapped window to its pre-snap rectangle.
    UnsnapWindow { window_id: WindowId },
    /// Toggle picture-in-picture (always-on-top tier) for a window.
    TogglePip { window_id: WindowId },
    /// Rotate focus through the active desktop's visible windows.
    CycleFocus,
    /// Activate a virtual desktop; inactive-desktop windows freeze in place.
    SwitchDesktop { desktop_id: DesktopId },
    /// Create a new (inactive) virtual desktop.
    CreateDesktop { name: String, wallpaper_id: String },
    /// Rename a virtual desktop.
    RenameDesktop {
        desktop_id: DesktopId,
        name: String,
    },
    /// Change a desktop's wallpaper reference.
    SetWallpaper {
        desktop_id: DesktopId,
        wallpaper_id: String,
    },
    /// Reassign a window to another desktop.
    MoveWindowToDesktop {
        window_id: WindowId,
        desktop_id: DesktopId,
    },
    /// Create a layout-bound window group from the valid subset of ids.
    CreateWindowGroup {
        name: String,
        window_ids: Vec<WindowId>,
        layout: LayoutMode,
        viewport: WindowRect,
    },
    /// Change a group's layout mode and re-derive member geometry.
    SetGroupLayout {
        group_id: GroupId,
        layout: LayoutMode,
        viewport: WindowRect,
    },
    /// Dissolve a window group, leaving members standalone.
    DissolveWindowGroup { group_id: GroupId },
    /// Create a tab group from the valid subset of ids (two or more).
    CreateTabGroup { window_ids: Vec<WindowId> },
    /// Switch the visible tab of a tab group.
    ActivateTab {
        tab_group_id: TabGroupId,
        window_id: WindowId,
    },
    /// Remove a window from its tab group, dissolving a group left with one.
    DetachTab { window_id: WindowId },
    /// Begin a titlebar drag gesture.
    BeginDrag {
        window_id: WindowId,
        pointer: PointerPosition,
    },
    /// Update the drag pointer and recompute the preview zone.
    UpdateDrag {
        pointer: PointerPosition,
        container: WindowRect,
    },
    /// Drop: commit the candidate zone if any, otherwise cancel.
    EndDrag { container: WindowRect },
    /// Abandon the active drag gesture without touching geometry.
    CancelDrag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Non-fatal conditions reported alongside an otherwise-completed action.
pub enum KernelIncident {
    /// A dispatch target had no registered handler.
    UnknownAction(String),
    /// A group/tab operation referenced a missing window; the id was dropped.
    UnresolvedWindowReference(WindowId),
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_shell`] for the host to execute.
pub enum KernelEffect {
    /// Deliver a lifecycle notification to the window's app collaborator.
    EmitLifecycle {
        window_id: WindowId,
        event: AppLifecycleEvent,
    },
    /// Move input focus into the newly focused window's primary input.
    FocusWindowInput(WindowId),
    /// Surface a non-fatal incident to logging/UI.
    Report(KernelIncident),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Kernel errors for actions whose direct target is missing.
pub enum KernelError {
    #[error("window not found")]
    WindowNotFound,
    #[error("desktop not found")]
    DesktopNotFound,
    #[error("window group not found")]
    GroupNotFound,
    #[error("tab group not found")]
    TabGroupNotFound,
}

/// Applies a [`ShellAction`] to the kernel state and collects side effects.
///
/// # Errors
///
/// Returns a [`KernelError`] when an action's direct target (window, desktop,
/// group) is not present. Degenerate inputs inside an otherwise valid action
/// degrade to no-ops with [`KernelIncident`] reports instead.
pub fn reduce_shell(
    state: &mut ShellState,
    interaction: &mut InteractionState,
    action: ShellAction,
) -> Result<Vec<KernelEffect>, KernelError> {
    let mut effects = Vec::new();
    match action {
        ShellAction::OpenWindow(registration) => {
            if registration.single_instance {
                let existing = state
                    .windows
                    .iter()
                    .find(|w| w.app_id == registration.app_id)
                    .map(|w| w.id);
                if let Some(window_id) = existing {
                    focus_window(state, window_id);
                    effects.push(KernelEffect::EmitLifecycle {
                        window_id,
                        event: AppLifecycleEvent::Focused,
                    });
                    effects.push(KernelEffect::FocusWindowInput(window_id));
                    return Ok(effects);
                }
            }

            let window_id = next_window_id(state);
            let cascade = ((window_id.0 as i32) - 1) % 8 * 20;
            let rect = registration
                .default_geometry
                .map(|(x, y, w, h)| WindowRect { x, y, w, h })
                .unwrap_or(WindowRect {
                    x: 40 + cascade,
                    y: 48 + cascade,
                    w: DEFAULT_WINDOW_WIDTH,
                    h: DEFAULT_WINDOW_HEIGHT,
                })
                .clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
            let record = WindowRecord {
                id: window_id,
                app_id: registration.app_id,
                title: registration.title,
                rect,
                restore_rect: None,
                z_index: 0,
                is_focused: false,
                state: WindowState::Normal,
                desktop_id: state.active_desktop,
                group_id: None,
                tab_group_id: None,
                flags: WindowFlags {
                    resizable: registration.resizable,
                    always_on_top: registration.always_on_top,
                    single_instance: registration.single_instance,
                },
                render_target: registration.render_target,
            };
            state.windows.push(record);
            focus_window(state, window_id);
            effects.push(KernelEffect::EmitLifecycle {
                window_id,
                event: AppLifecycleEvent::Mounted,
            });
            effects.push(KernelEffect::FocusWindowInput(window_id));
        }
        ShellAction::CloseWindow { window_id } => {
            if state.window(window_id).is_none() {
                return Err(KernelError::WindowNotFound);
            }
            effects.push(KernelEffect::EmitLifecycle {
                window_id,
                event: AppLifecycleEvent::Closing,
            });
            remove_from_window_group(state, window_id);
            remove_from_tab_group(state, window_id);
            state.windows.retain(|w| w.id != window_id);
            if let Some(session) = interaction.dragging.as_ref() {
                if session.window_id == window_id {
                    interaction.dragging = None;
                }
            }
        }
        ShellAction::FocusWindow { window_id } => {
            if !focus_window(state, window_id) {
                return Err(KernelError::WindowNotFound);
            }
            activate_owning_tab(state, window_id);
            effects.push(KernelEffect::EmitLifecycle {
                window_id,
                event: AppLifecycleEvent::Focused,
            });
            effects.push(KernelEffect::FocusWindowInput(window_id));
        }
        ShellAction::ToggleWindow { window_id } => {
            let focused = state.focused_window_id() == Some(window_id);
            let window = state.window(window_id).ok_or(KernelError::WindowNotFound)?;
            if window.minimized() {
                return reduce_shell(state, interaction, ShellAction::RestoreWindow { window_id });
            }
            if focused && window.state == WindowState::Normal {
                return reduce_shell(
                    state,
                    interaction,
                    ShellAction::MinimizeWindow { window_id },
                );
            }
            return reduce_shell(state, interaction, ShellAction::FocusWindow { window_id });
        }
        ShellAction::MinimizeWindow { window_id } => {
            let window = find_window_mut(state, window_id)?;
            if window.state == WindowState::Normal {
                window.state = WindowState::Minimized;
                window.is_focused = false;
            }
        }
        ShellAction::RestoreWindow { window_id } => {
            let window = find_window_mut(state, window_id)?;
            restore_window(window);
            focus_window(state, window_id);
            effects.push(KernelEffect::EmitLifecycle {
                window_id,
                event: AppLifecycleEvent::Focused,
            });
        }
        ShellAction::MaximizeWindow {
            window_id,
            viewport,
        } => {
            let window = find_window_mut(state, window_id)?;
            if window.state == WindowState::Normal {
                save_restore_rect(window);
                window.rect = viewport.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
                window.state = WindowState::Maximized;
                focus_window(state, window_id);
            }
        }
        ShellAction::SnapWindow {
            window_id,
            zone,
            viewport,
        } => {
            if state.window(window_id).is_none() {
                return Err(KernelError::WindowNotFound);
            }
            if zone == SnapZone::Maximize {
                return reduce_shell(
                    state,
                    interaction,
                    ShellAction::MaximizeWindow {
                        window_id,
                        viewport,
                    },
                );
            }
            apply_snap(state, window_id, zone, viewport);
        }
        ShellAction::UnsnapWindow { window_id } => {
            let window = find_window_mut(state, window_id)?;
            if matches!(window.state, WindowState::Snapped(_)) {
                restore_window(window);
            }
        }
        ShellAction::TogglePip { window_id } => {
            let window = find_window_mut(state, window_id)?;
            match window.state {
                WindowState::Normal => {
                    save_restore_rect(window);
                    window.state = WindowState::Pip;
                    focus_window(state, window_id);
                }
                WindowState::Pip => {
                    restore_window(window);
                }
                _ => {}
            }
        }
        ShellAction::CycleFocus => {
            let visible: Vec<WindowId> = state
                .visible_windows()
                .iter()
                .filter(|w| !w.minimized())
                .map(|w| w.id)
                .collect();
            if visible.len() > 1 {
                // Bottom of the stack comes next, so repeated cycling rotates.
                let next = visible[0];
                focus_window(state, next);
                effects.push(KernelEffect::EmitLifecycle {
                    window_id: next,
                    event: AppLifecycleEvent::Focused,
                });
                effects.push(KernelEffect::FocusWindowInput(next));
            }
        }
        ShellAction::SwitchDesktop { desktop_id } => {
            if !state.desktops.iter().any(|d| d.id == desktop_id) {
                return Err(KernelError::DesktopNotFound);
            }
            for desktop in &mut state.desktops {
                desktop.is_active = desktop.id == desktop_id;
            }
            state.active_desktop = desktop_id;
        }
        ShellAction::CreateDesktop { name, wallpaper_id } => {
            let id = DesktopId(state.next_desktop_id);
            state.next_desktop_id = state.next_desktop_id.saturating_add(1);
            state.desktops.push(VirtualDesktop {
                id,
                name,
                wallpaper_id,
                is_active: false,
            });
        }
        ShellAction::RenameDesktop { desktop_id, name } => {
            find_desktop_mut(state, desktop_id)?.name = name;
        }
        ShellAction::SetWallpaper {
            desktop_id,
            wallpaper_id,
        } => {
            find_desktop_mut(state, desktop_id)?.wallpaper_id = wallpaper_id;
        }
        ShellAction::MoveWindowToDesktop {
            window_id,
            desktop_id,
        } => {
            if !state.desktops.iter().any(|d| d.id == desktop_id) {
                return Err(KernelError::DesktopNotFound);
            }
            find_window_mut(state, window_id)?.desktop_id = desktop_id;
        }
        ShellAction::CreateWindowGroup {
            name,
            window_ids,
            layout,
            viewport,
        } => {
            let members = resolve_member_ids(state, &window_ids, &mut effects);
            if members.is_empty() {
                return Ok(effects);
            }
            // A window belongs to at most one window group; leave the old
            // one before joining, so its member list holds no stale ids.
            for &member in &members {
                remove_from_window_group(state, member);
            }
            let id = GroupId(state.next_group_id);
            state.next_group_id = state.next_group_id.saturating_add(1);
            state.group_creation_counter = state.group_creation_counter.saturating_add(1);
            for window in &mut state.windows {
                if members.contains(&window.id) {
                    window.group_id = Some(id);
                }
            }
            state.groups.push(WindowGroup {
                id,
                name,
                members,
                layout,
                created_order: state.group_creation_counter,
            });
            apply_group_layout(state, id, viewport);
        }
        ShellAction::SetGroupLayout {
            group_id,
            layout,
            viewport,
        } => {
            let group = state
                .groups
                .iter_mut()
                .find(|g| g.id == group_id)
                .ok_or(KernelError::GroupNotFound)?;
            group.layout = layout;
            apply_group_layout(state, group_id, viewport);
        }
        ShellAction::DissolveWindowGroup { group_id } => {
            if !state.groups.iter().any(|g| g.id == group_id) {
                return Err(KernelError::GroupNotFound);
            }
            for window in &mut state.windows {
                if window.group_id == Some(group_id) {
                    window.group_id = None;
                }
            }
            state.groups.retain(|g| g.id != group_id);
        }
        ShellAction::CreateTabGroup { window_ids } => {
            let members = resolve_member_ids(state, &window_ids, &mut effects);
            // A single-slot stack needs at least two windows to stack.
            if members.len() < 2 {
                return Ok(effects);
            }
            for &member in &members {
                remove_from_tab_group(state, member);
            }
            let id = TabGroupId(state.next_tab_group_id);
            state.next_tab_group_id = state.next_tab_group_id.saturating_add(1);
            let active_tab = members[0];
            for window in &mut state.windows {
                if members.contains(&window.id) {
                    window.tab_group_id = Some(id);
                }
            }
            state.tab_groups.push(TabGroup {
                id,
                members,
                active_tab,
            });
            focus_window(state, active_tab);
        }
        ShellAction::ActivateTab {
            tab_group_id,
            window_id,
        } => {
            let group = state
                .tab_groups
                .iter_mut()
                .find(|t| t.id == tab_group_id)
                .ok_or(KernelError::TabGroupNotFound)?;
            if !group.members.contains(&window_id) {
                effects.push(KernelEffect::Report(
                    KernelIncident::UnresolvedWindowReference(window_id),
                ));
                return Ok(effects);
            }
            group.active_tab = window_id;
            focus_window(state, window_id);
            effects.push(KernelEffect::EmitLifecycle {
                window_id,
                event: AppLifecycleEvent::Focused,
            });
        }
        ShellAction::DetachTab { window_id } => {
            if state.window(window_id).is_none() {
                return Err(KernelError::WindowNotFound);
            }
            remove_from_tab_group(state, window_id);
        }
        ShellAction::BeginDrag { window_id, pointer } => {
            let Some(window) = state.window(window_id) else {
                return Ok(effects);
            };
            // Minimized and maximized windows are excluded from drag/snap.
            if matches!(
                window.state,
                WindowState::Normal | WindowState::Snapped(_) | WindowState::Pip
            ) {
                focus_window(state, window_id);
                interaction.dragging = Some(DragSession {
                    window_id,
                    started_at: pointer,
                    pointer,
                    candidate_zone: None,
                });
            }
        }
        ShellAction::UpdateDrag { pointer, container } => {
            if let Some(session) = interaction.dragging.as_mut() {
                session.pointer = pointer;
                // Preview only; the window itself is untouched until drop.
                session.candidate_zone = container
                    .contains(pointer)
                    .then(|| zone_for_pointer(pointer, container));
            }
        }
        ShellAction::EndDrag { container } => {
            // The session never outlives one gesture, commit or cancel.
            if let Some(session) = interaction.dragging.take() {
                if let Some(zone) = session.candidate_zone {
                    apply_snap(state, session.window_id, zone, container);
                }
            }
        }
        ShellAction::CancelDrag => {
            interaction.dragging = None;
        }
    }

    normalize_window_stack(state);
    Ok(effects)
}

fn next_window_id(state: &mut ShellState) -> WindowId {
    let id = WindowId(state.next_window_id);
    state.next_window_id = state.next_window_id.saturating_add(1);
    id
}

fn find_window_mut(
    state: &mut ShellState,
    window_id: WindowId,
) -> Result<&mut WindowRecord, KernelError> {
    state
        .windows
        .iter_mut()
        .find(|w| w.id == window_id)
        .ok_or(KernelError::WindowNotFound)
}

fn find_desktop_mut(
    state: &mut ShellState,
    desktop_id: DesktopId,
) -> Result<&mut VirtualDesktop, KernelError> {
    state
        .desktops
        .iter_mut()
        .find(|d| d.id == desktop_id)
        .ok_or(KernelError::DesktopNotFound)
}

/// Commits a snap transition: records the restore rectangle when leaving
/// `Normal` and resolves the zone template against the viewport.
fn apply_snap(state: &mut ShellState, window_id: WindowId, zone: SnapZone, viewport: WindowRect) {
    let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) else {
        return;
    };
    if window.minimized() || window.state == WindowState::Maximized {
        return;
    }
    save_restore_rect(window);
    window.rect = rect_for_zone(zone, viewport).clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
    if window.state != WindowState::Pip {
        window.state = WindowState::Snapped(zone);
    }
    focus_window(state, window_id);
}

/// Filters `window_ids` down to ids present in the registry, deduplicated,
/// reporting each dropped id as an [`KernelIncident::UnresolvedWindowReference`].
fn resolve_member_ids(
    state: &ShellState,
    window_ids: &[WindowId],
    effects: &mut Vec<KernelEffect>,
) -> Vec<WindowId> {
    let mut members = Vec::with_capacity(window_ids.len());
    for &id in window_ids {
        if members.contains(&id) {
            continue;
        }
        if state.window(id).is_some() {
            members.push(id);
        } else {
            effects.push(KernelEffect::Report(
                KernelIncident::UnresolvedWindowReference(id),
            ));
        }
    }
    members
}

/// Re-derives every live, non-minimized member's geometry from the group's
/// layout mode and writes the rectangles back through the registry.
fn apply_group_layout(state: &mut ShellState, group_id: GroupId, viewport: WindowRect) {
    let Some(group) = state.groups.iter().find(|g| g.id == group_id) else {
        return;
    };
    let targets: Vec<WindowId> = group
        .members
        .iter()
        .copied()
        .filter(|id| state.window(*id).map(|w| !w.minimized()).unwrap_or(false))
        .collect();
    let layout = group.layout;
    let rects = layout_for(targets.len(), layout, viewport);
    for (id, rect) in targets.into_iter().zip(rects) {
        if let Some(window) = state.windows.iter_mut().find(|w| w.id == id) {
            window.rect = rect.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
            window.state = WindowState::Normal;
            window.restore_rect = None;
        }
    }
}

fn remove_from_window_group(state: &mut ShellState, window_id: WindowId) {
    let Some(group_id) = state.window(window_id).and_then(|w| w.group_id) else {
        return;
    };
    if let Some(group) = state.groups.iter_mut().find(|g| g.id == group_id) {
        group.members.retain(|id| *id != window_id);
        if group.members.is_empty() {
            state.groups.retain(|g| g.id != group_id);
        }
    }
    if let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) {
        window.group_id = None;
    }
}

/// Removes a window from its tab group. A group left with a single member is
/// dissolved and the survivor becomes a standalone window, keeping its last
/// geometry.
fn remove_from_tab_group(state: &mut ShellState, window_id: WindowId) {
    let Some(tab_group_id) = state.window(window_id).and_then(|w| w.tab_group_id) else {
        return;
    };
    let mut dissolved = false;
    if let Some(group) = state.tab_groups.iter_mut().find(|t| t.id == tab_group_id) {
        group.members.retain(|id| *id != window_id);
        match group.members.as_slice() {
            [] | [_] => dissolved = true,
            members => {
                if group.active_tab == window_id {
                    group.active_tab = members[0];
                }
            }
        }
    }
    if dissolved {
        if let Some(group) = state.tab_groups.iter().find(|t| t.id == tab_group_id) {
            let survivors = group.members.clone();
            for window in &mut state.windows {
                if survivors.contains(&window.id) {
                    window.tab_group_id = None;
                }
            }
        }
        state.tab_groups.retain(|t| t.id != tab_group_id);
    }
    if let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) {
        window.tab_group_id = None;
    }
}

/// Focusing a hidden tab makes it the active tab of its group.
fn activate_owning_tab(state: &mut ShellState, window_id: WindowId) {
    let Some(tab_group_id) = state.window(window_id).and_then(|w| w.tab_group_id) else {
        return;
    };
    if let Some(group) = state.tab_groups.iter_mut().find(|t| t.id == tab_group_id) {
        if group.members.contains(&window_id) {
            group.active_tab = window_id;
        }
    }
}
