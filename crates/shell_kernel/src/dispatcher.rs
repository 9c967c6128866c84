//! Serialized shell event dispatcher.
//!
//! [`ShellDispatcher`] is the single entry point for host input: keyboard
//! events, direct action invocations, and raw shell actions all funnel
//! through one queue and are processed to completion, one at a time. Events
//! dispatched from inside a handler are deferred to the back of the queue, so
//! no handler ever observes a half-applied transition. Failures in the
//! global input path are logged and dropped, never raised.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use log::{debug, warn};
use serde_json::Value;

use shell_kernel_contract::{
    ActionInvocation, ActionRegistrationHandle, AppActionRegistration, AppLifecycleEvent,
    ApplicationId,
};

use crate::actions::{Action, ActionRegistry, ShellActionKind};
use crate::chord::{canonical_chord, KeyEvent};
use crate::model::{InteractionState, ShellState, SnapZone, WindowId, WindowRect};
use crate::persistence::encode_shortcuts;
use crate::reducer::{reduce_shell, KernelEffect, KernelIncident, ShellAction};
use crate::shortcuts::{BindingScope, FocusContext, ShortcutError, ShortcutTable};

/// Lifecycle observer an app attaches to its window.
pub type LifecycleObserver = Rc<dyn Fn(AppLifecycleEvent)>;

/// Host hook receiving the encoded shortcut snapshot after every mutation.
pub type PersistHook = Rc<dyn Fn(&str)>;

/// Host hook moving DOM/input focus into a window's primary input.
pub type FocusInputHook = Rc<dyn Fn(WindowId)>;

/// Events accepted by [`ShellDispatcher::dispatch`].
#[derive(Debug, Clone)]
pub enum ShellEvent {
    /// A raw keyboard event from the host input layer.
    Key {
        event: KeyEvent,
        /// Whether a text-editing surface currently has focus.
        text_editing: bool,
    },
    /// Direct invocation of an action by id (menus, command palette).
    Invoke { action_id: String, payload: Value },
    /// A shell action applied without going through the action table.
    Apply(ShellAction),
}

/// Owner of all kernel state and the serialized dispatch loop around it.
pub struct ShellDispatcher {
    state: RefCell<ShellState>,
    interaction: RefCell<InteractionState>,
    shortcuts: RefCell<ShortcutTable>,
    actions: ActionRegistry,
    /// Action handles owned per window; dropped when the window closes.
    window_actions: RefCell<HashMap<WindowId, Vec<ActionRegistrationHandle>>>,
    observers: RefCell<HashMap<WindowId, LifecycleObserver>>,
    viewport: Cell<WindowRect>,
    queue: RefCell<VecDeque<ShellEvent>>,
    dispatching: Cell<bool>,
    persist: RefCell<Option<PersistHook>>,
    focus_input: RefCell<Option<FocusInputHook>>,
}

impl Default for ShellDispatcher {
    fn default() -> Self {
        Self::from_shortcuts(ShortcutTable::with_defaults())
    }
}

impl ShellDispatcher {
    /// Creates a dispatcher with the built-in default shortcut table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher around a hydrated shortcut table.
    pub fn from_shortcuts(shortcuts: ShortcutTable) -> Self {
        Self {
            state: RefCell::new(ShellState::default()),
            interaction: RefCell::new(InteractionState::default()),
            shortcuts: RefCell::new(shortcuts),
            actions: ActionRegistry::new(),
            window_actions: RefCell::new(HashMap::new()),
            observers: RefCell::new(HashMap::new()),
            viewport: Cell::new(WindowRect {
                x: 0,
                y: 0,
                w: 1280,
                h: 800,
            }),
            queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            persist: RefCell::new(None),
            focus_input: RefCell::new(None),
        }
    }

    /// Installs the write-through persistence hook for shortcut mutations.
    pub fn set_persist_hook(&self, hook: PersistHook) {
        *self.persist.borrow_mut() = Some(hook);
    }

    /// Installs the hook that moves host input focus into a window.
    pub fn set_focus_input_hook(&self, hook: FocusInputHook) {
        *self.focus_input.borrow_mut() = Some(hook);
    }

    /// Updates the viewport used to resolve maximize/snap templates for
    /// keyboard-driven actions.
    pub fn set_viewport(&self, viewport: WindowRect) {
        self.viewport.set(viewport);
    }

    /// Enqueues and processes an event.
    ///
    /// When called re-entrantly (from an action handler or lifecycle
    /// observer), the event is queued and handled after the current one
    /// finishes.
    pub fn dispatch(&self, event: ShellEvent) {
        self.queue.borrow_mut().push_back(event);
        if self.dispatching.replace(true) {
            return;
        }
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            self.process(event);
        }
        self.dispatching.set(false);
    }

    /// Read access to the authoritative shell state.
    pub fn with_state<R>(&self, f: impl FnOnce(&ShellState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Read access to the interaction (drag) state.
    pub fn with_interaction<R>(&self, f: impl FnOnce(&InteractionState) -> R) -> R {
        f(&self.interaction.borrow())
    }

    /// Read access to the shortcut table.
    pub fn with_shortcuts<R>(&self, f: impl FnOnce(&ShortcutTable) -> R) -> R {
        f(&self.shortcuts.borrow())
    }

    /// Registers app-scoped actions owned by `window_id`; the registrations
    /// are released automatically when that window closes.
    pub fn register_window_actions(
        &self,
        window_id: WindowId,
        app_id: &ApplicationId,
        registrations: Vec<AppActionRegistration>,
    ) {
        let handles: Vec<ActionRegistrationHandle> = registrations
            .into_iter()
            .map(|registration| self.actions.register(app_id, registration))
            .collect();
        self.window_actions
            .borrow_mut()
            .entry(window_id)
            .or_default()
            .extend(handles);
    }

    /// Attaches a lifecycle observer to a window. One observer per window;
    /// a later call replaces the earlier one.
    pub fn observe_lifecycle(&self, window_id: WindowId, observer: LifecycleObserver) {
        self.observers.borrow_mut().insert(window_id, observer);
    }

    /// Binds a chord, persisting the table on success.
    ///
    /// # Errors
    ///
    /// Propagates [`ShortcutError::ChordConflict`] unchanged so the caller
    /// can surface it; the table and storage are left untouched.
    pub fn bind_shortcut(
        &self,
        chord: impl Into<String>,
        action_id: impl Into<String>,
        scope: BindingScope,
    ) -> Result<(), ShortcutError> {
        self.shortcuts.borrow_mut().bind(chord, action_id, scope)?;
        self.persist_shortcuts();
        Ok(())
    }

    /// Unbinds a chord, persisting the table.
    pub fn unbind_shortcut(&self, chord: &str) {
        self.shortcuts.borrow_mut().unbind(chord);
        self.persist_shortcuts();
    }

    /// Enables or disables a binding, persisting the table on success.
    ///
    /// # Errors
    ///
    /// Propagates [`ShortcutError::ChordConflict`] when enabling collides
    /// with another enabled binding.
    pub fn set_shortcut_enabled(&self, chord: &str, enabled: bool) -> Result<(), ShortcutError> {
        self.shortcuts.borrow_mut().set_enabled(chord, enabled)?;
        self.persist_shortcuts();
        Ok(())
    }

    /// Resets bindings to defaults (per scope, or fully), persisting the
    /// table.
    pub fn reset_shortcuts(&self, scope: Option<&BindingScope>) {
        self.shortcuts.borrow_mut().reset_to_defaults(scope);
        self.persist_shortcuts();
    }

    fn persist_shortcuts(&self) {
        let Some(hook) = self.persist.borrow().clone() else {
            return;
        };
        // Encode before invoking the hook so the table is not borrowed while
        // host code runs; the hook may mutate shortcuts re-entrantly.
        let encoded = encode_shortcuts(&self.shortcuts.borrow());
        match encoded {
            Ok(raw) => hook(&raw),
            Err(err) => warn!("failed to encode shortcut snapshot: {err}"),
        }
    }

    fn process(&self, event: ShellEvent) {
        match event {
            ShellEvent::Key {
                event,
                text_editing,
            } => {
                let Some(chord) = canonical_chord(&event) else {
                    return;
                };
                let focus = FocusContext {
                    text_editing,
                    focused_app: self.focused_app(),
                };
                let action_id = self
                    .shortcuts
                    .borrow()
                    .resolve(&chord, &focus)
                    .map(str::to_string);
                let Some(action_id) = action_id else {
                    return;
                };
                self.run_action(&action_id, Some(chord), Value::Null);
            }
            ShellEvent::Invoke { action_id, payload } => {
                self.run_action(&action_id, None, payload);
            }
            ShellEvent::Apply(action) => self.apply(action),
        }
    }

    fn focused_app(&self) -> Option<ApplicationId> {
        let state = self.state.borrow();
        state
            .focused_window_id()
            .and_then(|id| state.window(id))
            .map(|w| w.app_id.clone())
    }

    fn run_action(&self, action_id: &str, chord: Option<String>, payload: Value) {
        match Action::parse(action_id) {
            Action::Shell(kind) => {
                let Some(action) = self.shell_action_for(kind) else {
                    debug!("action `{action_id}` has no applicable target");
                    return;
                };
                self.apply(action);
            }
            Action::App { .. } => {
                let invocation = ActionInvocation {
                    action_id: action_id.to_string(),
                    chord,
                    payload,
                };
                if !self.actions.execute(action_id, invocation) {
                    self.report(KernelIncident::UnknownAction(action_id.to_string()));
                }
            }
            Action::Unknown(raw) => {
                self.report(KernelIncident::UnknownAction(raw));
            }
        }
    }

    /// Resolves a built-in action kind against the current focus and
    /// viewport. `None` when the action needs a target that does not exist.
    fn shell_action_for(&self, kind: ShellActionKind) -> Option<ShellAction> {
        let viewport = self.viewport.get();
        let focused = self.state.borrow().focused_window_id();
        Some(match kind {
            ShellActionKind::CloseFocused => ShellAction::CloseWindow {
                window_id: focused?,
            },
            ShellActionKind::MinimizeFocused => ShellAction::MinimizeWindow {
                window_id: focused?,
            },
            ShellActionKind::MaximizeFocused => ShellAction::MaximizeWindow {
                window_id: focused?,
                viewport,
            },
            ShellActionKind::RestoreFocused => ShellAction::RestoreWindow {
                window_id: focused?,
            },
            ShellActionKind::SnapFocusedLeft => ShellAction::SnapWindow {
                window_id: focused?,
                zone: SnapZone::Left,
                viewport,
            },
            ShellActionKind::SnapFocusedRight => ShellAction::SnapWindow {
                window_id: focused?,
                zone: SnapZone::Right,
                viewport,
            },
            ShellActionKind::PipFocused => ShellAction::TogglePip {
                window_id: focused?,
            },
            ShellActionKind::CycleFocus => ShellAction::CycleFocus,
            ShellActionKind::SwitchDesktop(n) => {
                let state = self.state.borrow();
                let desktop = state.desktops.get(usize::from(n) - 1)?;
                ShellAction::SwitchDesktop {
                    desktop_id: desktop.id,
                }
            }
        })
    }

    fn apply(&self, action: ShellAction) {
        let result = {
            let mut state = self.state.borrow_mut();
            let mut interaction = self.interaction.borrow_mut();
            reduce_shell(&mut state, &mut interaction, action)
        };
        match result {
            Ok(effects) => {
                for effect in effects {
                    self.run_effect(effect);
                }
            }
            Err(err) => warn!("shell action rejected: {err}"),
        }
    }

    fn run_effect(&self, effect: KernelEffect) {
        match effect {
            KernelEffect::EmitLifecycle { window_id, event } => {
                let observer = self.observers.borrow().get(&window_id).cloned();
                if let Some(observer) = observer {
                    observer(event);
                }
                if event == AppLifecycleEvent::Closing {
                    // Dropping the handles unregisters the window's actions.
                    self.window_actions.borrow_mut().remove(&window_id);
                    self.observers.borrow_mut().remove(&window_id);
                }
            }
            KernelEffect::FocusWindowInput(window_id) => {
                let hook = self.focus_input.borrow().clone();
                if let Some(hook) = hook {
                    hook(window_id);
                }
            }
            KernelEffect::Report(incident) => self.report(incident),
        }
    }

    fn report(&self, incident: KernelIncident) {
        match incident {
            KernelIncident::UnknownAction(id) => {
                warn!("no handler registered for action `{id}`");
            }
            KernelIncident::UnresolvedWindowReference(id) => {
                warn!("dropped reference to unknown window {}", id.0);
            }
        }
    }
}
