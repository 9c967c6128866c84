//! Action identifiers and the app-scoped action registry.
//!
//! Shell-owned actions are a closed enum parsed from canonical
//! `shell.*` id strings, so dispatch over them is exhaustive at compile
//! time. App-contributed actions stay dynamic (`app.<app_id>.<name>`) and
//! live in [`ActionRegistry`]; anything else folds to [`Action::Unknown`]
//! and is reported, never raised.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use shell_kernel_contract::{
    ActionInvocation, ActionRegistrationHandle, AppActionRegistration, ApplicationId,
};

/// Built-in shell operations addressable from the shortcut table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellActionKind {
    CloseFocused,
    MinimizeFocused,
    MaximizeFocused,
    RestoreFocused,
    SnapFocusedLeft,
    SnapFocusedRight,
    PipFocused,
    CycleFocus,
    /// One-based desktop slot, `shell.desktop.switch.<n>`.
    SwitchDesktop(u8),
}

impl ShellActionKind {
    /// Canonical action id string.
    pub fn as_action_id(self) -> String {
        match self {
            Self::CloseFocused => "shell.window.close".to_string(),
            Self::MinimizeFocused => "shell.window.minimize".to_string(),
            Self::MaximizeFocused => "shell.window.maximize".to_string(),
            Self::RestoreFocused => "shell.window.restore".to_string(),
            Self::SnapFocusedLeft => "shell.window.snap-left".to_string(),
            Self::SnapFocusedRight => "shell.window.snap-right".to_string(),
            Self::PipFocused => "shell.window.pip".to_string(),
            Self::CycleFocus => "shell.focus.cycle".to_string(),
            Self::SwitchDesktop(n) => format!("shell.desktop.switch.{n}"),
        }
    }
}

/// A parsed action identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A built-in shell operation.
    Shell(ShellActionKind),
    /// An app-contributed action resolved through the registry.
    App {
        app_id: ApplicationId,
        name: String,
    },
    /// Unrecognized id; dispatch reports it and moves on.
    Unknown(String),
}

impl Action {
    /// Parses a canonical action id string.
    pub fn parse(raw: &str) -> Self {
        let shell = match raw {
            "shell.window.close" => Some(ShellActionKind::CloseFocused),
            "shell.window.minimize" => Some(ShellActionKind::MinimizeFocused),
            "shell.window.maximize" => Some(ShellActionKind::MaximizeFocused),
            "shell.window.restore" => Some(ShellActionKind::RestoreFocused),
            "shell.window.snap-left" => Some(ShellActionKind::SnapFocusedLeft),
            "shell.window.snap-right" => Some(ShellActionKind::SnapFocusedRight),
            "shell.window.pip" => Some(ShellActionKind::PipFocused),
            "shell.focus.cycle" => Some(ShellActionKind::CycleFocus),
            _ => None,
        };
        if let Some(kind) = shell {
            return Self::Shell(kind);
        }

        if let Some(rest) = raw.strip_prefix("shell.desktop.switch.") {
            if let Ok(n) = rest.parse::<u8>() {
                if (1..=9).contains(&n) {
                    return Self::Shell(ShellActionKind::SwitchDesktop(n));
                }
            }
            return Self::Unknown(raw.to_string());
        }

        if let Some(rest) = raw.strip_prefix("app.") {
            if let Some((app_raw, name)) = rest.rsplit_once('.') {
                if let Ok(app_id) = ApplicationId::new(app_raw) {
                    if !name.is_empty() {
                        return Self::App {
                            app_id,
                            name: name.to_string(),
                        };
                    }
                }
            }
        }

        Self::Unknown(raw.to_string())
    }
}

type HandlerMap = Rc<RefCell<HashMap<String, shell_kernel_contract::AppActionHandler>>>;

/// Registry of app-contributed action handlers.
///
/// Registrations are scoped resources: the returned handle (or
/// [`ActionRegistry::release_app`] on window close) removes the handler, so
/// stale handlers cannot outlive their app.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HandlerMap,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full action id for an app-scoped registration.
    pub fn action_id(app_id: &ApplicationId, name: &str) -> String {
        format!("app.{app_id}.{name}")
    }

    /// Registers one app-scoped action and returns its owning handle.
    pub fn register(
        &self,
        app_id: &ApplicationId,
        registration: AppActionRegistration,
    ) -> ActionRegistrationHandle {
        let action_id = Self::action_id(app_id, &registration.name);
        self.handlers
            .borrow_mut()
            .insert(action_id.clone(), registration.handler);
        let handlers = self.handlers.clone();
        ActionRegistrationHandle::new(Rc::new(move || {
            handlers.borrow_mut().remove(&action_id);
        }))
    }

    /// Removes every handler owned by `app_id`.
    pub fn release_app(&self, app_id: &ApplicationId) {
        let prefix = format!("app.{app_id}.");
        self.handlers
            .borrow_mut()
            .retain(|key, _| !key.starts_with(&prefix));
    }

    /// Invokes the handler for an app action id.
    ///
    /// Returns `false` when no handler is registered; never panics, since
    /// this runs inside the global input path.
    pub fn execute(&self, action_id: &str, invocation: ActionInvocation) -> bool {
        let handler = self.handlers.borrow().get(action_id).cloned();
        match handler {
            Some(handler) => {
                handler(invocation);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;

    #[test]
    fn shell_action_ids_round_trip() {
        let kinds = [
            ShellActionKind::CloseFocused,
            ShellActionKind::MinimizeFocused,
            ShellActionKind::MaximizeFocused,
            ShellActionKind::RestoreFocused,
            ShellActionKind::SnapFocusedLeft,
            ShellActionKind::SnapFocusedRight,
            ShellActionKind::PipFocused,
            ShellActionKind::CycleFocus,
            ShellActionKind::SwitchDesktop(3),
        ];
        for kind in kinds {
            assert_eq!(Action::parse(&kind.as_action_id()), Action::Shell(kind));
        }
    }

    #[test]
    fn app_actions_parse_into_id_and_name() {
        assert_eq!(
            Action::parse("app.system.notes.save-all"),
            Action::App {
                app_id: ApplicationId::trusted("system.notes"),
                name: "save-all".to_string(),
            }
        );
    }

    #[test]
    fn malformed_ids_fold_to_unknown() {
        for raw in [
            "shell.window.explode",
            "shell.desktop.switch.0",
            "shell.desktop.switch.ten",
            "app.notnamespaced.x",
            "",
        ] {
            assert_eq!(Action::parse(raw), Action::Unknown(raw.to_string()));
        }
    }

    #[test]
    fn registration_handle_and_release_remove_handlers() {
        let registry = ActionRegistry::new();
        let app_id = ApplicationId::trusted("system.notes");
        let calls = Rc::new(Cell::new(0u32));
        let seen = calls.clone();
        let handle = registry.register(
            &app_id,
            AppActionRegistration {
                name: "save-all".to_string(),
                handler: Rc::new(move |_| seen.set(seen.get() + 1)),
            },
        );

        let invocation = ActionInvocation {
            action_id: "app.system.notes.save-all".to_string(),
            chord: None,
            payload: Value::Null,
        };
        assert!(registry.execute("app.system.notes.save-all", invocation.clone()));
        assert_eq!(calls.get(), 1);

        handle.unregister();
        assert!(!registry.execute("app.system.notes.save-all", invocation.clone()));

        let _handle = registry.register(
            &app_id,
            AppActionRegistration {
                name: "save-all".to_string(),
                handler: Rc::new(|_| {}),
            },
        );
        registry.release_app(&app_id);
        assert!(!registry.execute("app.system.notes.save-all", invocation));
    }
}
