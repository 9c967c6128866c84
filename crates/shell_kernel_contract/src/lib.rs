//! Shared contract types between the desktop shell kernel and managed mini-apps.
//!
//! Apps are external collaborators: they register a descriptor at open time,
//! receive lifecycle notifications for their windows, and may contribute
//! app-scoped actions to the kernel's action registry. Registrations are
//! scoped resources released through [`ActionRegistrationHandle`] when the
//! owning window closes.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{cell::Cell, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier for an app package/module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` conforms to the
    /// `segment.segment...` policy (lowercase dotted segments, two or more).
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!(
                "invalid application id `{raw}`; expected namespaced dotted segments"
            ))
        }
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an id without validation for compile-time trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 120 {
        return false;
    }

    let mut count = 0usize;
    for part in raw.split('.') {
        count += 1;
        if part.is_empty() || part.len() > 32 {
            return false;
        }
        let bytes = part.as_bytes();
        if !bytes[0].is_ascii_lowercase() {
            return false;
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        {
            return false;
        }
        if part.ends_with('-') {
            return false;
        }
    }

    count >= 2
}

/// Opaque handle naming the surface an app paints into.
///
/// The kernel never interprets this value; it is carried from registration to
/// the view layer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderTargetHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Lifecycle events emitted by the kernel for a managed window.
pub enum AppLifecycleEvent {
    /// App view has been mounted into a managed window.
    Mounted,
    /// Window became focused.
    Focused,
    /// Window close sequence started; apps must release app-scoped action
    /// registrations when they observe this event.
    Closing,
}

impl AppLifecycleEvent {
    /// Returns a stable string token for logging/debugging hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Mounted => "mounted",
            Self::Focused => "focused",
            Self::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Registration payload an app supplies when it is opened into the shell.
pub struct AppRegistration {
    /// Canonical app id.
    pub app_id: ApplicationId,
    /// Human-readable window title.
    pub title: String,
    /// Preferred initial geometry as `(x, y, w, h)` when the app has one.
    pub default_geometry: Option<(i32, i32, i32, i32)>,
    /// Whether the window may be resized.
    pub resizable: bool,
    /// Whether the window lives in the always-on-top (PiP) tier.
    pub always_on_top: bool,
    /// Whether only one instance should be active at a time.
    pub single_instance: bool,
    /// Render surface handle forwarded to the view layer.
    pub render_target: RenderTargetHandle,
}

impl AppRegistration {
    /// Creates a registration with shell-default window behavior.
    pub fn new(app_id: ApplicationId, title: impl Into<String>) -> Self {
        Self {
            app_id,
            title: title.into(),
            default_geometry: None,
            resizable: true,
            always_on_top: false,
            single_instance: false,
            render_target: RenderTargetHandle(0),
        }
    }
}

/// Invocation payload passed to app-scoped action handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInvocation {
    /// Canonical action id that resolved to this handler.
    pub action_id: String,
    /// Chord that triggered the action, when keyboard-originated.
    pub chord: Option<String>,
    /// Free-form event payload.
    pub payload: Value,
}

/// Handler capability for one app-scoped action.
pub type AppActionHandler = Rc<dyn Fn(ActionInvocation)>;

/// One app-scoped action registration: a local action name plus its handler.
///
/// The kernel namespaces the action as `app.<app_id>.<name>`.
#[derive(Clone)]
pub struct AppActionRegistration {
    /// Action name local to the registering app.
    pub name: String,
    /// Handler invoked on dispatch.
    pub handler: AppActionHandler,
}

/// Drop-based registration handle for dynamically registered actions.
#[derive(Clone)]
pub struct ActionRegistrationHandle {
    unregister: Rc<dyn Fn()>,
    active: Rc<Cell<bool>>,
}

impl ActionRegistrationHandle {
    /// Creates a new registration handle from an unregister callback.
    pub fn new(unregister: Rc<dyn Fn()>) -> Self {
        Self {
            unregister,
            active: Rc::new(Cell::new(true)),
        }
    }

    /// Creates a no-op registration handle.
    pub fn noop() -> Self {
        Self::new(Rc::new(|| {}))
    }

    /// Unregisters the action(s) if still active.
    pub fn unregister(&self) {
        if self.active.replace(false) {
            (self.unregister)();
        }
    }
}

impl Drop for ActionRegistrationHandle {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn application_id_requires_dotted_namespaces() {
        assert!(ApplicationId::new("system.terminal").is_ok());
        assert!(ApplicationId::new("vendor.notes.scratch").is_ok());
        assert!(ApplicationId::new("terminal").is_err());
        assert!(ApplicationId::new("System.terminal").is_err());
        assert!(ApplicationId::new("system..terminal").is_err());
        assert!(ApplicationId::new("system.terminal-").is_err());
    }

    #[test]
    fn registration_handle_unregisters_once() {
        let count = Rc::new(RefCell::new(0));
        let seen = count.clone();
        let handle = ActionRegistrationHandle::new(Rc::new(move || {
            *seen.borrow_mut() += 1;
        }));

        handle.unregister();
        handle.unregister();
        drop(handle);

        assert_eq!(*count.borrow(), 1);
    }
}
