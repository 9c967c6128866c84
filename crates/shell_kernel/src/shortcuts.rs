//! Shortcut table: persisted chord-to-action bindings with conflict
//! detection.
//!
//! The table enforces one invariant at every entry point: at most one
//! **enabled** binding per chord. Binding onto an occupied chord is a hard
//! stop surfaced to the caller; the conflicting entry must be unbound or
//! disabled explicitly first.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shell_kernel_contract::ApplicationId;

/// Chords that still resolve while a text-editing surface has focus, so the
/// shell does not steal ordinary editing keystrokes.
const TEXT_EDIT_ALLOWLIST: [&str; 7] = [
    "Ctrl+C", "Ctrl+V", "Ctrl+A", "Ctrl+F", "Escape", "Tab", "Enter",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Visibility scope of a binding.
pub enum BindingScope {
    /// Resolves regardless of which app is focused.
    Global,
    /// Resolves only while the named app's window is focused.
    AppScoped(ApplicationId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    /// Canonical chord string (see [`crate::chord`]).
    pub chord: String,
    pub action_id: String,
    pub scope: BindingScope,
    pub enabled: bool,
    /// Whether the binding was user-authored rather than built-in.
    pub is_custom: bool,
}

/// Focus information consulted during chord resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FocusContext {
    /// Whether a text-editing surface currently has focus.
    pub text_editing: bool,
    /// App owning the focused window, when one is focused.
    pub focused_app: Option<ApplicationId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    /// Another enabled binding already owns the chord. Surfaced to the UI
    /// and blocks the save; never auto-resolved.
    #[error("chord `{chord}` is already bound to `{existing_action_id}`")]
    ChordConflict {
        chord: String,
        existing_action_id: String,
    },
}

/// The kernel-owned binding set. Persistence is write-through: every
/// mutation leaves the table authoritative and the host mirrors it out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortcutTable {
    bindings: Vec<ShortcutBinding>,
}

impl ShortcutTable {
    /// Creates a table seeded with the built-in default bindings.
    pub fn with_defaults() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }

    /// Creates a table from previously persisted bindings.
    ///
    /// The uniqueness invariant is re-established defensively: if the
    /// persisted payload carries duplicate enabled chords, later entries are
    /// disabled.
    pub fn from_bindings(bindings: Vec<ShortcutBinding>) -> Self {
        let mut table = Self { bindings };
        let mut seen: Vec<String> = Vec::new();
        for binding in &mut table.bindings {
            if !binding.enabled {
                continue;
            }
            if seen.contains(&binding.chord) {
                binding.enabled = false;
            } else {
                seen.push(binding.chord.clone());
            }
        }
        table
    }

    pub fn bindings(&self) -> &[ShortcutBinding] {
        &self.bindings
    }

    /// Binds `chord` to `action_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcutError::ChordConflict`] when another enabled binding
    /// owns the chord; callers must `unbind` it explicitly first.
    pub fn bind(
        &mut self,
        chord: impl Into<String>,
        action_id: impl Into<String>,
        scope: BindingScope,
    ) -> Result<(), ShortcutError> {
        let chord = chord.into();
        if let Some(existing) = self.enabled_binding(&chord) {
            return Err(ShortcutError::ChordConflict {
                chord,
                existing_action_id: existing.action_id.clone(),
            });
        }
        // Replace any disabled remnant for the same chord.
        self.bindings.retain(|b| b.chord != chord);
        self.bindings.push(ShortcutBinding {
            chord,
            action_id: action_id.into(),
            scope,
            enabled: true,
            is_custom: true,
        });
        Ok(())
    }

    /// Removes any binding for `chord`. Idempotent; absent chords are fine.
    pub fn unbind(&mut self, chord: &str) {
        self.bindings.retain(|b| b.chord != chord);
    }

    /// Enables or disables an existing binding.
    ///
    /// # Errors
    ///
    /// Enabling fails with [`ShortcutError::ChordConflict`] when another
    /// enabled binding holds the same chord.
    pub fn set_enabled(&mut self, chord: &str, enabled: bool) -> Result<(), ShortcutError> {
        let Some(target) = self.bindings.iter().position(|b| b.chord == chord) else {
            return Ok(());
        };
        if enabled {
            // Re-enabling the entry that already owns the chord is a no-op,
            // not a conflict with itself.
            if let Some((index, existing)) = self
                .bindings
                .iter()
                .enumerate()
                .find(|(_, b)| b.enabled && b.chord == chord)
            {
                if index != target {
                    return Err(ShortcutError::ChordConflict {
                        chord: chord.to_string(),
                        existing_action_id: existing.action_id.clone(),
                    });
                }
            }
        }
        self.bindings[target].enabled = enabled;
        Ok(())
    }

    /// Resolves a chord to an action id under the given focus context.
    ///
    /// While a text-editing surface has focus, only a small allow-list of
    /// editing chords resolves; everything else is suppressed.
    pub fn resolve(&self, chord: &str, context: &FocusContext) -> Option<&str> {
        if context.text_editing && !TEXT_EDIT_ALLOWLIST.contains(&chord) {
            return None;
        }
        self.bindings
            .iter()
            .filter(|b| b.enabled && b.chord == chord)
            .find(|b| match &b.scope {
                BindingScope::Global => true,
                BindingScope::AppScoped(app_id) => context.focused_app.as_ref() == Some(app_id),
            })
            .map(|b| b.action_id.as_str())
    }

    /// Replaces bindings for `scope` (or all, when `None`) with the built-in
    /// default table, discarding custom bindings in that scope.
    pub fn reset_to_defaults(&mut self, scope: Option<&BindingScope>) {
        match scope {
            None => self.bindings = default_bindings(),
            Some(scope) => {
                self.bindings.retain(|b| &b.scope != scope);
                for default in default_bindings() {
                    if &default.scope == scope && self.enabled_binding(&default.chord).is_none() {
                        self.bindings.push(default);
                    }
                }
            }
        }
    }

    fn enabled_binding(&self, chord: &str) -> Option<&ShortcutBinding> {
        self.bindings.iter().find(|b| b.enabled && b.chord == chord)
    }
}

/// Built-in shell bindings, all global scope.
fn default_bindings() -> Vec<ShortcutBinding> {
    const DEFAULTS: [(&str, &str); 11] = [
        ("Ctrl+Alt+Left", "shell.window.snap-left"),
        ("Ctrl+Alt+Right", "shell.window.snap-right"),
        ("Ctrl+Alt+Up", "shell.window.maximize"),
        ("Ctrl+Alt+Down", "shell.window.restore"),
        ("Ctrl+Alt+M", "shell.window.minimize"),
        ("Ctrl+Alt+Q", "shell.window.close"),
        ("Ctrl+Alt+P", "shell.window.pip"),
        ("Alt+Tab", "shell.focus.cycle"),
        ("Ctrl+Alt+1", "shell.desktop.switch.1"),
        ("Ctrl+Alt+2", "shell.desktop.switch.2"),
        ("Ctrl+Alt+3", "shell.desktop.switch.3"),
    ];
    DEFAULTS
        .iter()
        .map(|(chord, action_id)| ShortcutBinding {
            chord: (*chord).to_string(),
            action_id: (*action_id).to_string(),
            scope: BindingScope::Global,
            enabled: true,
            is_custom: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn free_focus() -> FocusContext {
        FocusContext::default()
    }

    #[test]
    fn bind_rejects_enabled_chord_collisions() {
        let mut table = ShortcutTable::with_defaults();

        let err = table
            .bind("Alt+Tab", "shell.window.close", BindingScope::Global)
            .unwrap_err();

        assert_eq!(
            err,
            ShortcutError::ChordConflict {
                chord: "Alt+Tab".to_string(),
                existing_action_id: "shell.focus.cycle".to_string(),
            }
        );
        // The existing binding is untouched.
        assert_eq!(
            table.resolve("Alt+Tab", &free_focus()),
            Some("shell.focus.cycle")
        );
    }

    #[test]
    fn explicit_unbind_then_bind_succeeds() {
        let mut table = ShortcutTable::with_defaults();

        table.unbind("Alt+Tab");
        table.unbind("Alt+Tab");
        table
            .bind("Alt+Tab", "shell.window.close", BindingScope::Global)
            .unwrap();

        assert_eq!(
            table.resolve("Alt+Tab", &free_focus()),
            Some("shell.window.close")
        );
    }

    #[test]
    fn at_most_one_enabled_binding_per_chord() {
        let mut table = ShortcutTable::with_defaults();
        let _ = table.bind("Ctrl+Shift+K", "shell.focus.cycle", BindingScope::Global);
        let _ = table.bind("Ctrl+Shift+K", "shell.window.close", BindingScope::Global);
        table.unbind("Ctrl+Shift+K");
        let _ = table.bind("Ctrl+Shift+K", "shell.window.pip", BindingScope::Global);

        for binding in table.bindings() {
            let enabled = table
                .bindings()
                .iter()
                .filter(|b| b.enabled && b.chord == binding.chord)
                .count();
            assert!(enabled <= 1, "chord {} has {enabled} enabled", binding.chord);
        }
    }

    #[test]
    fn reenabling_an_enabled_binding_is_a_no_op() {
        let mut table = ShortcutTable::with_defaults();

        table.set_enabled("Alt+Tab", true).unwrap();
        assert_eq!(
            table.resolve("Alt+Tab", &free_focus()),
            Some("shell.focus.cycle")
        );

        table.set_enabled("Alt+Tab", false).unwrap();
        assert_eq!(table.resolve("Alt+Tab", &free_focus()), None);
        table.set_enabled("Alt+Tab", true).unwrap();
        assert_eq!(
            table.resolve("Alt+Tab", &free_focus()),
            Some("shell.focus.cycle")
        );
    }

    #[test]
    fn enabling_still_conflicts_with_a_different_enabled_entry() {
        let make = |action: &str, enabled: bool| ShortcutBinding {
            chord: "Ctrl+Alt+X".to_string(),
            action_id: action.to_string(),
            scope: BindingScope::Global,
            enabled,
            is_custom: true,
        };
        let mut table = ShortcutTable::from_bindings(vec![
            make("first", false),
            make("second", true),
        ]);

        let err = table.set_enabled("Ctrl+Alt+X", true).unwrap_err();

        assert_eq!(
            err,
            ShortcutError::ChordConflict {
                chord: "Ctrl+Alt+X".to_string(),
                existing_action_id: "second".to_string(),
            }
        );
    }

    #[test]
    fn text_editing_focus_suppresses_non_allowlisted_chords() {
        let mut table = ShortcutTable::with_defaults();
        table
            .bind("Ctrl+F", "shell.focus.cycle", BindingScope::Global)
            .unwrap();
        let editing = FocusContext {
            text_editing: true,
            focused_app: None,
        };

        assert_eq!(table.resolve("Alt+Tab", &editing), None);
        assert_eq!(table.resolve("Ctrl+Alt+Left", &editing), None);
        assert_eq!(table.resolve("Ctrl+F", &editing), Some("shell.focus.cycle"));
    }

    #[test]
    fn app_scoped_bindings_resolve_only_for_the_focused_app() {
        let mut table = ShortcutTable::default();
        let app = ApplicationId::trusted("system.notes");
        table
            .bind(
                "Ctrl+Shift+S",
                "app.system.notes.save-all",
                BindingScope::AppScoped(app.clone()),
            )
            .unwrap();

        let unfocused = free_focus();
        let focused = FocusContext {
            text_editing: false,
            focused_app: Some(app),
        };

        assert_eq!(table.resolve("Ctrl+Shift+S", &unfocused), None);
        assert_eq!(
            table.resolve("Ctrl+Shift+S", &focused),
            Some("app.system.notes.save-all")
        );
    }

    #[test]
    fn reset_to_defaults_discards_custom_bindings_in_scope() {
        let mut table = ShortcutTable::with_defaults();
        let app = ApplicationId::trusted("system.notes");
        table.unbind("Alt+Tab");
        table
            .bind("Alt+Tab", "shell.window.close", BindingScope::Global)
            .unwrap();
        table
            .bind(
                "Ctrl+Shift+S",
                "app.system.notes.save-all",
                BindingScope::AppScoped(app.clone()),
            )
            .unwrap();

        table.reset_to_defaults(Some(&BindingScope::Global));

        assert_eq!(
            table.resolve("Alt+Tab", &free_focus()),
            Some("shell.focus.cycle")
        );
        let focused = FocusContext {
            text_editing: false,
            focused_app: Some(app),
        };
        assert_eq!(
            table.resolve("Ctrl+Shift+S", &focused),
            Some("app.system.notes.save-all")
        );

        table.reset_to_defaults(None);
        assert_eq!(table.resolve("Ctrl+Shift+S", &focused), None);
    }

    #[test]
    fn hydration_disables_duplicate_enabled_chords() {
        let make = |action: &str| ShortcutBinding {
            chord: "Ctrl+Alt+X".to_string(),
            action_id: action.to_string(),
            scope: BindingScope::Global,
            enabled: true,
            is_custom: true,
        };
        let table = ShortcutTable::from_bindings(vec![make("first"), make("second")]);

        assert_eq!(table.resolve("Ctrl+Alt+X", &free_focus()), Some("first"));
        assert_eq!(
            table
                .bindings()
                .iter()
                .filter(|b| b.enabled && b.chord == "Ctrl+Alt+X")
                .count(),
            1
        );
    }
}
