//! Serialization of the shortcut table for host-side storage.
//!
//! Only shortcut configuration is persisted; window layout is session-local
//! and rebuilt from scratch on startup. Snapshots carry a schema version so
//! older payloads can be migrated forward, and unreadable payloads fall back
//! to the built-in defaults instead of failing startup.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::SHORTCUT_SCHEMA_VERSION;
use crate::shortcuts::{ShortcutBinding, ShortcutTable};

/// Versioned persistence payload for the shortcut table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutSnapshot {
    pub schema_version: u32,
    pub bindings: Vec<ShortcutBinding>,
}

/// Captures the current table as a persistable snapshot.
pub fn snapshot_shortcuts(table: &ShortcutTable) -> ShortcutSnapshot {
    ShortcutSnapshot {
        schema_version: SHORTCUT_SCHEMA_VERSION,
        bindings: table.bindings().to_vec(),
    }
}

/// Encodes the current table for the host's storage layer.
pub fn encode_shortcuts(table: &ShortcutTable) -> serde_json::Result<String> {
    serde_json::to_string(&snapshot_shortcuts(table))
}

/// Rebuilds a shortcut table from a persisted payload.
///
/// Any payload that cannot be read or migrated yields the default table; a
/// broken storage blob must never keep the shell from starting.
pub fn hydrate_shortcuts(raw: &str) -> ShortcutTable {
    match serde_json::from_str::<ShortcutSnapshot>(raw) {
        Ok(snapshot) => match migrate_snapshot(snapshot) {
            Some(bindings) => ShortcutTable::from_bindings(bindings),
            None => {
                warn!("discarding shortcut snapshot with unsupported schema");
                ShortcutTable::with_defaults()
            }
        },
        Err(err) => {
            warn!("discarding unreadable shortcut snapshot: {err}");
            ShortcutTable::with_defaults()
        }
    }
}

/// Migrates a snapshot to the current schema, or `None` when it is newer
/// than this build understands.
fn migrate_snapshot(snapshot: ShortcutSnapshot) -> Option<Vec<ShortcutBinding>> {
    match snapshot.schema_version {
        // Pre-versioned payloads wrote `0` and carried the same binding shape.
        0 | SHORTCUT_SCHEMA_VERSION => Some(snapshot.bindings),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::shortcuts::{BindingScope, FocusContext};

    #[test]
    fn custom_bindings_survive_a_round_trip() {
        let mut table = ShortcutTable::with_defaults();
        table
            .bind("Ctrl+Shift+K", "shell.window.pip", BindingScope::Global)
            .unwrap();

        let encoded = encode_shortcuts(&table).unwrap();
        let hydrated = hydrate_shortcuts(&encoded);

        assert_eq!(hydrated, table);
        assert_eq!(
            hydrated.resolve("Ctrl+Shift+K", &FocusContext::default()),
            Some("shell.window.pip")
        );
    }

    #[test]
    fn unreadable_payloads_fall_back_to_defaults() {
        for raw in ["", "not json", r#"{"bindings": 7}"#] {
            assert_eq!(hydrate_shortcuts(raw), ShortcutTable::with_defaults());
        }
    }

    #[test]
    fn newer_schema_versions_fall_back_to_defaults() {
        let snapshot = ShortcutSnapshot {
            schema_version: SHORTCUT_SCHEMA_VERSION + 1,
            bindings: Vec::new(),
        };
        let raw = serde_json::to_string(&snapshot).unwrap();

        assert_eq!(hydrate_shortcuts(&raw), ShortcutTable::with_defaults());
    }

    #[test]
    fn legacy_unversioned_payloads_are_migrated() {
        let snapshot = ShortcutSnapshot {
            schema_version: 0,
            bindings: snapshot_shortcuts(&ShortcutTable::with_defaults()).bindings,
        };
        let raw = serde_json::to_string(&snapshot).unwrap();

        assert_eq!(hydrate_shortcuts(&raw), ShortcutTable::with_defaults());
    }
}
