//! Chord codec: canonical string form of a modifier+key combination.
//!
//! Canonicalization is pure and deterministic. Modifiers always serialize in
//! the fixed order `Ctrl+Shift+Alt+Meta`, and platform key-name quirks are
//! folded through an alias table so the same physical event always encodes to
//! the same chord.

use serde::{Deserialize, Serialize};

/// Raw key event as delivered by the host input layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Host-reported key name (for example `"k"`, `" "`, `"ArrowLeft"`).
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

/// Encodes a raw key event into its canonical chord string.
///
/// Returns `None` when the event carries no encodable key (for example a
/// bare modifier keydown).
pub fn canonical_chord(event: &KeyEvent) -> Option<String> {
    let key = canonical_key_name(&event.key)?;
    let mut parts: Vec<&str> = Vec::with_capacity(5);
    if event.ctrl {
        parts.push("Ctrl");
    }
    if event.shift {
        parts.push("Shift");
    }
    if event.alt {
        parts.push("Alt");
    }
    if event.meta {
        parts.push("Meta");
    }
    parts.push(&key);
    Some(parts.join("+"))
}

/// Normalizes a host key name to its stable canonical form.
fn canonical_key_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() && raw != " " {
        return None;
    }

    // Single printable characters: letters uppercase, everything else as-is.
    if raw.chars().count() == 1 {
        let ch = raw.chars().next().unwrap_or_default();
        if ch == ' ' {
            return Some("Space".to_string());
        }
        return Some(ch.to_ascii_uppercase().to_string());
    }

    let lower = trimmed.to_ascii_lowercase();
    let named = match lower.as_str() {
        "space" | "spacebar" => "Space",
        "escape" | "esc" => "Escape",
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "backspace" => "Backspace",
        "delete" | "del" => "Delete",
        "insert" | "ins" => "Insert",
        "home" => "Home",
        "end" => "End",
        "pageup" => "PageUp",
        "pagedown" => "PageDown",
        "arrowup" | "up" => "Up",
        "arrowdown" | "down" => "Down",
        "arrowleft" | "left" => "Left",
        "arrowright" | "right" => "Right",
        // Bare modifiers never form a chord on their own.
        "control" | "ctrl" | "shift" | "alt" | "meta" | "super" | "cmd" => return None,
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }

    // Function keys F1..F24.
    if let Some(rest) = lower.strip_prefix('f') {
        if let Ok(n) = rest.parse::<u8>() {
            if (1..=24).contains(&n) {
                return Some(format!("F{n}"));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn modifiers_encode_in_fixed_order() {
        let event = KeyEvent::new("k").shift().ctrl();
        assert_eq!(canonical_chord(&event).as_deref(), Some("Ctrl+Shift+K"));

        let event = KeyEvent::new("k").meta().alt().shift().ctrl();
        assert_eq!(
            canonical_chord(&event).as_deref(),
            Some("Ctrl+Shift+Alt+Meta+K")
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let event = KeyEvent::new("ArrowLeft").ctrl().alt();
        assert_eq!(canonical_chord(&event), canonical_chord(&event.clone()));
        assert_eq!(canonical_chord(&event).as_deref(), Some("Ctrl+Alt+Left"));
    }

    #[test]
    fn key_aliases_normalize_to_stable_names() {
        assert_eq!(canonical_chord(&KeyEvent::new(" ")).as_deref(), Some("Space"));
        assert_eq!(
            canonical_chord(&KeyEvent::new("Esc")).as_deref(),
            Some("Escape")
        );
        assert_eq!(
            canonical_chord(&KeyEvent::new("Return")).as_deref(),
            Some("Enter")
        );
        assert_eq!(
            canonical_chord(&KeyEvent::new("ArrowUp")).as_deref(),
            Some("Up")
        );
        assert_eq!(canonical_chord(&KeyEvent::new("f4")).as_deref(), Some("F4"));
    }

    #[test]
    fn letters_are_case_folded() {
        assert_eq!(
            canonical_chord(&KeyEvent::new("s").ctrl()),
            canonical_chord(&KeyEvent::new("S").ctrl())
        );
    }

    #[test]
    fn bare_modifier_keydown_produces_no_chord() {
        assert_eq!(canonical_chord(&KeyEvent::new("Control").ctrl()), None);
        assert_eq!(canonical_chord(&KeyEvent::new("Shift").shift()), None);
    }
}
