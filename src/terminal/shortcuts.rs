//! Keyboard chords that drive the session manager regardless of focus.
//!
//! | Chord | Action |
//! |---|---|
//! | ctrl/meta + N | new session |
//! | ctrl/meta + shift + W | close the active session |
//! | ctrl/meta + K | clear the active session's output |
//! | alt + Right | next session, wrapping |
//! | alt + Left | previous session, wrapping |

use crate::terminal::manager::SessionManager;
use crate::terminal::session::SessionId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    /// A printable key, stored lowercase.
    Char(char),
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Other(String),
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Key::Char(c.to_ascii_lowercase());
        }
        match name.to_ascii_lowercase().as_str() {
            "arrowleft" | "left" => Key::ArrowLeft,
            "arrowright" | "right" => Key::ArrowRight,
            "arrowup" | "up" => Key::ArrowUp,
            "arrowdown" | "down" => Key::ArrowDown,
            "enter" | "return" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            _ => Key::Other(name.to_string()),
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::from(name.as_str())
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        match key {
            Key::Char(c) => c.to_string(),
            Key::ArrowLeft => "ArrowLeft".to_string(),
            Key::ArrowRight => "ArrowRight".to_string(),
            Key::ArrowUp => "ArrowUp".to_string(),
            Key::ArrowDown => "ArrowDown".to_string(),
            Key::Enter => "Enter".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    #[default]
    Down,
    /// Auto-repeat generated by the platform while the key is held.
    Repeat,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub phase: KeyPhase,
}

impl KeyChord {
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            phase: KeyPhase::Down,
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

    pub fn with_phase(mut self, phase: KeyPhase) -> Self {
        self.phase = phase;
        self
    }

    fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Parses ids such as `ctrl+shift+w` or `alt+right`.
impl FromStr for KeyChord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(format!("empty key chord: '{}'", s));
        };
        if key.is_empty() {
            return Err(format!("missing key in chord: '{}'", s));
        }

        let mut chord = KeyChord::new(*key);
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "super" => chord.meta = true,
                other => return Err(format!("unknown modifier '{}' in chord '{}'", other, s)),
            }
        }
        Ok(chord)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    NewSession,
    CloseActiveSession,
    ClearActiveOutput,
    NextSession,
    PreviousSession,
}

/// Result of a handled chord. The caller must suppress the platform default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub action: ShortcutAction,
    pub active_id: SessionId,
    pub prevent_default: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutDispatcher;

impl ShortcutDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Maps a chord to at most one action. Key-up events never match.
    pub fn resolve(&self, chord: &KeyChord) -> Option<ShortcutAction> {
        if chord.phase == KeyPhase::Up {
            return None;
        }
        match chord.key {
            Key::Char('w') if chord.primary() && chord.shift => Some(ShortcutAction::CloseActiveSession),
            Key::Char('n') if chord.primary() => Some(ShortcutAction::NewSession),
            Key::Char('k') if chord.primary() => Some(ShortcutAction::ClearActiveOutput),
            Key::ArrowRight if chord.alt => Some(ShortcutAction::NextSession),
            Key::ArrowLeft if chord.alt => Some(ShortcutAction::PreviousSession),
            _ => None,
        }
    }

    /// Applies the chord's action to the active session, if the chord is bound.
    pub fn dispatch(&self, manager: &mut SessionManager, chord: &KeyChord) -> Option<Dispatched> {
        let action = self.resolve(chord)?;
        let active = manager.active_id();
        match action {
            ShortcutAction::NewSession => {
                let id = manager.add_session();
                manager.set_active(id);
            }
            ShortcutAction::CloseActiveSession => {
                manager.close_session(active);
            }
            ShortcutAction::ClearActiveOutput => {
                manager.clear_output(active);
            }
            ShortcutAction::NextSession => {
                manager.activate_next();
            }
            ShortcutAction::PreviousSession => {
                manager.activate_previous();
            }
        }
        debug!(?action, active = %manager.active_id(), "Shortcut dispatched");

        Some(Dispatched {
            action,
            active_id: manager.active_id(),
            prevent_default: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::manager::SessionDefaults;

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    #[test]
    fn parses_chord_ids() {
        assert_eq!(chord("ctrl+shift+w"), KeyChord::new('w').ctrl().shift());
        assert_eq!(chord("alt+right"), KeyChord::new(Key::ArrowRight).alt());
        assert_eq!(chord("cmd+N"), KeyChord::new('n').meta());
        assert!("hyper+x".parse::<KeyChord>().is_err());
        assert!("ctrl+".parse::<KeyChord>().is_err());
    }

    #[test]
    fn resolves_bound_chords() {
        let d = ShortcutDispatcher::new();
        assert_eq!(d.resolve(&chord("ctrl+n")), Some(ShortcutAction::NewSession));
        assert_eq!(d.resolve(&chord("meta+n")), Some(ShortcutAction::NewSession));
        assert_eq!(d.resolve(&chord("ctrl+shift+w")), Some(ShortcutAction::CloseActiveSession));
        assert_eq!(d.resolve(&chord("ctrl+k")), Some(ShortcutAction::ClearActiveOutput));
        assert_eq!(d.resolve(&chord("alt+ArrowRight")), Some(ShortcutAction::NextSession));
        assert_eq!(d.resolve(&chord("alt+ArrowLeft")), Some(ShortcutAction::PreviousSession));
    }

    #[test]
    fn unbound_and_key_up_chords_are_ignored() {
        let d = ShortcutDispatcher::new();
        assert_eq!(d.resolve(&chord("ctrl+w")), None);
        assert_eq!(d.resolve(&chord("n")), None);
        assert_eq!(d.resolve(&chord("right")), None);
        assert_eq!(d.resolve(&chord("ctrl+n").with_phase(KeyPhase::Up)), None);
        assert_eq!(
            d.resolve(&chord("ctrl+n").with_phase(KeyPhase::Repeat)),
            Some(ShortcutAction::NewSession)
        );
    }

    #[test]
    fn dispatch_new_then_close_active() {
        let d = ShortcutDispatcher::new();
        let mut m = SessionManager::new(SessionDefaults::default(), "hi");
        let first = m.active_id();

        let out = d.dispatch(&mut m, &chord("ctrl+n")).unwrap();
        assert!(out.prevent_default);
        assert_eq!(m.len(), 2);
        assert_ne!(out.active_id, first);

        let out = d.dispatch(&mut m, &chord("ctrl+shift+w")).unwrap();
        assert_eq!(out.action, ShortcutAction::CloseActiveSession);
        assert_eq!(m.len(), 1);
        assert_eq!(out.active_id, first);

        // The last session survives.
        d.dispatch(&mut m, &chord("ctrl+shift+w")).unwrap();
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn alt_right_wraps_from_last_to_first() {
        let d = ShortcutDispatcher::new();
        let mut m = SessionManager::new(SessionDefaults::default(), "hi");
        let first = m.active_id();
        m.add_session();
        m.add_session();

        let out = d.dispatch(&mut m, &chord("alt+right")).unwrap();
        assert_eq!(out.active_id, first);
        let out = d.dispatch(&mut m, &chord("alt+left")).unwrap();
        assert_eq!(out.active_id, m.sessions()[2].id());
    }
}
