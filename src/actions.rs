// src/actions.rs - Key bindings for confirmed gestures and the dispatcher seam
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::pipeline::ConfirmedEvent;
use crate::settings::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Control,
    Option,
    Shift,
    Command,
    Function,
}

impl Modifier {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "ctrl" | "control" => Some(Self::Control),
            "opt" | "option" | "alt" => Some(Self::Option),
            "shift" => Some(Self::Shift),
            "cmd" | "command" | "meta" => Some(Self::Command),
            "fn" | "function" => Some(Self::Function),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "ctrl",
            Self::Option => "option",
            Self::Shift => "shift",
            Self::Command => "cmd",
            Self::Function => "fn",
        }
    }
}

const NAMED_KEYS: &[&str] = &[
    "space", "return", "enter", "tab", "escape", "delete", "backspace", "left", "right", "up",
    "down", "home", "end", "pageup", "pagedown", "volumeup", "volumedown", "mute", "playpause",
];

fn is_known_key(name: &str) -> bool {
    if NAMED_KEYS.contains(&name) {
        return true;
    }
    if let Some(n) = name.strip_prefix('f') {
        if let Ok(n) = n.parse::<u8>() {
            return (1..=20).contains(&n);
        }
    }
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_graphic())
}

/// Modifiers plus exactly one key, parsed from a list such as
/// `["cmd", "shift", "4"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct KeyCombo {
    modifiers: Vec<Modifier>,
    key: String,
}

impl KeyCombo {
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let mut modifiers = Vec::new();
        let mut key: Option<String> = None;

        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if let Some(modifier) = Modifier::parse(&name) {
                if !modifiers.contains(&modifier) {
                    modifiers.push(modifier);
                }
                continue;
            }
            if !is_known_key(&name) {
                return Err(ConfigError::UnknownKey(name));
            }
            if let Some(existing) = &key {
                return Err(ConfigError::InvalidCombo(format!(
                    "more than one key: '{}' and '{}'",
                    existing, name
                )));
            }
            key = Some(name);
        }

        let key = key.ok_or_else(|| ConfigError::InvalidCombo("no key besides modifiers".to_string()))?;
        modifiers.sort();
        Ok(Self { modifiers, key })
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        write!(f, "{}", self.key)
    }
}

impl TryFrom<Vec<String>> for KeyCombo {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(&names)
    }
}

impl From<KeyCombo> for Vec<String> {
    fn from(combo: KeyCombo) -> Self {
        combo
            .modifiers
            .iter()
            .map(|m| m.as_str().to_string())
            .chain(std::iter::once(combo.key))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub snap: KeyCombo,
    pub middle_finger: KeyCombo,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            snap: KeyCombo {
                modifiers: vec![Modifier::Command],
                key: "tab".to_string(),
            },
            middle_finger: KeyCombo {
                modifiers: vec![Modifier::Command],
                key: "w".to_string(),
            },
        }
    }
}

impl KeyBindings {
    pub fn combo_for(&self, event: ConfirmedEvent) -> &KeyCombo {
        match event {
            ConfirmedEvent::Snap => &self.snap,
            ConfirmedEvent::MiddleFingerHeld => &self.middle_finger,
        }
    }
}

/// Turns a confirmed gesture into a key press. OS-level injection lives
/// behind this trait.
pub trait ActionDispatcher {
    fn dispatch(&mut self, event: ConfirmedEvent, combo: &KeyCombo) -> anyhow::Result<()>;
}

/// Reports combos through tracing instead of pressing them.
#[derive(Debug, Default)]
pub struct LogDispatcher {
    dispatched: u64,
}

impl LogDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl ActionDispatcher for LogDispatcher {
    fn dispatch(&mut self, event: ConfirmedEvent, combo: &KeyCombo) -> anyhow::Result<()> {
        self.dispatched += 1;
        info!("{} -> {}", event.as_str(), combo);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_order_and_case() {
        let combo = KeyCombo::parse(&["Shift", "CMD", "4"]).unwrap();
        assert_eq!(combo.modifiers(), &[Modifier::Shift, Modifier::Command]);
        assert_eq!(combo.key(), "4");
        assert_eq!(combo.to_string(), "shift+cmd+4");
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let err = KeyCombo::parse(&["cmd", "hyper"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(ref k) if k == "hyper"), "{:?}", err);
    }

    #[test]
    fn test_parse_requires_exactly_one_key() {
        assert!(matches!(
            KeyCombo::parse(&["cmd", "shift"]),
            Err(ConfigError::InvalidCombo(_))
        ));
        assert!(matches!(
            KeyCombo::parse(&["a", "b"]),
            Err(ConfigError::InvalidCombo(_))
        ));
    }

    #[test]
    fn test_function_keys() {
        assert!(KeyCombo::parse(&["f12"]).is_ok());
        assert!(KeyCombo::parse(&["f21"]).is_err());
    }

    #[test]
    fn test_bindings_json_uses_key_lists() {
        let json = serde_json::to_string(&KeyBindings::default()).unwrap();
        assert_eq!(json, r#"{"snap":["cmd","tab"],"middle_finger":["cmd","w"]}"#);
        let back: KeyBindings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, KeyBindings::default());
    }

    #[test]
    fn test_bad_binding_fails_deserialization() {
        let result: Result<KeyBindings, _> =
            serde_json::from_str(r#"{"snap":["cmd"],"middle_finger":["cmd","w"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_dispatcher_counts() {
        let bindings = KeyBindings::default();
        let mut dispatcher = LogDispatcher::new();
        dispatcher
            .dispatch(ConfirmedEvent::Snap, bindings.combo_for(ConfirmedEvent::Snap))
            .unwrap();
        assert_eq!(dispatcher.dispatched(), 1);
    }
}
