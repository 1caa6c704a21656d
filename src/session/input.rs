use std::time::Instant;

/// A key as the typing session sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Tab,
    /// Any other named key (Shift, Control, arrows). Ignored by the session.
    Named(String),
}

impl Key {
    /// Map a key name to a `Key`: single characters are typed text, the
    /// three control names are recognised, everything else is ignored.
    pub fn from_name(name: &str) -> Key {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ => match name {
                "Backspace" => Key::Backspace,
                "Enter" => Key::Enter,
                "Tab" => Key::Tab,
                other => Key::Named(other.to_string()),
            },
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Key::Named(_))
    }
}

/// One processed keystroke attempt, handed to the character tracker.
#[derive(Clone, Debug, PartialEq)]
pub struct KeystrokeEvent {
    pub expected: char,
    pub actual: char,
    pub timestamp: Instant,
    pub correct: bool,
}

impl KeystrokeEvent {
    pub fn new(expected: char, actual: char, timestamp: Instant) -> Self {
        Self {
            expected,
            actual,
            timestamp,
            correct: expected == actual,
        }
    }
}
