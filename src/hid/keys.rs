//! Key identifiers used in keystrings (`AT KP KEY_CTRL KEY_C`)

use std::fmt;
use tracing::debug;

/// Keys that can appear in a keystring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Letter A-Z (uppercase ASCII)
    Letter(char),
    /// Top-row digit 0-9
    Digit(char),
    /// Function key F1-F12
    F(u8),
    Right,
    Left,
    Down,
    Up,
    Enter,
    Escape,
    Backspace,
    Tab,
    Home,
    PageUp,
    PageDown,
    Delete,
    Insert,
    End,
    NumLock,
    ScrollLock,
    Space,
    CapsLock,
    Pause,
    Shift,
    Ctrl,
    Alt,
    RightAlt,
    Gui,
    RightGui,
    Slash,
    Backslash,
    LeftBrace,
    RightBrace,
    Quote,
    Tilde,
    Minus,
    Semicolon,
    Equal,
    Comma,
    Period,
    Menu,
    /// Keypad digit 0-9
    Keypad(char),
    KeypadSlash,
    KeypadMinus,
    KeypadPlus,
    KeypadEnter,
    KeypadPeriod,
    KeypadAsterisk,
}

/// Named keys, everything except letters, digits and function keys
const NAMED_KEYS: &[(&str, Key)] = &[
    ("KEY_RIGHT", Key::Right),
    ("KEY_LEFT", Key::Left),
    ("KEY_DOWN", Key::Down),
    ("KEY_UP", Key::Up),
    ("KEY_ENTER", Key::Enter),
    ("KEY_ESC", Key::Escape),
    ("KEY_BACKSPACE", Key::Backspace),
    ("KEY_TAB", Key::Tab),
    ("KEY_HOME", Key::Home),
    ("KEY_PAGE_UP", Key::PageUp),
    ("KEY_PAGE_DOWN", Key::PageDown),
    ("KEY_DELETE", Key::Delete),
    ("KEY_INSERT", Key::Insert),
    ("KEY_END", Key::End),
    ("KEY_NUM_LOCK", Key::NumLock),
    ("KEY_SCROLL_LOCK", Key::ScrollLock),
    ("KEY_SPACE", Key::Space),
    ("KEY_CAPS_LOCK", Key::CapsLock),
    ("KEY_PAUSE", Key::Pause),
    ("KEY_SHIFT", Key::Shift),
    ("KEY_CTRL", Key::Ctrl),
    ("KEY_ALT", Key::Alt),
    ("KEY_RIGHT_ALT", Key::RightAlt),
    ("KEY_GUI", Key::Gui),
    ("KEY_RIGHT_GUI", Key::RightGui),
    ("KEY_SLASH", Key::Slash),
    ("KEY_BACKSLASH", Key::Backslash),
    ("KEY_LEFT_BRACE", Key::LeftBrace),
    ("KEY_RIGHT_BRACE", Key::RightBrace),
    ("KEY_QUOTE", Key::Quote),
    ("KEY_TILDE", Key::Tilde),
    ("KEY_MINUS", Key::Minus),
    ("KEY_SEMICOLON", Key::Semicolon),
    ("KEY_EQUAL", Key::Equal),
    ("KEY_COMMA", Key::Comma),
    ("KEY_PERIOD", Key::Period),
    ("KEY_MENU", Key::Menu),
    ("KEYPAD_SLASH", Key::KeypadSlash),
    ("KEYPAD_MINUS", Key::KeypadMinus),
    ("KEYPAD_PLUS", Key::KeypadPlus),
    ("KEYPAD_ENTER", Key::KeypadEnter),
    ("KEYPAD_PERIOD", Key::KeypadPeriod),
    ("KEYPAD_ASTERIX", Key::KeypadAsterisk),
];

impl Key {
    /// Resolve a single identifier such as `KEY_A`, `KEY_F5` or `KEYPAD_7`
    pub fn from_name(name: &str) -> Option<Key> {
        let upper = name.trim().to_ascii_uppercase();

        if let Some(&(_, key)) = NAMED_KEYS.iter().find(|(n, _)| *n == upper) {
            return Some(key);
        }

        if let Some(rest) = upper.strip_prefix("KEYPAD_") {
            return single_char(rest)
                .filter(char::is_ascii_digit)
                .map(Key::Keypad);
        }

        let rest = upper.strip_prefix("KEY_")?;
        if let Some(c) = single_char(rest) {
            return match c {
                'A'..='Z' => Some(Key::Letter(c)),
                '0'..='9' => Some(Key::Digit(c)),
                _ => None,
            };
        }

        match rest.strip_prefix('F')?.parse::<u8>() {
            Ok(n @ 1..=12) => Some(Key::F(n)),
            _ => None,
        }
    }

    /// Modifier keys are pressed before and released after other keys
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::Shift | Key::Ctrl | Key::Alt | Key::RightAlt | Key::Gui | Key::RightGui
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) | Key::Digit(c) => write!(f, "KEY_{}", c),
            Key::F(n) => write!(f, "KEY_F{}", n),
            Key::Keypad(c) => write!(f, "KEYPAD_{}", c),
            other => {
                let name = NAMED_KEYS
                    .iter()
                    .find(|(_, k)| k == other)
                    .map(|(n, _)| *n)
                    .unwrap_or("KEY_?");
                f.write_str(name)
            }
        }
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Parse a whitespace separated keystring, skipping unknown identifiers
pub fn parse_keys(keystring: &str) -> Vec<Key> {
    keystring
        .split_whitespace()
        .filter_map(|token| {
            let key = Key::from_name(token);
            if key.is_none() {
                debug!("Ignoring unknown key identifier: {}", token);
            }
            key
        })
        .collect()
}
