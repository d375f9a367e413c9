use anyhow::{anyhow, Result};
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key as EnigoKey, Keyboard, Mouse, Settings};
use tracing::{debug, warn};

use super::{HidBackend, Key, MouseButton};

/// Injects keyboard and mouse events into the host desktop
pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("Failed to initialize Enigo: {}", e))?;
        Ok(Self { enigo })
    }
}

fn to_enigo_key(key: Key) -> Option<EnigoKey> {
    let mapped = match key {
        Key::Letter(c) => EnigoKey::Unicode(c.to_ascii_lowercase()),
        Key::Digit(c) | Key::Keypad(c) => EnigoKey::Unicode(c),
        Key::F(1) => EnigoKey::F1,
        Key::F(2) => EnigoKey::F2,
        Key::F(3) => EnigoKey::F3,
        Key::F(4) => EnigoKey::F4,
        Key::F(5) => EnigoKey::F5,
        Key::F(6) => EnigoKey::F6,
        Key::F(7) => EnigoKey::F7,
        Key::F(8) => EnigoKey::F8,
        Key::F(9) => EnigoKey::F9,
        Key::F(10) => EnigoKey::F10,
        Key::F(11) => EnigoKey::F11,
        Key::F(12) => EnigoKey::F12,
        Key::F(_) => return None,
        Key::Right => EnigoKey::RightArrow,
        Key::Left => EnigoKey::LeftArrow,
        Key::Down => EnigoKey::DownArrow,
        Key::Up => EnigoKey::UpArrow,
        Key::Enter | Key::KeypadEnter => EnigoKey::Return,
        Key::Escape => EnigoKey::Escape,
        Key::Backspace => EnigoKey::Backspace,
        Key::Tab => EnigoKey::Tab,
        Key::Home => EnigoKey::Home,
        Key::PageUp => EnigoKey::PageUp,
        Key::PageDown => EnigoKey::PageDown,
        Key::Delete => EnigoKey::Delete,
        Key::End => EnigoKey::End,
        Key::Space => EnigoKey::Space,
        Key::CapsLock => EnigoKey::CapsLock,
        Key::Shift => EnigoKey::Shift,
        Key::Ctrl => EnigoKey::Control,
        Key::Alt | Key::RightAlt => EnigoKey::Alt,
        Key::Gui | Key::RightGui => EnigoKey::Meta,
        Key::Slash | Key::KeypadSlash => EnigoKey::Unicode('/'),
        Key::Backslash => EnigoKey::Unicode('\\'),
        Key::LeftBrace => EnigoKey::Unicode('['),
        Key::RightBrace => EnigoKey::Unicode(']'),
        Key::Quote => EnigoKey::Unicode('\''),
        Key::Tilde => EnigoKey::Unicode('`'),
        Key::Minus | Key::KeypadMinus => EnigoKey::Unicode('-'),
        Key::Semicolon => EnigoKey::Unicode(';'),
        Key::Equal => EnigoKey::Unicode('='),
        Key::Comma => EnigoKey::Unicode(','),
        Key::Period | Key::KeypadPeriod => EnigoKey::Unicode('.'),
        Key::KeypadPlus => EnigoKey::Unicode('+'),
        Key::KeypadAsterisk => EnigoKey::Unicode('*'),
        Key::Insert | Key::NumLock | Key::ScrollLock | Key::Pause | Key::Menu => return None,
    };
    Some(mapped)
}

fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

impl HidBackend for EnigoBackend {
    fn key(&mut self, key: Key, down: bool) {
        let Some(enigo_key) = to_enigo_key(key) else {
            warn!("Key {} not supported by desktop backend", key);
            return;
        };
        let direction = if down { Direction::Press } else { Direction::Release };
        debug!("Sending key: {:?} {:?}", enigo_key, direction);
        let _ = self.enigo.key(enigo_key, direction);
    }

    fn text(&mut self, text: &str) {
        debug!("Sending text: {}", text);
        let _ = self.enigo.text(text);
    }

    fn mouse_button(&mut self, button: MouseButton, down: bool) {
        let direction = if down { Direction::Press } else { Direction::Release };
        let _ = self.enigo.button(to_enigo_button(button), direction);
    }

    fn mouse_move(&mut self, dx: i16, dy: i16) {
        let _ = self
            .enigo
            .move_mouse(dx as i32, dy as i32, Coordinate::Rel);
    }

    fn scroll(&mut self, amount: i16) {
        let _ = self.enigo.scroll(amount as i32, Axis::Vertical);
    }

    fn name(&self) -> &'static str {
        "enigo"
    }
}
