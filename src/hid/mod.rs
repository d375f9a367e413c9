//! HID emission: mouse, keyboard and joystick
//!
//! The core talks to [`Hid`]. [`Emitter`] implements it on top of a raw
//! [`HidBackend`] and keeps track of what is currently held, so that
//! hold/toggle/release semantics and "release all" work the same on
//! every backend.

#[cfg(feature = "desktop-hid")]
mod desktop;
mod keys;

#[cfg(feature = "desktop-hid")]
pub use desktop::EnigoBackend;
pub use keys::{parse_keys, Key};

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::SUPPORTED_LAYOUTS;

/// Mouse buttons addressable by AT commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Joystick axes addressable by AT commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickAxis {
    X,
    Y,
    Z,
    ZRotate,
    Slider,
}

/// HID collaborator used by the dispatcher
pub trait Hid {
    fn mouse_press(&mut self, button: MouseButton);
    fn mouse_release(&mut self, button: MouseButton);
    fn mouse_toggle(&mut self, button: MouseButton);
    fn mouse_move(&mut self, dx: i16, dy: i16);
    fn mouse_scroll(&mut self, amount: i16);

    fn joystick_axis(&mut self, axis: JoystickAxis, value: i16);
    fn joystick_button(&mut self, button: i16, pressed: bool);
    /// Hat angle in degrees, -1 for centre
    fn joystick_hat(&mut self, angle: i16);

    /// Type text
    fn keyboard_print(&mut self, text: &str);
    /// Press the keys, then release them
    fn press_keys(&mut self, keystring: &str);
    /// Press the keys and keep them held
    fn hold_keys(&mut self, keystring: &str);
    /// Press keys not held, release keys that are
    fn toggle_keys(&mut self, keystring: &str);
    fn release_keys(&mut self, keystring: &str);

    /// Release every held key and button. Safe when nothing is held.
    fn release_all(&mut self);

    /// Switch keyboard layout, false if the code is not supported
    fn set_keyboard_layout(&mut self, code: &str) -> bool;
}

/// Raw event sink an [`Emitter`] drives
pub trait HidBackend {
    fn key(&mut self, key: Key, down: bool);
    fn text(&mut self, text: &str);
    fn mouse_button(&mut self, button: MouseButton, down: bool);
    fn mouse_move(&mut self, dx: i16, dy: i16);
    fn scroll(&mut self, amount: i16);

    fn joystick_axis(&mut self, axis: JoystickAxis, value: i16) {
        debug!("Joystick axis {:?} = {} (no joystick backend)", axis, value);
    }

    fn joystick_button(&mut self, button: i16, pressed: bool) {
        debug!(
            "Joystick button {} {} (no joystick backend)",
            button,
            if pressed { "down" } else { "up" }
        );
    }

    fn joystick_hat(&mut self, angle: i16) {
        debug!("Joystick hat {} (no joystick backend)", angle);
    }

    fn name(&self) -> &'static str;
}

/// Backend that only logs events, for hosts without an input injector
#[derive(Debug, Default)]
pub struct LogBackend;

impl HidBackend for LogBackend {
    fn key(&mut self, key: Key, down: bool) {
        info!("Key {} {}", key, if down { "down" } else { "up" });
    }

    fn text(&mut self, text: &str) {
        info!("Type text: {:?}", text);
    }

    fn mouse_button(&mut self, button: MouseButton, down: bool) {
        info!("Mouse {:?} {}", button, if down { "down" } else { "up" });
    }

    fn mouse_move(&mut self, dx: i16, dy: i16) {
        debug!("Mouse move ({}, {})", dx, dy);
    }

    fn scroll(&mut self, amount: i16) {
        info!("Mouse scroll {}", amount);
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Stateful [`Hid`] implementation over a raw backend
pub struct Emitter<B: HidBackend> {
    backend: B,
    held_keys: BTreeSet<Key>,
    held_buttons: BTreeSet<MouseButton>,
    held_joystick: BTreeSet<i16>,
    layout: String,
}

impl<B: HidBackend> Emitter<B> {
    pub fn new(backend: B) -> Self {
        info!("HID backend: {}", backend.name());
        Self {
            backend,
            held_keys: BTreeSet::new(),
            held_buttons: BTreeSet::new(),
            held_joystick: BTreeSet::new(),
            layout: "en_US".to_string(),
        }
    }

    fn key_down(&mut self, key: Key) {
        if self.held_keys.insert(key) {
            self.backend.key(key, true);
        }
    }

    fn key_up(&mut self, key: Key) {
        if self.held_keys.remove(&key) {
            self.backend.key(key, false);
        }
    }
}

/// Modifiers first, so `KEY_CTRL KEY_C` works in any order
fn ordered_keys(keystring: &str) -> Vec<Key> {
    let mut keys = parse_keys(keystring);
    keys.sort_by_key(|k| !k.is_modifier());
    keys
}

impl<B: HidBackend> Hid for Emitter<B> {
    fn mouse_press(&mut self, button: MouseButton) {
        if self.held_buttons.insert(button) {
            self.backend.mouse_button(button, true);
        }
    }

    fn mouse_release(&mut self, button: MouseButton) {
        if self.held_buttons.remove(&button) {
            self.backend.mouse_button(button, false);
        }
    }

    fn mouse_toggle(&mut self, button: MouseButton) {
        if self.held_buttons.contains(&button) {
            self.mouse_release(button);
        } else {
            self.mouse_press(button);
        }
    }

    fn mouse_move(&mut self, dx: i16, dy: i16) {
        self.backend.mouse_move(dx, dy);
    }

    fn mouse_scroll(&mut self, amount: i16) {
        self.backend.scroll(amount);
    }

    fn joystick_axis(&mut self, axis: JoystickAxis, value: i16) {
        self.backend.joystick_axis(axis, value);
    }

    fn joystick_button(&mut self, button: i16, pressed: bool) {
        let changed = if pressed {
            self.held_joystick.insert(button)
        } else {
            self.held_joystick.remove(&button)
        };
        if changed {
            self.backend.joystick_button(button, pressed);
        }
    }

    fn joystick_hat(&mut self, angle: i16) {
        self.backend.joystick_hat(angle);
    }

    fn keyboard_print(&mut self, text: &str) {
        self.backend.text(text);
    }

    fn press_keys(&mut self, keystring: &str) {
        let keys: Vec<Key> = ordered_keys(keystring)
            .into_iter()
            .filter(|k| !self.held_keys.contains(k))
            .collect();
        for &key in &keys {
            self.key_down(key);
        }
        for &key in keys.iter().rev() {
            self.key_up(key);
        }
    }

    fn hold_keys(&mut self, keystring: &str) {
        for key in ordered_keys(keystring) {
            self.key_down(key);
        }
    }

    fn toggle_keys(&mut self, keystring: &str) {
        for key in ordered_keys(keystring) {
            if self.held_keys.contains(&key) {
                self.key_up(key);
            } else {
                self.key_down(key);
            }
        }
    }

    fn release_keys(&mut self, keystring: &str) {
        for key in ordered_keys(keystring).into_iter().rev() {
            self.key_up(key);
        }
    }

    fn release_all(&mut self) {
        let keys: Vec<Key> = self.held_keys.iter().rev().copied().collect();
        for key in keys {
            self.key_up(key);
        }
        let buttons: Vec<MouseButton> = self.held_buttons.iter().copied().collect();
        for button in buttons {
            self.mouse_release(button);
        }
        let joystick: Vec<i16> = self.held_joystick.iter().copied().collect();
        for button in joystick {
            self.joystick_button(button, false);
        }
    }

    fn set_keyboard_layout(&mut self, code: &str) -> bool {
        if SUPPORTED_LAYOUTS.contains(&code) {
            if self.layout != code {
                info!("Keyboard layout: {} -> {}", self.layout, code);
            }
            self.layout = code.to_string();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl HidBackend for Trace {
        fn key(&mut self, key: Key, down: bool) {
            self.0.push(format!("{}{}", if down { "+" } else { "-" }, key));
        }
        fn text(&mut self, text: &str) {
            self.0.push(format!("text {}", text));
        }
        fn mouse_button(&mut self, button: MouseButton, down: bool) {
            self.0
                .push(format!("{}{:?}", if down { "+" } else { "-" }, button));
        }
        fn mouse_move(&mut self, dx: i16, dy: i16) {
            self.0.push(format!("move {} {}", dx, dy));
        }
        fn scroll(&mut self, amount: i16) {
            self.0.push(format!("scroll {}", amount));
        }
        fn name(&self) -> &'static str {
            "trace"
        }
    }

    #[test]
    fn test_press_keys_modifiers_first() {
        let mut hid = Emitter::new(Trace::default());
        hid.press_keys("KEY_C KEY_CTRL");
        assert_eq!(
            hid.backend.0,
            ["+KEY_CTRL", "+KEY_C", "-KEY_C", "-KEY_CTRL"]
        );
        assert_eq!(hid.held_keys.len(), 0);
    }

    #[test]
    fn test_hold_then_release_all() {
        let mut hid = Emitter::new(Trace::default());
        hid.hold_keys("KEY_A");
        hid.mouse_press(MouseButton::Left);
        assert_eq!(hid.held_keys.len(), 1);

        hid.release_all();
        assert_eq!(hid.held_keys.len(), 0);
        assert_eq!(hid.held_buttons.len(), 0);

        // idempotent
        let events = hid.backend.0.len();
        hid.release_all();
        assert_eq!(hid.backend.0.len(), events);
    }

    #[test]
    fn test_toggle_keys() {
        let mut hid = Emitter::new(Trace::default());
        hid.toggle_keys("KEY_A");
        assert_eq!(hid.held_keys.len(), 1);
        hid.toggle_keys("KEY_A");
        assert_eq!(hid.held_keys.len(), 0);
        assert_eq!(hid.backend.0, ["+KEY_A", "-KEY_A"]);
    }

    #[test]
    fn test_mouse_toggle_and_redundant_release() {
        let mut hid = Emitter::new(Trace::default());
        hid.mouse_toggle(MouseButton::Right);
        hid.mouse_toggle(MouseButton::Right);
        hid.mouse_release(MouseButton::Right);
        assert_eq!(hid.backend.0, ["+Right", "-Right"]);
    }

    #[test]
    fn test_keyboard_layout() {
        let mut hid = Emitter::new(Trace::default());
        assert!(hid.set_keyboard_layout("de_DE"));
        assert_eq!(hid.layout, "de_DE");
        assert!(!hid.set_keyboard_layout("xx_XX"));
        assert_eq!(hid.layout, "de_DE");
    }
}
