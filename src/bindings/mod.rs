//! Button bindings: what each button does
//!
//! Every button is bound to one AT command: an action, a numeric
//! parameter and a keystring. Keystrings live in a shared packed arena
//! ([`KeystringStore`]); entry `i` owns arena slot `i`.

mod store;

pub use store::KeystringStore;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::{ActionCode, ParamType};
use crate::device::{button_label, MAX_KEYSTRINGBUFFER_LEN, NUMBER_OF_BUTTONS};
use crate::error::CoreError;

/// 0-based button index
pub type ButtonId = usize;

/// Arena sized for the device
pub type Keystrings = KeystringStore<NUMBER_OF_BUTTONS, MAX_KEYSTRINGBUFFER_LEN>;

/// Binding of a single button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEntry {
    pub action: ActionCode,
    pub value: i16,
    /// Arena slot holding this button's keystring
    #[serde(default)]
    pub keystring: usize,
}

impl BindingEntry {
    fn idle(index: ButtonId) -> Self {
        Self {
            action: ActionCode::NoCommand,
            value: 0,
            keystring: index,
        }
    }
}

/// Factory bindings: (button index, action, keystring)
const DEFAULT_BINDINGS: [(ButtonId, ActionCode, &str); 5] = [
    (0, ActionCode::KeyPress, "KEY_SPACE "),
    (1, ActionCode::KeyPress, "KEY_ENTER "),
    (2, ActionCode::ClickLeft, ""),
    (3, ActionCode::KeyPress, "KEY_LEFT "),
    (4, ActionCode::KeyPress, "KEY_RIGHT "),
];

/// Bindings of all buttons plus their keystring arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTable {
    entries: [BindingEntry; NUMBER_OF_BUTTONS],
    keystrings: Keystrings,
}

impl ButtonTable {
    /// Every button idle, every keystring empty
    pub fn new() -> Self {
        Self {
            entries: std::array::from_fn(BindingEntry::idle),
            keystrings: Keystrings::new(),
        }
    }

    /// Table with the factory bindings
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.reset_defaults();
        table
    }

    /// Restore the factory bindings
    pub fn reset_defaults(&mut self) {
        self.keystrings.clear();
        self.entries = std::array::from_fn(BindingEntry::idle);

        for (button, action, keystring) in DEFAULT_BINDINGS {
            if let Err(e) = self.bind(button, action, 0, keystring) {
                warn!("Default binding for button {} failed: {}", button + 1, e);
            }
        }
        debug!("Button bindings reset to defaults");
    }

    /// Bind a button. On keystring overflow or a negative unsigned
    /// parameter the entry stays unchanged.
    pub fn bind(
        &mut self,
        button: ButtonId,
        action: ActionCode,
        value: i16,
        keystring: &str,
    ) -> Result<usize, CoreError> {
        if action.param_type() == ParamType::Uint && value < 0 {
            return Err(CoreError::InvalidParameter {
                command: action.code(),
                value: value.to_string(),
            });
        }
        let free = self.keystrings.set(button, keystring)?;

        let entry = &mut self.entries[button];
        entry.action = action;
        entry.value = value;
        entry.keystring = button;

        info!(
            "Button {} bound to {} {} {:?}, {} bytes left",
            button + 1,
            action,
            value,
            keystring,
            free
        );
        Ok(free)
    }

    pub fn entry(&self, button: ButtonId) -> &BindingEntry {
        &self.entries[button]
    }

    pub fn entries(&self) -> &[BindingEntry; NUMBER_OF_BUTTONS] {
        &self.entries
    }

    /// Keystring bound to a button
    pub fn keystring(&self, button: ButtonId) -> &str {
        self.keystrings.get(self.entries[button].keystring)
    }

    pub fn keystrings(&self) -> &Keystrings {
        &self.keystrings
    }

    /// Whether the button's action must be stopped on release
    pub fn is_hold_mode(&self, button: ButtonId) -> bool {
        self.entries[button].action.is_hold_mode()
    }

    /// Replace the whole table with persisted content.
    ///
    /// Validates everything before touching the table; missing entries
    /// read as idle.
    pub fn restore(&mut self, entries: &[BindingEntry], arena: &[u8]) -> Result<(), CoreError> {
        let keystrings =
            Keystrings::from_bytes(arena).map_err(|e| CoreError::Storage(e.to_string()))?;

        let mut restored: [BindingEntry; NUMBER_OF_BUTTONS] =
            std::array::from_fn(BindingEntry::idle);
        for (index, (slot, entry)) in restored.iter_mut().zip(entries).enumerate() {
            *slot = BindingEntry {
                keystring: index,
                ..*entry
            };
        }

        self.entries = restored;
        self.keystrings = keystrings;
        Ok(())
    }

    /// One line per button: `Button 1: KP KEY_SPACE`
    pub fn describe(&self) -> Vec<String> {
        (0..NUMBER_OF_BUTTONS)
            .map(|button| {
                let entry = self.entry(button);
                let mut line = format!("{}: {}", button_label(button), entry.action);
                if entry.value != 0 {
                    line.push_str(&format!(" {}", entry.value));
                }
                let keystring = self.keystring(button);
                if !keystring.is_empty() {
                    line.push(' ');
                    line.push_str(keystring);
                }
                line
            })
            .collect()
    }
}

impl Default for ButtonTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = ButtonTable::with_defaults();
        assert_eq!(table.entry(0).action, ActionCode::KeyPress);
        assert_eq!(table.keystring(0), "KEY_SPACE ");
        assert_eq!(table.entry(1).action, ActionCode::KeyPress);
        assert_eq!(table.keystring(1), "KEY_ENTER ");
        assert_eq!(table.entry(2).action, ActionCode::ClickLeft);
        assert_eq!(table.keystring(2), "");
        assert_eq!(table.keystring(4), "KEY_RIGHT ");
        for button in 5..NUMBER_OF_BUTTONS {
            assert_eq!(table.entry(button).action, ActionCode::NoCommand);
            assert_eq!(table.keystring(button), "");
        }
    }

    #[test]
    fn test_bind_updates_entry_and_keystring() {
        let mut table = ButtonTable::with_defaults();
        table.bind(7, ActionCode::Macro, 0, "MX 10;CL").unwrap();
        assert_eq!(table.entry(7).action, ActionCode::Macro);
        assert_eq!(table.keystring(7), "MX 10;CL");
        // neighbours untouched
        assert_eq!(table.keystring(4), "KEY_RIGHT ");
        assert_eq!(table.keystring(8), "");
    }

    #[test]
    fn test_bind_overflow_leaves_entry_unchanged() {
        let mut table = ButtonTable::with_defaults();
        let before = table.clone();
        let huge = "x".repeat(MAX_KEYSTRINGBUFFER_LEN);

        let err = table.bind(0, ActionCode::KeyWrite, 5, &huge).unwrap_err();
        assert!(matches!(err, CoreError::BufferOverflow(_)));
        assert_eq!(table, before);
    }

    #[test]
    fn test_bind_rejects_negative_unsigned() {
        let mut table = ButtonTable::with_defaults();
        let before = table.clone();
        for action in [ActionCode::Wait, ActionCode::LongPressTime, ActionCode::IrTimeout] {
            assert!(matches!(
                table.bind(0, action, -1, ""),
                Err(CoreError::InvalidParameter { .. })
            ));
        }
        assert_eq!(table, before);

        // signed parameters stay signed
        table.bind(0, ActionCode::MoveX, -1, "").unwrap();
        assert_eq!(table.entry(0).value, -1);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut table = ButtonTable::with_defaults();
        table.bind(10, ActionCode::MoveY, -4, "").unwrap();

        let mut copy = ButtonTable::new();
        copy.restore(table.entries(), table.keystrings().as_bytes()).unwrap();
        assert_eq!(copy, table);
    }

    #[test]
    fn test_restore_rejects_bad_arena_without_change() {
        let mut table = ButtonTable::with_defaults();
        let before = table.clone();
        let bad = [0xffu8; MAX_KEYSTRINGBUFFER_LEN];
        assert!(matches!(table.restore(&[], &bad), Err(CoreError::Storage(_))));
        assert_eq!(table, before);
    }

    #[test]
    fn test_describe() {
        let table = ButtonTable::with_defaults();
        let lines = table.describe();
        assert_eq!(lines.len(), NUMBER_OF_BUTTONS);
        assert_eq!(lines[0], "Button 1: KP KEY_SPACE ");
        assert_eq!(lines[2], "Button 3: CL");
    }
}
