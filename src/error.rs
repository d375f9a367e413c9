//! Error types for the button/command core

use thiserror::Error;

/// Supported keyboard layouts, as listed in the `AT KL` error reply
pub const SUPPORTED_LAYOUTS: [&str; 7] = [
    "de_DE", "en_US", "es_ES", "fr_FR", "it_IT", "sv_SE", "da_DK",
];

/// Errors from the keystring arena
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeystringError {
    /// New keystring does not fit into the arena
    #[error("keystring buffer overflow: {needed} bytes needed, {capacity} available")]
    Overflow { needed: usize, capacity: usize },

    /// Persisted arena does not contain one terminator per slot
    #[error("keystring buffer holds {found} of {expected} terminated strings")]
    Truncated { found: usize, expected: usize },

    /// Persisted arena is not valid UTF-8
    #[error("keystring buffer is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors from dispatching AT commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Keystring update would exceed arena capacity (fully rolled back)
    #[error("Buffer overflow: {0}")]
    BufferOverflow(#[from] KeystringError),

    /// `AT BM` target outside 1..=NUMBER_OF_BUTTONS
    #[error("Invalid button target: {0}")]
    InvalidTarget(i16),

    /// Named slot or IR command absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// No free slot left in persistent storage
    #[error("Storage full")]
    StorageFull,

    /// Keyboard layout code not recognised
    #[error("Unsupported keyboard layout: {0}")]
    UnsupportedLayout(String),

    /// Command text names no known AT command
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Numeric parameter missing
    #[error("Missing parameter for AT {0}")]
    MissingParameter(&'static str),

    /// Numeric parameter not a number or out of range
    #[error("Invalid parameter for AT {command}: {value}")]
    InvalidParameter { command: &'static str, value: String },

    /// Macros nested deeper than MAX_MACRO_DEPTH
    #[error("Macro nesting deeper than {0} levels")]
    MacroTooDeep(usize),

    /// Persistence collaborator failed (I/O, encoding)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Reply line sent back over the command channel
    pub fn reply(&self) -> String {
        match self {
            CoreError::NotFound(_) => "E: not found".to_string(),
            CoreError::StorageFull => "E: eeprom full".to_string(),
            CoreError::UnsupportedLayout(_) => {
                format!("NOK: supported layouts: {}", SUPPORTED_LAYOUTS.join(", "))
            }
            CoreError::BufferOverflow(_) => "E: keystring buffer full".to_string(),
            CoreError::Storage(_) => "E: storage".to_string(),
            CoreError::InvalidTarget(_)
            | CoreError::UnknownCommand(_)
            | CoreError::MissingParameter(_)
            | CoreError::InvalidParameter { .. }
            | CoreError::MacroTooDeep(_) => "?".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_texts() {
        assert_eq!(CoreError::NotFound("x".into()).reply(), "E: not found");
        assert_eq!(CoreError::StorageFull.reply(), "E: eeprom full");
        assert_eq!(CoreError::InvalidTarget(0).reply(), "?");
        assert!(CoreError::UnsupportedLayout("xx_XX".into())
            .reply()
            .starts_with("NOK: supported layouts: de_DE"));
    }
}
