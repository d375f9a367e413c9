//! FABI device constants
//!
//! Button numbering (1-based, as used by `AT BM <n>`):
//!   - 1-5:   3.5mm jack plugs 1-5 (physical inputs)
//!   - 6-10:  long press of jack plugs 1-5
//!   - 11-14: sip, strong sip, puff, strong puff (pressure sensor addon)
//!   - 15-18: strong sip + jack plug 2-5
//!   - 19-22: strong puff + jack plug 2-5
//!
//! Internally buttons are addressed by 0-based index.

/// Total number of bindable buttons (physical + virtual)
pub const NUMBER_OF_BUTTONS: usize = 22;

/// Number of physical jack-plug inputs sampled by the debouncer
pub const NUMBER_OF_PHYSICAL_BUTTONS: usize = 5;

/// Capacity of the packed keystring arena in bytes
pub const MAX_KEYSTRINGBUFFER_LEN: usize = 500;

/// Maximum length of a single keystring / macro sub-command (incl. terminator)
pub const MAX_KEYSTRING_LEN: usize = 300;

/// Maximum length of a slot or IR command name (incl. terminator)
pub const MAX_NAME_LEN: usize = 15;

/// Number of consecutive equal samples before a level is accepted
pub const DEFAULT_DEBOUNCING_TIME: u8 = 5;

/// Press duration of an emulated mouse click in milliseconds
pub const DEFAULT_CLICK_TIME_MS: u64 = 8;

/// Nesting limit for macros that invoke further macros
pub const MAX_MACRO_DEPTH: usize = 4;

/// Module name reported by `AT ID`
pub const MODULE_NAME: &str = "FABI";

/// Firmware version string reported by `AT ID`
pub const VERSION_STRING: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Convert a physical button index (0-4) to the virtual button that
/// carries its long-press binding (5-9)
#[inline]
pub fn long_press_button(button: usize) -> Option<usize> {
    if button < NUMBER_OF_PHYSICAL_BUTTONS {
        Some(button + NUMBER_OF_PHYSICAL_BUTTONS) // 0-4 → 5-9
    } else {
        None
    }
}

/// Convert a 1-based `AT BM` button number to an index, rejecting 0 and
/// numbers past the last button
#[inline]
pub fn button_index(number: i16) -> Option<usize> {
    if number > 0 && (number as usize) <= NUMBER_OF_BUTTONS {
        Some(number as usize - 1)
    } else {
        None
    }
}
