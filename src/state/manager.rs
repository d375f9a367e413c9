use serde::{Deserialize, Serialize};

/// HID routing selected with `AT BT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidRouting {
    UsbOnly,
    BluetoothOnly,
    Both,
}

/// Device settings stored with every slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    /// Slot name
    pub slot_name: String,
    /// Mouse wheel step size
    pub ws: i16,
    /// Long press threshold in ms (0 disables long press)
    pub lp: u16,
    /// Double press threshold in ms
    pub dp: u16,
    /// Sip threshold (0-512)
    pub ts: u16,
    /// Puff threshold (512-1023)
    pub tp: u16,
    /// Strong puff threshold (512-1023)
    pub sp: u16,
    /// Strong sip threshold (0-512)
    pub ss: u16,
    /// Slot colour 0xRRGGBB
    pub sc: u32,
    /// HID routing: 1 = USB, 2 = Bluetooth, 3 = both
    pub bt: u8,
    /// Keyboard layout code, e.g. "en_US"
    pub kbd_layout: String,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            slot_name: "keys".to_string(),
            ws: 3,
            lp: 1000,
            dp: 0,
            ts: 400,
            tp: 600,
            sp: 800,
            ss: 200,
            sc: 0x0000FF,
            bt: 3,
            kbd_layout: "en_US".to_string(),
        }
    }
}

impl SlotSettings {
    /// Defaults with a different initial keyboard layout
    pub fn with_layout(layout: &str) -> Self {
        Self {
            kbd_layout: layout.to_string(),
            ..Self::default()
        }
    }

    /// Decode the `bt` field, unknown values route to both
    pub fn routing(&self) -> HidRouting {
        match self.bt {
            1 => HidRouting::UsbOnly,
            2 => HidRouting::BluetoothOnly,
            _ => HidRouting::Both,
        }
    }

    /// One-line summary, as printed by `AT LA`
    pub fn summary(&self) -> String {
        format!(
            "WS {} LP {} DP {} TS {} TP {} SP {} SS {} SC 0x{:06X} BT {} KL {}",
            self.ws,
            self.lp,
            self.dp,
            self.ts,
            self.tp,
            self.sp,
            self.ss,
            self.sc,
            self.bt,
            self.kbd_layout
        )
    }
}

/// Runtime state that is not part of a slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// `AT SR` active: report raw values periodically
    pub report_raw: bool,
    /// Calibration requested with `AT CA`, consumed by the sensor loop
    pub calibration_pending: bool,
    /// Continuous mouse movement per motion tick, while a MX/MY button is held
    pub mouse_motion: Option<(i16, i16)>,
}

/// Parse an integer like C `strtol(s, NULL, 0)`: optional sign, `0x` hex,
/// leading-zero octal or decimal; stops at the first invalid digit and
/// yields 0 when nothing parses.
pub fn parse_c_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if s.starts_with('0') {
        (8, s)
    } else {
        (10, s)
    };

    let value = digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(0i64, |acc, d| acc.saturating_mul(radix as i64).saturating_add(d as i64));

    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_c_integer() {
        assert_eq!(parse_c_integer("0xFF00AA"), 0xFF00AA);
        assert_eq!(parse_c_integer("0X10"), 16);
        assert_eq!(parse_c_integer("255"), 255);
        assert_eq!(parse_c_integer("010"), 8);
        assert_eq!(parse_c_integer("  -12abc"), -12);
        assert_eq!(parse_c_integer("zzz"), 0);
        assert_eq!(parse_c_integer(""), 0);
    }

    #[test]
    fn test_routing() {
        let mut settings = SlotSettings::default();
        assert_eq!(settings.routing(), HidRouting::Both);
        settings.bt = 1;
        assert_eq!(settings.routing(), HidRouting::UsbOnly);
        settings.bt = 2;
        assert_eq!(settings.routing(), HidRouting::BluetoothOnly);
    }

    #[test]
    fn test_settings_toml_defaults_fill_missing_fields() {
        let settings: SlotSettings = toml::from_str("ws = 5\nslot_name = \"mouse\"").unwrap();
        assert_eq!(settings.ws, 5);
        assert_eq!(settings.slot_name, "mouse");
        assert_eq!(settings.lp, 1000);
    }
}
