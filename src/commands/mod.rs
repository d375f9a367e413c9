//! AT command set
//!
//! Every AT command is identified by a two-letter code (`AT CL`, `AT KP`
//! ...) and declares the shape of its parameter. [`ActionCode`] is the
//! closed set of commands; it is also what a button is bound to.

mod dispatch;
mod macros;
mod parser;

pub use dispatch::{DispatchContext, Dispatcher, Outcome, Peripherals};
pub use macros::{split_macro, MacroSplit};
pub use parser::{parse_command, parse_line, Command, Line};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Shape of the parameter an AT command takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    None,
    /// Unsigned number
    Uint,
    /// Signed number
    Int,
    /// Rest of the line
    String,
}

/// Action an AT command performs (and a button can be bound to)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ActionCode {
    // === Housekeeping ===
    Id,
    BindMode,

    // === Mouse ===
    ClickLeft,
    ClickRight,
    ClickMiddle,
    ClickDouble,
    PressLeft,
    PressRight,
    PressMiddle,
    HoldLeft,
    HoldRight,
    HoldMiddle,
    ReleaseLeft,
    ReleaseRight,
    ReleaseMiddle,
    ToggleLeft,
    ToggleRight,
    ToggleMiddle,
    WheelUp,
    WheelDown,
    WheelStep,
    MoveX,
    MoveY,

    // === Joystick ===
    JoystickX,
    JoystickY,
    JoystickZ,
    JoystickTurn,
    JoystickSlider,
    JoystickPress,
    JoystickRelease,
    JoystickHat,

    // === Keyboard ===
    KeyWrite,
    KeyPress,
    KeyHold,
    KeyToggle,
    KeyRelease,
    ReleaseAll,
    KeyboardLayout,
    LongPressTime,
    DoublePressTime,

    // === Slots ===
    SaveSlot,
    LoadSlot,
    LoadAll,
    ListSlots,
    NextSlot,
    DeleteSlot,
    ResetSettings,
    Reboot,

    // === Slot settings & reporting ===
    NoCommand,
    Bluetooth,
    SlotColor,
    StartReporting,
    EndReporting,
    Calibrate,

    // === Macros ===
    Macro,
    Wait,

    // === Sip & puff ===
    SipThreshold,
    PuffThreshold,
    StrongPuffThreshold,
    StrongSipThreshold,

    // === Infrared ===
    IrRecord,
    IrPlay,
    IrHold,
    IrStop,
    IrClear,
    IrWipe,
    IrList,
    IrTimeout,
}

impl ActionCode {
    /// All commands in protocol table order
    pub const ALL: [ActionCode; 68] = [
        ActionCode::Id,
        ActionCode::BindMode,
        ActionCode::ClickLeft,
        ActionCode::ClickRight,
        ActionCode::ClickMiddle,
        ActionCode::ClickDouble,
        ActionCode::PressLeft,
        ActionCode::PressRight,
        ActionCode::PressMiddle,
        ActionCode::HoldLeft,
        ActionCode::HoldRight,
        ActionCode::HoldMiddle,
        ActionCode::ReleaseLeft,
        ActionCode::ReleaseRight,
        ActionCode::ReleaseMiddle,
        ActionCode::ToggleLeft,
        ActionCode::ToggleRight,
        ActionCode::ToggleMiddle,
        ActionCode::WheelUp,
        ActionCode::WheelDown,
        ActionCode::WheelStep,
        ActionCode::MoveX,
        ActionCode::MoveY,
        ActionCode::JoystickX,
        ActionCode::JoystickY,
        ActionCode::JoystickZ,
        ActionCode::JoystickTurn,
        ActionCode::JoystickSlider,
        ActionCode::JoystickPress,
        ActionCode::JoystickRelease,
        ActionCode::JoystickHat,
        ActionCode::KeyWrite,
        ActionCode::KeyPress,
        ActionCode::KeyHold,
        ActionCode::KeyToggle,
        ActionCode::KeyRelease,
        ActionCode::ReleaseAll,
        ActionCode::KeyboardLayout,
        ActionCode::LongPressTime,
        ActionCode::DoublePressTime,
        ActionCode::SaveSlot,
        ActionCode::LoadSlot,
        ActionCode::LoadAll,
        ActionCode::ListSlots,
        ActionCode::NextSlot,
        ActionCode::DeleteSlot,
        ActionCode::ResetSettings,
        ActionCode::Reboot,
        ActionCode::NoCommand,
        ActionCode::Bluetooth,
        ActionCode::SlotColor,
        ActionCode::StartReporting,
        ActionCode::EndReporting,
        ActionCode::Calibrate,
        ActionCode::Macro,
        ActionCode::Wait,
        ActionCode::SipThreshold,
        ActionCode::PuffThreshold,
        ActionCode::StrongPuffThreshold,
        ActionCode::StrongSipThreshold,
        ActionCode::IrRecord,
        ActionCode::IrPlay,
        ActionCode::IrHold,
        ActionCode::IrStop,
        ActionCode::IrClear,
        ActionCode::IrWipe,
        ActionCode::IrList,
        ActionCode::IrTimeout,
    ];

    /// Two-letter protocol code
    pub fn code(self) -> &'static str {
        use ActionCode::*;
        match self {
            Id => "ID",
            BindMode => "BM",
            ClickLeft => "CL",
            ClickRight => "CR",
            ClickMiddle => "CM",
            ClickDouble => "CD",
            PressLeft => "PL",
            PressRight => "PR",
            PressMiddle => "PM",
            HoldLeft => "HL",
            HoldRight => "HR",
            HoldMiddle => "HM",
            ReleaseLeft => "RL",
            ReleaseRight => "RR",
            ReleaseMiddle => "RM",
            ToggleLeft => "TL",
            ToggleRight => "TR",
            ToggleMiddle => "TM",
            WheelUp => "WU",
            WheelDown => "WD",
            WheelStep => "WS",
            MoveX => "MX",
            MoveY => "MY",
            JoystickX => "JX",
            JoystickY => "JY",
            JoystickZ => "JZ",
            JoystickTurn => "JT",
            JoystickSlider => "JS",
            JoystickPress => "JP",
            JoystickRelease => "JR",
            JoystickHat => "JH",
            KeyWrite => "KW",
            KeyPress => "KP",
            KeyHold => "KH",
            KeyToggle => "KT",
            KeyRelease => "KR",
            ReleaseAll => "RA",
            KeyboardLayout => "KL",
            LongPressTime => "LP",
            DoublePressTime => "DP",
            SaveSlot => "SA",
            LoadSlot => "LO",
            LoadAll => "LA",
            ListSlots => "LI",
            NextSlot => "NE",
            DeleteSlot => "DE",
            ResetSettings => "RS",
            Reboot => "RE",
            NoCommand => "NC",
            Bluetooth => "BT",
            SlotColor => "SC",
            StartReporting => "SR",
            EndReporting => "ER",
            Calibrate => "CA",
            Macro => "MA",
            Wait => "WA",
            SipThreshold => "TS",
            PuffThreshold => "TP",
            StrongPuffThreshold => "SP",
            StrongSipThreshold => "SS",
            IrRecord => "IR",
            IrPlay => "IP",
            IrHold => "IH",
            IrStop => "IS",
            IrClear => "IC",
            IrWipe => "IW",
            IrList => "IL",
            IrTimeout => "IT",
        }
    }

    /// Parameter shape the parser enforces for this command
    pub fn param_type(self) -> ParamType {
        use ActionCode::*;
        match self {
            BindMode | WheelStep | LongPressTime | DoublePressTime | Bluetooth | Wait
            | SipThreshold | PuffThreshold | StrongPuffThreshold | StrongSipThreshold
            | IrTimeout => ParamType::Uint,

            MoveX | MoveY | JoystickX | JoystickY | JoystickZ | JoystickTurn | JoystickSlider
            | JoystickPress | JoystickRelease | JoystickHat => ParamType::Int,

            KeyWrite | KeyPress | KeyHold | KeyToggle | KeyRelease | KeyboardLayout | SaveSlot
            | LoadSlot | DeleteSlot | SlotColor | Macro | IrRecord | IrPlay | IrHold
            | IrClear => ParamType::String,

            Id | ClickLeft | ClickRight | ClickMiddle | ClickDouble | PressLeft | PressRight
            | PressMiddle | HoldLeft | HoldRight | HoldMiddle | ReleaseLeft | ReleaseRight
            | ReleaseMiddle | ToggleLeft | ToggleRight | ToggleMiddle | WheelUp | WheelDown
            | ReleaseAll | LoadAll | ListSlots | NextSlot | ResetSettings | Reboot
            | NoCommand | StartReporting | EndReporting | Calibrate | IrStop | IrWipe
            | IrList => ParamType::None,
        }
    }

    /// Actions whose effect lasts until the button is released
    pub fn is_hold_mode(self) -> bool {
        use ActionCode::*;
        matches!(
            self,
            PressLeft
                | PressRight
                | PressMiddle
                | HoldLeft
                | HoldRight
                | HoldMiddle
                | JoystickPress
                | MoveX
                | MoveY
                | KeyHold
                | IrHold
        )
    }

    /// Look up a command by its two-letter code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ActionCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| CoreError::UnknownCommand(s.to_string()))
    }
}

impl From<ActionCode> for String {
    fn from(action: ActionCode) -> Self {
        action.code().to_string()
    }
}

impl TryFrom<String> for ActionCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_and_resolve() {
        let codes: HashSet<_> = ActionCode::ALL.iter().map(|a| a.code()).collect();
        assert_eq!(codes.len(), ActionCode::ALL.len());

        for action in ActionCode::ALL {
            assert_eq!(ActionCode::from_code(action.code()), Some(action));
        }
    }

    #[test]
    fn test_from_code_case_insensitive() {
        assert_eq!(ActionCode::from_code("kp"), Some(ActionCode::KeyPress));
        assert_eq!(ActionCode::from_code("Ma"), Some(ActionCode::Macro));
        assert_eq!(ActionCode::from_code("XX"), None);
        assert!("ZZ".parse::<ActionCode>().is_err());
    }

    #[test]
    fn test_hold_mode_classification() {
        let hold: Vec<_> = ActionCode::ALL
            .iter()
            .filter(|a| a.is_hold_mode())
            .map(|a| a.code())
            .collect();
        assert_eq!(
            hold,
            ["PL", "PR", "PM", "HL", "HR", "HM", "MX", "MY", "JP", "KH", "IH"]
        );
        assert!(!ActionCode::ClickLeft.is_hold_mode());
        assert!(!ActionCode::KeyToggle.is_hold_mode());
        assert!(!ActionCode::ToggleLeft.is_hold_mode());
    }

    #[test]
    fn test_param_types() {
        assert_eq!(ActionCode::BindMode.param_type(), ParamType::Uint);
        assert_eq!(ActionCode::MoveX.param_type(), ParamType::Int);
        assert_eq!(ActionCode::Macro.param_type(), ParamType::String);
        assert_eq!(ActionCode::ClickLeft.param_type(), ParamType::None);
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&ActionCode::KeyHold).unwrap();
        assert_eq!(json, "\"KH\"");
        let back: ActionCode = serde_json::from_str("\"kh\"").unwrap();
        assert_eq!(back, ActionCode::KeyHold);
    }
}
