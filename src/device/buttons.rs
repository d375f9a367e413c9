use super::protocol::NUMBER_OF_BUTTONS;

/// Button labels, indexed by button index (number - 1)
pub const BUTTON_LABELS: [&str; NUMBER_OF_BUTTONS] = [
    "Button 1", // 0 - jack plug 1
    "Button 2", // 1
    "Button 3", // 2
    "Button 4", // 3
    "Button 5", // 4 - jack plug 5
    "Long press 1", // 5
    "Long press 2", // 6
    "Long press 3", // 7
    "Long press 4", // 8
    "Long press 5", // 9
    "Sip", // 10 - pressure sensor
    "Strong sip", // 11
    "Puff", // 12
    "Strong puff", // 13
    "Strong sip + 2", // 14
    "Strong sip + 3", // 15
    "Strong sip + 4", // 16
    "Strong sip + 5", // 17
    "Strong puff + 2", // 18
    "Strong puff + 3", // 19
    "Strong puff + 4", // 20
    "Strong puff + 5", // 21
];

/// Label for a button index, "?" when out of range
pub fn button_label(index: usize) -> &'static str {
    BUTTON_LABELS.get(index).copied().unwrap_or("?")
}
