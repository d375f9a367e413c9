mod manager;

pub use manager::{parse_c_integer, DeviceState, HidRouting, SlotSettings};
