use super::protocol::NUMBER_OF_PHYSICAL_BUTTONS;

/// Raw electrical levels of the physical inputs, 1 = pressed
pub type RawLevels = [u8; NUMBER_OF_PHYSICAL_BUTTONS];

/// Source of raw button samples, read once per sampling tick
pub trait ButtonInputs {
    /// Current raw level of every physical input
    fn sample(&mut self) -> RawLevels;

    /// Human readable name for logging
    fn name(&self) -> &str;
}

/// Input source for hosts without GPIO: every input reads released
#[derive(Debug, Default)]
pub struct IdleInputs;

impl ButtonInputs for IdleInputs {
    fn sample(&mut self) -> RawLevels {
        [0; NUMBER_OF_PHYSICAL_BUTTONS]
    }

    fn name(&self) -> &str {
        "idle"
    }
}
