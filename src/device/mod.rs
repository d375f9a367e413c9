mod buttons;
mod inputs;
mod protocol;

pub use buttons::*;
pub use inputs::{ButtonInputs, IdleInputs, RawLevels};
pub use protocol::*;
