mod debounce;
mod handler;

pub use debounce::{ButtonEvent, DebounceState, Millis, PressEngine};
pub use handler::InputHandler;
