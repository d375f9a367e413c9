use tracing::debug;

use crate::bindings::ButtonId;
use crate::device::DEFAULT_DEBOUNCING_TIME;

/// Milliseconds on a monotonic clock
pub type Millis = u64;

/// Debounced edge of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press(ButtonId),
    Release(ButtonId),
}

/// Per-button debouncer state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceState {
    /// Last raw level seen
    pub bounce_level: u8,
    /// Consecutive samples at `bounce_level`, saturating at the threshold
    pub bounce_count: u8,
    /// Accepted level
    pub stable_level: u8,
    /// When the current press was accepted
    pub press_timestamp: Millis,
    pub long_press_fired: bool,
}

/// Debounce, press/release and long-press detection for `N` buttons
#[derive(Debug, Clone)]
pub struct PressEngine<const N: usize> {
    states: [DebounceState; N],
    threshold: u8,
}

impl<const N: usize> PressEngine<N> {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_DEBOUNCING_TIME)
    }

    /// Engine accepting a level after `threshold` equal samples
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            states: [DebounceState::default(); N],
            threshold: threshold.max(1),
        }
    }

    /// Feed one raw sample (0 or 1).
    ///
    /// Returns `Press` when a pressed level becomes stable and `Release`
    /// when a released level becomes stable for a hold-mode binding.
    /// Releases of one-shot bindings are silent.
    pub fn on_raw_sample(
        &mut self,
        button: ButtonId,
        level: u8,
        now: Millis,
        hold_mode: bool,
    ) -> Option<ButtonEvent> {
        let threshold = self.threshold;
        let state = &mut self.states[button];
        let level = u8::from(level != 0);

        if state.bounce_level != level {
            state.bounce_level = level;
            state.bounce_count = 0;
            return None;
        }

        if state.bounce_count >= threshold {
            return None;
        }
        state.bounce_count += 1;
        if state.bounce_count < threshold || state.stable_level == level {
            return None;
        }

        state.stable_level = level;
        if level == 1 {
            state.press_timestamp = now;
            state.long_press_fired = false;
            debug!("Button {} pressed", button + 1);
            Some(ButtonEvent::Press(button))
        } else {
            debug!("Button {} released", button + 1);
            hold_mode.then_some(ButtonEvent::Release(button))
        }
    }

    /// Whether the button is stably pressed
    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.states[button].stable_level == 1
    }

    /// True once per press when the button has been held for
    /// `threshold_ms`. A threshold of 0 disables long press.
    pub fn long_press(&mut self, button: ButtonId, now: Millis, threshold_ms: u64) -> bool {
        let state = &mut self.states[button];
        if threshold_ms == 0 || state.stable_level != 1 || state.long_press_fired {
            return false;
        }
        if now.saturating_sub(state.press_timestamp) >= threshold_ms {
            state.long_press_fired = true;
            return true;
        }
        false
    }

    /// Whether the long press already fired for the current or last press
    pub fn long_press_fired(&self, button: ButtonId) -> bool {
        self.states[button].long_press_fired
    }

    pub fn state(&self, button: ButtonId) -> &DebounceState {
        &self.states[button]
    }
}

impl<const N: usize> Default for PressEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}
