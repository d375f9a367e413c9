use tracing::debug;

use crate::bindings::ButtonId;
use crate::commands::{ActionCode, Dispatcher, Outcome};
use crate::device::{long_press_button, RawLevels, NUMBER_OF_BUTTONS, NUMBER_OF_PHYSICAL_BUTTONS};

use super::debounce::{ButtonEvent, Millis, PressEngine};

/// Feeds raw samples through the press engine into the dispatcher
pub struct InputHandler {
    dispatcher: Dispatcher,
    engine: PressEngine<NUMBER_OF_BUTTONS>,
    /// Bit i set while button i is pressed, for raw reporting
    button_states: u32,
    reboot_requested: bool,
}

impl InputHandler {
    pub fn new(dispatcher: Dispatcher, debounce_ticks: u8) -> Self {
        Self {
            dispatcher,
            engine: PressEngine::with_threshold(debounce_ticks),
            button_states: 0,
            reboot_requested: false,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn button_states(&self) -> u32 {
        self.button_states
    }

    /// Run one command line
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        self.dispatcher.execute_line(line)
    }

    /// Whether a button press ran `AT RE`; clears the request
    pub fn take_reboot_request(&mut self) -> bool {
        std::mem::take(&mut self.reboot_requested)
    }

    /// Feed one raw sample of a button and act on the resulting edge
    pub fn on_raw_sample(
        &mut self,
        button: ButtonId,
        level: u8,
        now: Millis,
    ) -> Option<ButtonEvent> {
        let was_pressed = self.engine.is_pressed(button);
        let hold_mode = self.dispatcher.table().is_hold_mode(button);
        let event = self.engine.on_raw_sample(button, level, now, hold_mode);
        let pressed = self.engine.is_pressed(button);
        self.set_state(button, pressed);

        match event {
            Some(ButtonEvent::Press(b)) => self.press(b),
            Some(ButtonEvent::Release(b)) => self.dispatcher.handle_release(b),
            None => {}
        }

        if was_pressed && !pressed && self.engine.long_press_fired(button) {
            if let Some(virtual_button) = long_press_button(button) {
                self.release_virtual(virtual_button);
            }
        }
        event
    }

    /// Feed one sample of every physical input, then check long presses
    pub fn sample_all(&mut self, levels: &RawLevels, now: Millis) {
        for (button, &level) in levels.iter().enumerate() {
            self.on_raw_sample(button, level, now);
        }
        self.check_long_press(now);
    }

    /// Fire the long-press button of every physical button held past the
    /// `LP` threshold. Returns true if any fired.
    pub fn check_long_press(&mut self, now: Millis) -> bool {
        let threshold = u64::from(self.dispatcher.settings().lp);
        let mut fired = false;

        for button in 0..NUMBER_OF_PHYSICAL_BUTTONS {
            let Some(virtual_button) = long_press_button(button) else {
                continue;
            };
            if self.dispatcher.table().entry(virtual_button).action == ActionCode::NoCommand {
                continue;
            }
            if self.engine.long_press(button, now, threshold) {
                debug!("Long press on button {}", button + 1);
                self.set_state(virtual_button, true);
                self.press(virtual_button);
                fired = true;
            }
        }
        fired
    }

    /// Continue held mouse movement
    pub fn apply_motion(&mut self) {
        self.dispatcher.apply_motion();
    }

    /// `VALUES:` line while raw reporting is on
    pub fn report_line(&self) -> Option<String> {
        self.dispatcher
            .state()
            .report_raw
            .then(|| format!("VALUES:{}", self.button_states))
    }

    fn press(&mut self, button: ButtonId) {
        if self.dispatcher.handle_press(button) == Outcome::Reboot {
            self.reboot_requested = true;
        }
    }

    fn release_virtual(&mut self, button: ButtonId) {
        self.set_state(button, false);
        if self.dispatcher.table().is_hold_mode(button) {
            self.dispatcher.handle_release(button);
        }
    }

    fn set_state(&mut self, button: ButtonId, pressed: bool) {
        if pressed {
            self.button_states |= 1 << button;
        } else {
            self.button_states &= !(1 << button);
        }
    }
}
