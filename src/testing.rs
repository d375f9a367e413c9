//! Recording fakes of the collaborator traits

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::commands::{Dispatcher, Peripherals};
use crate::error::{CoreError, SUPPORTED_LAYOUTS};
use crate::feedback::{Console, Feedback, Tone};
use crate::hid::{Hid, JoystickAxis, MouseButton};
use crate::infrared::{Infrared, IrRegistry};
use crate::slots::FileSlotStore;
use crate::state::SlotSettings;

type Shared<T> = Rc<RefCell<Vec<T>>>;

/// Shared view of everything the fakes recorded
#[derive(Clone, Default)]
pub(crate) struct Rig {
    events: Shared<String>,
    replies: Shared<String>,
    tones: Shared<Tone>,
}

impl Rig {
    /// HID and IR calls, e.g. `mouse_press Left`, `ir_stop tv`
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Lines written to the console
    pub fn replies(&self) -> Vec<String> {
        self.replies.borrow().clone()
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.tones.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.replies.borrow_mut().clear();
        self.tones.borrow_mut().clear();
    }
}

pub(crate) struct RecordingHid(Shared<String>);

impl RecordingHid {
    fn log(&self, event: String) {
        self.0.borrow_mut().push(event);
    }
}

impl Hid for RecordingHid {
    fn mouse_press(&mut self, button: MouseButton) {
        self.log(format!("mouse_press {:?}", button));
    }
    fn mouse_release(&mut self, button: MouseButton) {
        self.log(format!("mouse_release {:?}", button));
    }
    fn mouse_toggle(&mut self, button: MouseButton) {
        self.log(format!("mouse_toggle {:?}", button));
    }
    fn mouse_move(&mut self, dx: i16, dy: i16) {
        self.log(format!("mouse_move {} {}", dx, dy));
    }
    fn mouse_scroll(&mut self, amount: i16) {
        self.log(format!("mouse_scroll {}", amount));
    }
    fn joystick_axis(&mut self, axis: JoystickAxis, value: i16) {
        self.log(format!("joystick_axis {:?} {}", axis, value));
    }
    fn joystick_button(&mut self, button: i16, pressed: bool) {
        self.log(format!("joystick_button {} {}", button, pressed));
    }
    fn joystick_hat(&mut self, angle: i16) {
        self.log(format!("joystick_hat {}", angle));
    }
    fn keyboard_print(&mut self, text: &str) {
        self.log(format!("keyboard_print {}", text));
    }
    fn press_keys(&mut self, keystring: &str) {
        self.log(format!("press_keys {}", keystring));
    }
    fn hold_keys(&mut self, keystring: &str) {
        self.log(format!("hold_keys {}", keystring));
    }
    fn toggle_keys(&mut self, keystring: &str) {
        self.log(format!("toggle_keys {}", keystring));
    }
    fn release_keys(&mut self, keystring: &str) {
        self.log(format!("release_keys {}", keystring));
    }
    fn release_all(&mut self) {
        self.log("release_all".to_string());
    }
    fn set_keyboard_layout(&mut self, code: &str) -> bool {
        SUPPORTED_LAYOUTS.contains(&code)
    }
}

/// IR registry that also logs playback and stops of a held code
pub(crate) struct RecordingInfrared {
    registry: IrRegistry,
    log: Shared<String>,
}

impl Infrared for RecordingInfrared {
    fn record(&mut self, name: &str) -> Result<(), CoreError> {
        self.registry.record(name)
    }
    fn play(&mut self, name: &str) -> Result<(), CoreError> {
        self.registry.play(name)?;
        self.log.borrow_mut().push(format!("ir_play {}", name));
        Ok(())
    }
    fn hold(&mut self, name: &str) -> Result<(), CoreError> {
        self.registry.hold(name)?;
        self.log.borrow_mut().push(format!("ir_hold {}", name));
        Ok(())
    }
    fn stop(&mut self) {
        // only a stop that ends a held code is an effect
        if let Some(name) = self.registry.holding().map(str::to_string) {
            self.log.borrow_mut().push(format!("ir_stop {}", name));
        }
        self.registry.stop();
    }
    fn list(&self) -> Vec<String> {
        self.registry.list()
    }
    fn delete(&mut self, name: &str) -> Result<(), CoreError> {
        self.registry.delete(name)
    }
    fn set_timeout(&mut self, us: u32) {
        self.registry.set_timeout(us);
    }
    fn wipe(&mut self) {
        self.registry.wipe();
    }
}

pub(crate) struct RecordingFeedback(Shared<Tone>);

impl Feedback for RecordingFeedback {
    fn display_update(&mut self, _settings: &SlotSettings) {}

    fn tone(&mut self, tone: Tone) {
        self.0.borrow_mut().push(tone);
    }

    fn blink(&mut self, _count: u8, _period_ms: u16) {}
}

pub(crate) struct RecordingConsole(Shared<String>);

impl Console for RecordingConsole {
    fn write_line(&mut self, line: &str) {
        self.0.borrow_mut().push(line.to_string());
    }
}

/// Dispatcher over recording fakes: in-memory slots (3 max), no click
/// delay, `en_US` layout
pub(crate) fn dispatcher() -> (Dispatcher, Rig) {
    let rig = Rig::default();
    let peripherals = Peripherals {
        hid: Box::new(RecordingHid(rig.events.clone())),
        slots: Box::new(FileSlotStore::in_memory(3)),
        infrared: Box::new(RecordingInfrared {
            registry: IrRegistry::default(),
            log: rig.events.clone(),
        }),
        feedback: Box::new(RecordingFeedback(rig.tones.clone())),
        console: Box::new(RecordingConsole(rig.replies.clone())),
    };
    (Dispatcher::new(peripherals, "en_US", Duration::ZERO), rig)
}
