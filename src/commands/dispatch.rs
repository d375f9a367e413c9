//! Command dispatcher
//!
//! Turns a command into its effect on the collaborators, or, in
//! programming mode, into a new button binding. Top-level lines, button
//! presses and macro pieces all run through [`Dispatcher::dispatch`] and
//! report their result the same way.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::{parse_command, parse_line, split_macro, ActionCode, Line};
use crate::bindings::{ButtonId, ButtonTable};
use crate::device::{button_index, MAX_MACRO_DEPTH, MAX_NAME_LEN, MODULE_NAME, VERSION_STRING};
use crate::error::CoreError;
use crate::feedback::{Console, Feedback, Tone};
use crate::hid::{Hid, JoystickAxis, MouseButton};
use crate::infrared::Infrared;
use crate::slots::{Slot, SlotStorage};
use crate::state::{parse_c_integer, DeviceState, SlotSettings};

/// Programming-mode state carried between dispatch calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchContext {
    awaiting_binding: Option<ButtonId>,
}

impl DispatchContext {
    /// Capture the next command into `button`
    pub fn begin_binding(&mut self, button: ButtonId) {
        self.awaiting_binding = Some(button);
    }

    /// Leave programming mode, returning the pending target
    pub fn take_binding(&mut self) -> Option<ButtonId> {
        self.awaiting_binding.take()
    }

    pub fn awaiting_binding(&self) -> Option<ButtonId> {
        self.awaiting_binding
    }
}

/// What a dispatched command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Effect performed, nothing to report
    Done,
    /// Effect performed, acknowledged with `OK`
    Ack,
    /// Command stored as the binding of a button instead of running
    Captured(ButtonId),
    /// Lines to send back
    Reply(Vec<String>),
    /// `AT RE`: the host should restart the core
    Reboot,
}

/// Collaborators the dispatcher drives
pub struct Peripherals {
    pub hid: Box<dyn Hid>,
    pub slots: Box<dyn SlotStorage>,
    pub infrared: Box<dyn Infrared>,
    pub feedback: Box<dyn Feedback>,
    pub console: Box<dyn Console>,
}

/// Executes AT commands against the button table and collaborators
pub struct Dispatcher {
    context: DispatchContext,
    table: ButtonTable,
    settings: SlotSettings,
    default_layout: String,
    state: DeviceState,
    peripherals: Peripherals,
    click_time: Duration,
    macro_depth: usize,
}

impl Dispatcher {
    pub fn new(peripherals: Peripherals, default_layout: &str, click_time: Duration) -> Self {
        Self {
            context: DispatchContext::default(),
            table: ButtonTable::with_defaults(),
            settings: SlotSettings::with_layout(default_layout),
            default_layout: default_layout.to_string(),
            state: DeviceState::default(),
            peripherals,
            click_time,
            macro_depth: 0,
        }
    }

    /// Load the first stored slot, or store the factory configuration
    /// when there is none yet
    pub fn boot(&mut self) -> Result<(), CoreError> {
        match self.peripherals.slots.load("") {
            Ok(slot) => {
                self.settings = slot.apply(&mut self.table)?;
                info!("Loaded slot {}", self.settings.slot_name);
            }
            Err(CoreError::NotFound(_)) => {
                info!("No stored slots, saving defaults");
                self.settings = SlotSettings::with_layout(&self.default_layout);
                self.table.reset_defaults();
                self.peripherals
                    .slots
                    .save(Slot::capture(&self.settings, &self.table))?;
            }
            Err(e) => return Err(e),
        }
        self.apply_slot_settings();
        Ok(())
    }

    pub fn table(&self) -> &ButtonTable {
        &self.table
    }

    pub fn settings(&self) -> &SlotSettings {
        &self.settings
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    /// Bind a button directly, bypassing programming mode
    pub fn bind(
        &mut self,
        button: ButtonId,
        action: ActionCode,
        value: i16,
        keystring: &str,
    ) -> Result<usize, CoreError> {
        self.table.bind(button, action, value, keystring)
    }

    /// Send a line over the reply channel
    pub fn write_line(&mut self, line: &str) {
        self.peripherals.console.write_line(line);
    }

    /// Run one input line and report its result
    pub fn execute_line(&mut self, line: &str) -> Outcome {
        let result = parse_line(line).and_then(|parsed| match parsed {
            Line::Empty => Ok(Outcome::Done),
            Line::Ack => Ok(Outcome::Ack),
            Line::Command(cmd) => self.dispatch(cmd.action, cmd.value, &cmd.keystring, false),
        });
        self.report(result)
    }

    /// Run a command body (no `AT` prefix), as macros do
    pub fn execute_body(&mut self, body: &str) -> Outcome {
        // Empty pieces do nothing, not even end programming mode
        if body.trim().is_empty() {
            return Outcome::Done;
        }
        let result = parse_command(body)
            .and_then(|cmd| self.dispatch(cmd.action, cmd.value, &cmd.keystring, false));
        self.report(result)
    }

    /// Run the binding of a pressed button
    pub fn handle_press(&mut self, button: ButtonId) -> Outcome {
        let entry = *self.table.entry(button);
        let keystring = self.table.keystring(button).to_owned();
        debug!("Button {} press: {} {}", button + 1, entry.action, entry.value);
        let result = self.dispatch(entry.action, entry.value, &keystring, true);
        self.report(result)
    }

    /// Stop the held effect of a released button
    pub fn handle_release(&mut self, button: ButtonId) {
        let entry = *self.table.entry(button);
        debug!("Button {} release: {}", button + 1, entry.action);

        use ActionCode::*;
        match entry.action {
            PressLeft | HoldLeft => self.peripherals.hid.mouse_release(MouseButton::Left),
            PressRight | HoldRight => self.peripherals.hid.mouse_release(MouseButton::Right),
            PressMiddle | HoldMiddle => self.peripherals.hid.mouse_release(MouseButton::Middle),
            JoystickPress => self.peripherals.hid.joystick_button(entry.value, false),
            KeyHold => {
                let keystring = self.table.keystring(button).to_owned();
                self.peripherals.hid.release_keys(&keystring);
            }
            IrHold => self.peripherals.infrared.stop(),
            MoveX => self.stop_motion(true, false),
            MoveY => self.stop_motion(false, true),
            _ => {}
        }
    }

    /// Continue held mouse movement, once per motion tick
    pub fn apply_motion(&mut self) {
        if let Some((dx, dy)) = self.state.mouse_motion {
            self.peripherals.hid.mouse_move(dx, dy);
        }
    }

    /// Release every held key, mouse button, joystick button and IR
    /// code. Safe to call when nothing is held.
    pub fn release_all(&mut self) {
        self.peripherals.hid.release_all();
        self.peripherals.infrared.stop();
        self.state.mouse_motion = None;
    }

    /// Execute one command.
    ///
    /// `continuous` is set when the command comes from a held button;
    /// `MX`/`MY` then keep moving until the button is released.
    pub fn dispatch(
        &mut self,
        action: ActionCode,
        value: i16,
        keystring: &str,
        continuous: bool,
    ) -> Result<Outcome, CoreError> {
        if let Some(button) = self.context.take_binding() {
            self.table.bind(button, action, value, keystring)?;
            return Ok(Outcome::Captured(button));
        }

        use ActionCode::*;
        let outcome = match action {
            Id => Outcome::Reply(vec![format!("{} {}", MODULE_NAME, VERSION_STRING)]),
            BindMode => {
                self.release_all();
                let button = button_index(value).ok_or(CoreError::InvalidTarget(value))?;
                info!("Programming mode for button {}", button + 1);
                self.context.begin_binding(button);
                Outcome::Done
            }

            ClickLeft => self.click(MouseButton::Left),
            ClickRight => self.click(MouseButton::Right),
            ClickMiddle => self.click(MouseButton::Middle),
            ClickDouble => {
                self.click(MouseButton::Left);
                std::thread::sleep(self.click_time);
                self.click(MouseButton::Left)
            }
            PressLeft | HoldLeft => self.hid(|hid| hid.mouse_press(MouseButton::Left)),
            PressRight | HoldRight => self.hid(|hid| hid.mouse_press(MouseButton::Right)),
            PressMiddle | HoldMiddle => self.hid(|hid| hid.mouse_press(MouseButton::Middle)),
            ReleaseLeft => self.hid(|hid| hid.mouse_release(MouseButton::Left)),
            ReleaseRight => self.hid(|hid| hid.mouse_release(MouseButton::Right)),
            ReleaseMiddle => self.hid(|hid| hid.mouse_release(MouseButton::Middle)),
            ToggleLeft => self.hid(|hid| hid.mouse_toggle(MouseButton::Left)),
            ToggleRight => self.hid(|hid| hid.mouse_toggle(MouseButton::Right)),
            ToggleMiddle => self.hid(|hid| hid.mouse_toggle(MouseButton::Middle)),
            WheelUp => {
                let step = self.settings.ws;
                self.hid(|hid| hid.mouse_scroll(step.saturating_neg()))
            }
            WheelDown => {
                let step = self.settings.ws;
                self.hid(|hid| hid.mouse_scroll(step))
            }
            WheelStep => {
                unsigned::<u16>(action, value)?;
                self.settings.ws = value;
                Outcome::Done
            }
            MoveX => self.move_mouse(value, 0, continuous),
            MoveY => self.move_mouse(0, value, continuous),

            JoystickX => self.hid(|hid| hid.joystick_axis(JoystickAxis::X, value)),
            JoystickY => self.hid(|hid| hid.joystick_axis(JoystickAxis::Y, value)),
            JoystickZ => self.hid(|hid| hid.joystick_axis(JoystickAxis::Z, value)),
            JoystickTurn => self.hid(|hid| hid.joystick_axis(JoystickAxis::ZRotate, value)),
            JoystickSlider => self.hid(|hid| hid.joystick_axis(JoystickAxis::Slider, value)),
            JoystickPress => self.hid(|hid| hid.joystick_button(value, true)),
            JoystickRelease => self.hid(|hid| hid.joystick_button(value, false)),
            JoystickHat => self.hid(|hid| hid.joystick_hat(value)),

            KeyWrite => self.hid(|hid| hid.keyboard_print(keystring)),
            KeyPress => self.hid(|hid| hid.press_keys(keystring)),
            KeyHold => self.hid(|hid| hid.hold_keys(keystring)),
            KeyToggle => self.hid(|hid| hid.toggle_keys(keystring)),
            KeyRelease => self.hid(|hid| hid.release_keys(keystring)),
            ReleaseAll => {
                self.release_all();
                Outcome::Done
            }
            KeyboardLayout => self.keyboard_layout(keystring)?,
            LongPressTime => {
                self.settings.lp = unsigned(action, value)?;
                Outcome::Done
            }
            DoublePressTime => {
                self.settings.dp = unsigned(action, value)?;
                Outcome::Done
            }

            SaveSlot => self.save_slot(keystring)?,
            LoadSlot => {
                self.release_all();
                self.load_slot(keystring)?;
                Outcome::Ack
            }
            LoadAll => {
                self.release_all();
                let lines = self
                    .peripherals
                    .slots
                    .slots()
                    .iter()
                    .flat_map(Slot::describe)
                    .collect();
                Outcome::Reply(lines)
            }
            ListSlots => {
                self.release_all();
                let mut lines: Vec<String> = self
                    .peripherals
                    .slots
                    .list()
                    .iter()
                    .enumerate()
                    .map(|(i, name)| format!("Slot{}:{}", i + 1, name))
                    .collect();
                lines.push("OK".to_string());
                Outcome::Reply(lines)
            }
            NextSlot => {
                self.release_all();
                self.load_slot("")?;
                Outcome::Done
            }
            DeleteSlot => {
                self.release_all();
                self.peripherals.slots.delete(keystring)?;
                Outcome::Ack
            }
            ResetSettings => self.factory_reset()?,
            Reboot => {
                info!("Reboot requested");
                Outcome::Reboot
            }
            NoCommand => Outcome::Done,

            Bluetooth => {
                self.settings.bt = unsigned(action, value)?;
                self.peripherals.feedback.display_update(&self.settings);
                Outcome::Done
            }
            SlotColor => {
                self.settings.sc = parse_c_integer(keystring) as u32;
                debug!("Slot colour 0x{:06X}", self.settings.sc);
                Outcome::Done
            }
            StartReporting => {
                self.state.report_raw = true;
                Outcome::Done
            }
            EndReporting => {
                self.state.report_raw = false;
                Outcome::Done
            }
            Calibrate => {
                info!("Start calibration");
                self.peripherals.feedback.blink(10, 20);
                self.state.calibration_pending = true;
                self.peripherals.feedback.tone(Tone::Calibrate);
                Outcome::Done
            }

            Macro => self.run_macro(keystring)?,
            Wait => {
                std::thread::sleep(Duration::from_millis(unsigned(action, value)?));
                Outcome::Done
            }

            SipThreshold => {
                self.settings.ts = unsigned(action, value)?;
                Outcome::Done
            }
            PuffThreshold => {
                self.settings.tp = unsigned(action, value)?;
                Outcome::Done
            }
            StrongPuffThreshold => {
                self.settings.sp = unsigned(action, value)?;
                Outcome::Done
            }
            StrongSipThreshold => {
                self.settings.ss = unsigned(action, value)?;
                Outcome::Done
            }

            IrRecord => {
                check_name(IrRecord, keystring, MAX_NAME_LEN - 2)?;
                self.peripherals.infrared.record(keystring)?;
                Outcome::Done
            }
            IrPlay => {
                self.peripherals.infrared.play(keystring)?;
                Outcome::Done
            }
            IrHold => {
                check_name(IrHold, keystring, MAX_NAME_LEN - 1)?;
                self.peripherals.infrared.hold(keystring)?;
                Outcome::Done
            }
            IrStop => {
                self.peripherals.infrared.stop();
                Outcome::Done
            }
            IrClear => {
                self.peripherals.infrared.delete(keystring)?;
                Outcome::Ack
            }
            IrWipe => {
                self.peripherals.infrared.wipe();
                Outcome::Ack
            }
            IrList => {
                let mut lines: Vec<String> = self
                    .peripherals
                    .infrared
                    .list()
                    .iter()
                    .enumerate()
                    .map(|(i, name)| format!("IR-Command{}:{}", i, name))
                    .collect();
                lines.push("OK".to_string());
                Outcome::Reply(lines)
            }
            IrTimeout => {
                self.peripherals.infrared.set_timeout(unsigned(action, value)?);
                Outcome::Done
            }
        };
        Ok(outcome)
    }

    /// Send the result of a command over the reply channel
    fn report(&mut self, result: Result<Outcome, CoreError>) -> Outcome {
        match result {
            Ok(Outcome::Ack) => {
                self.write_line("OK");
                Outcome::Ack
            }
            Ok(Outcome::Reply(lines)) => {
                for line in &lines {
                    self.write_line(line);
                }
                Outcome::Reply(lines)
            }
            Ok(Outcome::Captured(button)) => {
                info!(
                    "Button {} bound to {} {:?}",
                    button + 1,
                    self.table.entry(button).action,
                    self.table.keystring(button)
                );
                Outcome::Captured(button)
            }
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Command failed: {}", e);
                let reply = e.reply();
                self.write_line(&reply);
                Outcome::Done
            }
        }
    }

    fn hid(&mut self, effect: impl FnOnce(&mut dyn Hid)) -> Outcome {
        effect(self.peripherals.hid.as_mut());
        Outcome::Done
    }

    fn click(&mut self, button: MouseButton) -> Outcome {
        self.peripherals.hid.mouse_press(button);
        std::thread::sleep(self.click_time);
        self.peripherals.hid.mouse_release(button);
        Outcome::Done
    }

    fn move_mouse(&mut self, dx: i16, dy: i16, continuous: bool) -> Outcome {
        self.peripherals.hid.mouse_move(dx, dy);
        if continuous {
            let (x, y) = self.state.mouse_motion.unwrap_or((0, 0));
            let motion = (if dx != 0 { dx } else { x }, if dy != 0 { dy } else { y });
            self.state.mouse_motion = Some(motion);
        }
        Outcome::Done
    }

    fn stop_motion(&mut self, x: bool, y: bool) {
        if let Some((dx, dy)) = self.state.mouse_motion {
            let motion = (if x { 0 } else { dx }, if y { 0 } else { dy });
            self.state.mouse_motion = (motion != (0, 0)).then_some(motion);
        }
    }

    fn keyboard_layout(&mut self, keystring: &str) -> Result<Outcome, CoreError> {
        let code: String = keystring.chars().take(5).collect();
        if code.chars().count() < 5 {
            return Ok(Outcome::Reply(vec![format!(
                "Keyboard layout: {}",
                self.settings.kbd_layout
            )]));
        }

        if self.peripherals.hid.set_keyboard_layout(&code) {
            self.settings.kbd_layout = code;
            Ok(Outcome::Done)
        } else {
            Err(CoreError::UnsupportedLayout(code))
        }
    }

    fn save_slot(&mut self, name: &str) -> Result<Outcome, CoreError> {
        self.release_all();
        let checked = check_name(ActionCode::SaveSlot, name, MAX_NAME_LEN - 2);
        let result = checked.and_then(|()| {
            self.settings.slot_name = name.to_string();
            self.peripherals
                .slots
                .save(Slot::capture(&self.settings, &self.table))
        });
        self.peripherals.feedback.tone(Tone::IndicatePuff);
        result.map(|()| Outcome::Ack)
    }

    /// Load a slot by name ("" = next) into the live configuration
    fn load_slot(&mut self, name: &str) -> Result<(), CoreError> {
        let result = self
            .peripherals
            .slots
            .load(name)
            .and_then(|slot| slot.apply(&mut self.table));
        if let Ok(settings) = &result {
            self.settings = settings.clone();
            info!("Slot {} active", self.settings.slot_name);
            self.peripherals.feedback.tone(Tone::ChangeSlot);
        }
        self.apply_slot_settings();
        result.map(|_| ())
    }

    fn apply_slot_settings(&mut self) {
        self.peripherals.feedback.display_update(&self.settings);
        if !self
            .peripherals
            .hid
            .set_keyboard_layout(&self.settings.kbd_layout)
        {
            warn!("Slot uses unsupported layout {}", self.settings.kbd_layout);
        }
    }

    fn factory_reset(&mut self) -> Result<Outcome, CoreError> {
        info!("Factory reset");
        self.release_all();
        self.context = DispatchContext::default();
        self.peripherals.slots.delete("")?;
        self.settings = SlotSettings::with_layout(&self.default_layout);
        self.table.reset_defaults();
        self.peripherals
            .slots
            .save(Slot::capture(&self.settings, &self.table))?;
        self.load_slot("")?;
        Ok(Outcome::Ack)
    }

    fn run_macro(&mut self, text: &str) -> Result<Outcome, CoreError> {
        if self.macro_depth >= MAX_MACRO_DEPTH {
            return Err(CoreError::MacroTooDeep(MAX_MACRO_DEPTH));
        }
        debug!("Execute macro: {}", text);

        self.macro_depth += 1;
        let mut outcome = Outcome::Done;
        for piece in split_macro(text) {
            if self.execute_body(&piece) == Outcome::Reboot {
                outcome = Outcome::Reboot;
                break;
            }
        }
        self.macro_depth -= 1;
        Ok(outcome)
    }
}

/// Unsigned parameter of `action`; negative or too large values are
/// rejected, never wrapped
fn unsigned<T: TryFrom<i16>>(action: ActionCode, value: i16) -> Result<T, CoreError> {
    T::try_from(value).map_err(|_| CoreError::InvalidParameter {
        command: action.code(),
        value: value.to_string(),
    })
}

/// Slot and IR names must be non-empty and shorter than `limit`
fn check_name(action: ActionCode, name: &str, limit: usize) -> Result<(), CoreError> {
    if name.is_empty() || name.len() >= limit {
        return Err(CoreError::InvalidParameter {
            command: action.code(),
            value: name.to_string(),
        });
    }
    Ok(())
}
