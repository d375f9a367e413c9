pub mod bindings;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod feedback;
pub mod hid;
pub mod infrared;
pub mod input;
pub mod slots;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, Lines};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use commands::{Dispatcher, Outcome, Peripherals};
use config::Config;
use device::{ButtonInputs, IdleInputs};
use feedback::{StdoutConsole, TracingFeedback};
use hid::{Emitter, Hid, LogBackend};
use infrared::IrRegistry;
use input::InputHandler;
use slots::FileSlotStore;

/// Why [`App::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `AT RE`: start over with a fresh core
    Reboot,
    /// Command input closed
    Eof,
}

/// Main application struct
pub struct App {
    config: Config,
    input: InputHandler,
    inputs: Box<dyn ButtonInputs>,
    started: Instant,
}

impl App {
    /// Create a new application instance and load the first slot
    pub fn new(config: Config) -> Result<Self> {
        let slot_path = config.storage.slot_path()?;
        let slots = FileSlotStore::open(&slot_path, config.storage.max_slots)?;

        let peripherals = Peripherals {
            hid: connect_hid(),
            slots: Box::new(slots),
            infrared: Box::new(IrRegistry::new(config.infrared.timeout_us)),
            feedback: Box::new(TracingFeedback),
            console: Box::new(StdoutConsole),
        };

        let mut dispatcher = Dispatcher::new(
            peripherals,
            &config.keyboard.default_layout,
            Duration::from_millis(config.device.click_time_ms),
        );
        if let Err(e) = dispatcher.boot() {
            warn!("Failed to load initial slot: {}", e);
        }

        let input = InputHandler::new(dispatcher, config.device.debounce_ticks);

        Ok(Self {
            config,
            input,
            inputs: Box::new(IdleInputs),
            started: Instant::now(),
        })
    }

    /// Replace the raw sample source
    pub fn with_inputs(mut self, inputs: Box<dyn ButtonInputs>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn input(&self) -> &InputHandler {
        &self.input
    }

    /// Run command lines one after another, stopping at a reboot
    pub fn run_commands<S: AsRef<str>>(&mut self, lines: &[S]) -> Outcome {
        for line in lines {
            if self.input.handle_line(line.as_ref()) == Outcome::Reboot {
                return Outcome::Reboot;
            }
        }
        Outcome::Done
    }

    /// Run the main loop: sample buttons, read command lines and emit
    /// periodic movement and reports.
    ///
    /// `lines` outlives the app so input buffered behind `AT RE` reaches
    /// the next one.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, lines: &mut Lines<R>) -> Result<Exit> {
        info!(
            "{} running, inputs: {}",
            self.config.device.name,
            self.inputs.name()
        );

        let device = &self.config.device;
        let mut sample_tick =
            tokio::time::interval(Duration::from_millis(device.tick_interval_ms.max(1)));
        sample_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut report_tick =
            tokio::time::interval(Duration::from_millis(device.report_interval_ms.max(1)));
        report_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if self.input.handle_line(&line) == Outcome::Reboot {
                                return Ok(Exit::Reboot);
                            }
                        }
                        None => {
                            info!("Command input closed");
                            return Ok(Exit::Eof);
                        }
                    }
                }
                _ = sample_tick.tick() => {
                    let levels = self.inputs.sample();
                    let now = self.started.elapsed().as_millis() as u64;
                    self.input.sample_all(&levels, now);
                    if self.input.take_reboot_request() {
                        return Ok(Exit::Reboot);
                    }
                }
                _ = report_tick.tick() => {
                    self.input.apply_motion();
                    self.finish_calibration();
                    if let Some(report) = self.input.report_line() {
                        self.input.dispatcher_mut().write_line(&report);
                    }
                }
            }
        }
    }

    fn finish_calibration(&mut self) {
        let state = self.input.dispatcher_mut().state_mut();
        if state.calibration_pending {
            state.calibration_pending = false;
            info!("Calibration done (no analog sensors attached)");
        }
    }

    /// Release everything that is still held
    pub fn shutdown(&mut self) {
        info!("Shutting down {}...", self.config.device.name);
        self.input.dispatcher_mut().release_all();
        info!("Shutdown complete");
    }
}

#[cfg(feature = "desktop-hid")]
fn connect_hid() -> Box<dyn Hid> {
    match hid::EnigoBackend::new() {
        Ok(backend) => Box::new(Emitter::new(backend)),
        Err(e) => {
            warn!("Desktop input injection unavailable: {}", e);
            Box::new(Emitter::new(LogBackend))
        }
    }
}

#[cfg(not(feature = "desktop-hid"))]
fn connect_hid() -> Box<dyn Hid> {
    Box::new(Emitter::new(LogBackend))
}
