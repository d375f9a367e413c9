//! User feedback (display, LEDs, buzzer) and the reply channel

use std::io::Write;
use tracing::{debug, info, warn};

use crate::state::SlotSettings;

/// Buzzer tones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Slot saved
    IndicatePuff,
    /// Calibration started
    Calibrate,
    /// Slot changed
    ChangeSlot,
}

/// Display, LED and tone output
pub trait Feedback {
    /// Redraw the slot indication after settings changed
    fn display_update(&mut self, settings: &SlotSettings);
    fn tone(&mut self, tone: Tone);
    /// Blink the status LED `count` times, `period_ms` per half cycle
    fn blink(&mut self, count: u8, period_ms: u16);
}

/// Feedback that only logs
#[derive(Debug, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn display_update(&mut self, settings: &SlotSettings) {
        info!(
            "Slot {} (colour 0x{:06X}, routing {:?})",
            settings.slot_name,
            settings.sc,
            settings.routing()
        );
    }

    fn tone(&mut self, tone: Tone) {
        debug!("Tone {:?}", tone);
    }

    fn blink(&mut self, count: u8, period_ms: u16) {
        debug!("Blink {} x {} ms", count, period_ms);
    }
}

/// Line-oriented reply channel
pub trait Console {
    fn write_line(&mut self, line: &str);
}

/// Replies on stdout
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_line(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to write reply: {}", e);
        }
    }
}
