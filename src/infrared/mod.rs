//! Infrared record/replay collaborator

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Longest valid edge-to-edge time while recording, in microseconds
pub const IR_EDGE_TIMEOUT_US: u32 = 15_000;

/// Name of the code played after every other code, when it exists
pub const IDLE_SEQUENCE_NAME: &str = "idle";

/// IR transceiver as seen by the dispatcher
pub trait Infrared {
    /// Record a code and store it under `name`
    fn record(&mut self, name: &str) -> Result<(), CoreError>;
    /// Play a stored code once
    fn play(&mut self, name: &str) -> Result<(), CoreError>;
    /// Play a stored code repeatedly until [`Infrared::stop`]
    fn hold(&mut self, name: &str) -> Result<(), CoreError>;
    fn stop(&mut self);
    fn list(&self) -> Vec<String>;
    /// Delete a code; "" deletes all
    fn delete(&mut self, name: &str) -> Result<(), CoreError>;
    /// Inter-edge timeout for recording
    fn set_timeout(&mut self, us: u32);
    fn wipe(&mut self);
}

/// Recorded edge timings, in microseconds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrCode {
    pub edges: Vec<u16>,
}

/// Stored codes for hosts without an IR transceiver.
///
/// Recording stores an empty code so the name can be bound and listed;
/// playback only logs.
#[derive(Debug)]
pub struct IrRegistry {
    codes: BTreeMap<String, IrCode>,
    timeout_us: u32,
    holding: Option<String>,
}

impl IrRegistry {
    pub fn new(timeout_us: u32) -> Self {
        Self {
            codes: BTreeMap::new(),
            timeout_us,
            holding: None,
        }
    }

    pub fn timeout_us(&self) -> u32 {
        self.timeout_us
    }

    /// Code currently repeated by `AT IH`
    pub fn holding(&self) -> Option<&str> {
        self.holding.as_deref()
    }

    pub fn insert(&mut self, name: &str, code: IrCode) {
        self.codes.insert(name.to_string(), code);
    }

    fn code(&self, name: &str) -> Result<&IrCode, CoreError> {
        self.codes
            .get(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))
    }
}

impl Default for IrRegistry {
    fn default() -> Self {
        Self::new(IR_EDGE_TIMEOUT_US)
    }
}

impl Infrared for IrRegistry {
    fn record(&mut self, name: &str) -> Result<(), CoreError> {
        warn!("No IR receiver, storing empty code {}", name);
        self.insert(name, IrCode::default());
        Ok(())
    }

    fn play(&mut self, name: &str) -> Result<(), CoreError> {
        let code = self.code(name)?;
        info!("IR play {} ({} edges)", name, code.edges.len());
        if name != IDLE_SEQUENCE_NAME && self.codes.contains_key(IDLE_SEQUENCE_NAME) {
            debug!("IR play {}", IDLE_SEQUENCE_NAME);
        }
        Ok(())
    }

    fn hold(&mut self, name: &str) -> Result<(), CoreError> {
        self.code(name)?;
        info!("IR hold {}", name);
        self.holding = Some(name.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(name) = self.holding.take() {
            info!("IR stop {}", name);
        }
    }

    fn list(&self) -> Vec<String> {
        self.codes.keys().cloned().collect()
    }

    fn delete(&mut self, name: &str) -> Result<(), CoreError> {
        if name.is_empty() {
            self.wipe();
            return Ok(());
        }
        self.codes
            .remove(name)
            .map(|_| info!("Deleted IR code {}", name))
            .ok_or_else(|| CoreError::NotFound(name.to_string()))
    }

    fn set_timeout(&mut self, us: u32) {
        debug!("IR edge timeout {} us", us);
        self.timeout_us = us;
    }

    fn wipe(&mut self) {
        info!("Wiping {} IR codes", self.codes.len());
        self.codes.clear();
        self.holding = None;
    }
}
