use crate::error::{Error, Result};
use crate::synth::params::{DEFAULT_GENERATOR, DEFAULT_SAMPLE_RATE, MOD_WHEEL_MAX};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Startup configuration, optionally read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub sample_rate: u32,
    pub amplitude: f32,
    pub generator: String,
    pub mod_wheel: u8,
    /// Fixed device block size in frames; device default when unset.
    pub buffer_size: Option<u32>,
    /// MIDI input port index; prompt when unset.
    pub midi_port: Option<usize>,
    pub poll_interval_ms: u64,
    pub scope_capacity: usize,
    pub shutdown_timeout_ms: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            amplitude: 1.0,
            generator: DEFAULT_GENERATOR.to_string(),
            mod_wheel: 0,
            buffer_size: None,
            midi_port: None,
            poll_interval_ms: 10,
            scope_capacity: 8,
            shutdown_timeout_ms: 500,
        }
    }
}

impl SynthConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample_rate must be positive".into()));
        }
        if !self.amplitude.is_finite() || self.amplitude <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "amplitude must be a positive number, got {}",
                self.amplitude
            )));
        }
        if self.mod_wheel > MOD_WHEEL_MAX {
            return Err(Error::InvalidConfig(format!(
                "mod_wheel must be within 0..={MOD_WHEEL_MAX}"
            )));
        }
        if self.buffer_size == Some(0) {
            return Err(Error::InvalidConfig("buffer_size must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be positive".into(),
            ));
        }
        if self.scope_capacity == 0 {
            return Err(Error::InvalidConfig("scope_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
