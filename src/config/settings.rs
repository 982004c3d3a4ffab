//! Run settings (TOML), every field defaulting to the reference deployment.
//!
//! TOML shape:
//! [ingest]
//! skip_header = true
//! pattern = '\.csv$'
//!
//! [capacity]
//! utilization_fraction = 0.75
//! peak_throughput_per_server = 20000.0
//! server_count = 32
//!
//! [power]
//! idle_watts = 63.0
//! peak_watts = 92.0
//! baseline_servers = 17
//!
//! [display]
//! window = 34
//! allowed_transitions = 10
//!
//! We validate the numbers once and hand out immutable derived values.

use crate::derive::{Capacity, PowerModel};
use crate::error::{PipelineError, Result};
use crate::ingest::discover::DEFAULT_PATTERN;

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub ingest: RawIngest,
    pub capacity: RawCapacity,
    pub power: RawPower,
    pub display: RawDisplay,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawIngest {
    pub skip_header: bool,
    pub pattern: String,
}

impl Default for RawIngest {
    fn default() -> Self {
        Self {
            skip_header: true,
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawCapacity {
    pub utilization_fraction: f64,
    pub peak_throughput_per_server: f64,
    pub server_count: u64,
}

impl Default for RawCapacity {
    fn default() -> Self {
        Self {
            utilization_fraction: 0.75,
            peak_throughput_per_server: 20000.0,
            server_count: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawPower {
    pub idle_watts: f64,
    pub peak_watts: f64,
    /// Fixed fleet size for the "without load balancing" power series.
    pub baseline_servers: u64,
}

impl Default for RawPower {
    fn default() -> Self {
        Self {
            idle_watts: 63.0,
            peak_watts: 92.0,
            baseline_servers: 17,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawDisplay {
    /// Prefix length shared by every chart; None means the full series.
    pub window: Option<usize>,
    pub allowed_transitions: u64,
}

impl Default for RawDisplay {
    fn default() -> Self {
        Self {
            window: None,
            allowed_transitions: 10,
        }
    }
}

/// Chart window and reference lines.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub window: Option<usize>,
    /// Fleet size drawn as the "without load balancer" live-server line.
    pub active_servers: u64,
    pub baseline_power_servers: u64,
    pub allowed_transitions: u64,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub skip_header: bool,
    pub pattern: String,
    pub capacity: Capacity,
    pub power: PowerModel,
    pub display: DisplaySettings,
}

impl RawConfig {
    pub fn from_toml(text: &str) -> Result<RawConfig> {
        toml::from_str(text).map_err(|e| PipelineError::Configuration(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<RawConfig> {
        let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Reject degenerate constants up front, then derive the capacity scalar.
    pub fn validate_and_build(&self) -> Result<ValidatedConfig> {
        let pattern = self.ingest.pattern.trim();
        if pattern.is_empty() {
            return Err(PipelineError::Configuration(
                "ingest.pattern cannot be empty".to_string(),
            ));
        }

        let capacity = Capacity::new(
            self.capacity.utilization_fraction,
            self.capacity.peak_throughput_per_server,
            self.capacity.server_count,
        )?;
        let power = PowerModel::new(self.power.idle_watts, self.power.peak_watts)?;

        if self.display.window == Some(0) {
            return Err(PipelineError::Configuration(
                "display.window must be at least 1".to_string(),
            ));
        }

        Ok(ValidatedConfig {
            skip_header: self.ingest.skip_header,
            pattern: pattern.to_string(),
            capacity,
            power,
            display: DisplaySettings {
                window: self.display.window,
                active_servers: self.capacity.server_count,
                baseline_power_servers: self.power.baseline_servers,
                allowed_transitions: self.display.allowed_transitions,
            },
        })
    }
}
