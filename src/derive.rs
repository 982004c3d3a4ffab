//! Derived series: load, power and the fixed-window views that pair the
//! aggregated series with the positional auxiliary files.
//!
//! Auxiliary files are aligned by line order, not by timestamp. That pairing
//! is only ever done through [`window`], which refuses to read past the end
//! of either side.

use crate::aggregate::AggregatedSeries;
use crate::config::DisplaySettings;
use crate::error::{PipelineError, Result};
use tracing::{debug, warn};

/// Throughput ceiling used to turn counts into a load ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacity(f64);

impl Capacity {
    /// `utilization_fraction * peak_throughput_per_server * server_count`.
    pub fn new(
        utilization_fraction: f64,
        peak_throughput_per_server: f64,
        server_count: u64,
    ) -> Result<Capacity> {
        let value = utilization_fraction * peak_throughput_per_server * server_count as f64;
        if !value.is_finite() || value <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "capacity must be positive (got {} = {} * {} * {})",
                value, utilization_fraction, peak_throughput_per_server, server_count
            )));
        }
        Ok(Capacity(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn load(&self, count: u64) -> f64 {
        count as f64 / self.0
    }
}

/// Linear power model between idle and peak draw of a single server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    pub idle_watts: f64,
    pub peak_watts: f64,
}

impl PowerModel {
    pub fn new(idle_watts: f64, peak_watts: f64) -> Result<PowerModel> {
        if !idle_watts.is_finite() || !peak_watts.is_finite() || idle_watts < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "power model watts must be finite and non-negative (idle {}, peak {})",
                idle_watts, peak_watts
            )));
        }
        if peak_watts < idle_watts {
            return Err(PipelineError::Configuration(format!(
                "peak_watts {} is below idle_watts {}",
                peak_watts, idle_watts
            )));
        }
        Ok(PowerModel {
            idle_watts,
            peak_watts,
        })
    }

    /// `(idle + (peak - idle) * load) * servers`
    pub fn power(&self, load: f64, servers: u64) -> f64 {
        (self.idle_watts + (self.peak_watts - self.idle_watts) * load) * servers as f64
    }
}

/// Load ratio for every second, in ascending timestamp order.
pub fn load_series(series: &AggregatedSeries, capacity: Capacity) -> Vec<f64> {
    series.counts().into_iter().map(|c| capacity.load(c)).collect()
}

/// Power draw with a per-second server count. `servers` must cover `loads`.
pub fn power_series(loads: &[f64], servers: &[u64], model: &PowerModel) -> Result<Vec<f64>> {
    let servers = window(servers, loads.len(), "live_servers")?;
    Ok(loads
        .iter()
        .zip(servers)
        .map(|(&load, &n)| model.power(load, n))
        .collect())
}

/// Power draw for a fleet that never scales.
pub fn baseline_power_series(loads: &[f64], servers: u64, model: &PowerModel) -> Vec<f64> {
    loads.iter().map(|&load| model.power(load, servers)).collect()
}

/// The first `len` values of `series`. Never wraps or pads.
pub fn window<'a, T>(series: &'a [T], len: usize, name: &str) -> Result<&'a [T]> {
    series.get(..len).ok_or_else(|| PipelineError::Alignment {
        series: name.to_string(),
        required: len,
        available: series.len(),
    })
}

/// Reference line of `len` copies of `value`.
pub fn constant_series(value: u64, len: usize) -> Vec<u64> {
    vec![value; len]
}

/// Positional per-second inputs read from single-column files.
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryInputs {
    pub live_servers: Option<Vec<u64>>,
    pub transitions: Option<Vec<u64>>,
}

/// Live servers under load balancing next to the fixed fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerComparison {
    pub live: Vec<u64>,
    pub active: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionComparison {
    pub transitions: Vec<u64>,
    pub allowed: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerComparison {
    pub balanced: Vec<f64>,
    pub baseline: Vec<f64>,
}

/// Every series a report needs, computed from a finished aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    /// Full sorted time axis.
    pub timestamps: Vec<i64>,
    pub requests: Vec<u64>,
    pub load: Vec<f64>,

    /// Common prefix length of the comparison series below.
    pub window: usize,
    pub servers: Option<ServerComparison>,
    pub transitions: Option<TransitionComparison>,
    /// Without live server counts only the baseline can be computed.
    pub power_baseline: Vec<f64>,
    pub power: Option<PowerComparison>,
}

impl DerivedSeries {
    /// Build all derived series over the display window.
    ///
    /// Takes the aggregation by reference once it is complete; nothing here
    /// mutates it.
    pub fn compute(
        series: &AggregatedSeries,
        aux: &AuxiliaryInputs,
        capacity: Capacity,
        model: &PowerModel,
        display: &DisplaySettings,
    ) -> Result<DerivedSeries> {
        let timestamps = series.timestamps();
        let requests = series.counts();
        let load = load_series(series, capacity);

        let len = display.window.unwrap_or(timestamps.len());
        let window_load = window(&load, len, "requests")?;

        let live = aux
            .live_servers
            .as_deref()
            .map(|v| aligned(v, len, "live_servers"))
            .transpose()?;
        let transitions = aux
            .transitions
            .as_deref()
            .map(|v| aligned(v, len, "transitions"))
            .transpose()?;

        let power_baseline =
            baseline_power_series(window_load, display.baseline_power_servers, model);
        let power = match &live {
            Some(live) => Some(PowerComparison {
                balanced: power_series(window_load, live, model)?,
                baseline: power_baseline.clone(),
            }),
            None => None,
        };

        debug!(seconds = timestamps.len(), window = len, "derived series");

        Ok(DerivedSeries {
            servers: live.map(|live| ServerComparison {
                live,
                active: constant_series(display.active_servers, len),
            }),
            transitions: transitions.map(|transitions| TransitionComparison {
                transitions,
                allowed: constant_series(display.allowed_transitions, len),
            }),
            timestamps,
            requests,
            load,
            window: len,
            power_baseline,
            power,
        })
    }

    /// Time axis for the windowed comparison series.
    pub fn window_timestamps(&self) -> &[i64] {
        &self.timestamps[..self.window]
    }
}

fn aligned(values: &[u64], len: usize, name: &str) -> Result<Vec<u64>> {
    let out = window(values, len, name)?.to_vec();
    if values.len() > len {
        warn!(
            series = name,
            ignored = values.len() - len,
            "auxiliary series is longer than the display window"
        );
    }
    Ok(out)
}
