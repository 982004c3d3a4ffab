//! Report model: turn derived series into chart descriptions for rendering.
//!
//! Each chart is a list of `(x, y, color, label)` traces. Renderers consume
//! these and nothing else.

use crate::derive::DerivedSeries;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TraceView {
    pub label: String,
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartView {
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Legend corner, or None when the chart has a single unlabeled trace.
    pub legend: Option<LegendPosition>,
    pub traces: Vec<TraceView>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    UpperLeft,
    UpperRight,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub charts: Vec<ChartView>,
    pub totals: TotalsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub sources: usize,
    pub seconds: usize,
    pub window: usize,
    /// Wider than a single bucket so the sum cannot overflow.
    pub total_requests: u128,
    pub peak_requests: u64,
    pub peak_load: f64,
    pub capacity: f64,
}

const BLUE: &str = "#1f77b4";
const RED: &str = "#d62728";

fn time_axis(ts: &[i64]) -> Vec<f64> {
    ts.iter().map(|&t| t as f64).collect()
}

fn counts_axis(values: &[u64]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

fn trace(label: &str, color: &str, x: Vec<f64>, y: Vec<f64>) -> TraceView {
    TraceView {
        label: label.to_string(),
        color: color.to_string(),
        x,
        y,
    }
}

fn chart(
    id: &str,
    y_label: &str,
    legend: Option<LegendPosition>,
    traces: Vec<TraceView>,
) -> ChartView {
    ChartView {
        id: id.to_string(),
        title: String::new(),
        x_label: "Time (s)".to_string(),
        y_label: y_label.to_string(),
        legend,
        traces,
    }
}

/// Build chart views for every series that could be derived.
///
/// Charts that need an auxiliary input that was not supplied are left out.
pub fn build_report_data(derived: &DerivedSeries, sources: usize, capacity: f64) -> ReportData {
    let full_x = time_axis(&derived.timestamps);
    let window_x = time_axis(derived.window_timestamps());

    let mut charts = vec![
        chart(
            "requests",
            "Requests per second",
            None,
            vec![trace("requests", RED, full_x.clone(), counts_axis(&derived.requests))],
        ),
        chart(
            "load",
            "Load",
            None,
            vec![trace("load", BLUE, full_x, derived.load.clone())],
        ),
    ];

    if let Some(servers) = &derived.servers {
        charts.push(chart(
            "live_servers",
            "live servers",
            Some(LegendPosition::UpperLeft),
            vec![
                trace("with load balancer", BLUE, window_x.clone(), counts_axis(&servers.live)),
                trace("without load balancer", RED, window_x.clone(), counts_axis(&servers.active)),
            ],
        ));
    }

    if let Some(transitions) = &derived.transitions {
        charts.push(chart(
            "transitions",
            "server transitions",
            Some(LegendPosition::UpperRight),
            vec![
                trace(
                    "server transitions",
                    BLUE,
                    window_x.clone(),
                    counts_axis(&transitions.transitions),
                ),
                trace(
                    "allowed server transitions",
                    RED,
                    window_x.clone(),
                    counts_axis(&transitions.allowed),
                ),
            ],
        ));
    }

    match &derived.power {
        Some(power) => charts.push(chart(
            "power",
            "Power consumption",
            Some(LegendPosition::UpperLeft),
            vec![
                trace("with ELB", BLUE, window_x.clone(), power.balanced.clone()),
                trace("without ELB", RED, window_x, power.baseline.clone()),
            ],
        )),
        None if !derived.power_baseline.is_empty() => charts.push(chart(
            "power",
            "Power consumption",
            Some(LegendPosition::UpperLeft),
            vec![trace("without ELB", RED, window_x, derived.power_baseline.clone())],
        )),
        None => {}
    }

    let peak_load = derived.load.iter().copied().fold(0.0f64, f64::max);

    ReportData {
        charts,
        totals: TotalsView {
            sources,
            seconds: derived.timestamps.len(),
            window: derived.window,
            total_requests: derived.requests.iter().map(|&c| c as u128).sum(),
            peak_requests: derived.requests.iter().copied().max().unwrap_or(0),
            peak_load,
            capacity,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregatedSeries;
    use crate::config::DisplaySettings;
    use crate::derive::{AuxiliaryInputs, Capacity, PowerModel};
    use pretty_assertions::assert_eq;

    fn derived(aux: AuxiliaryInputs) -> DerivedSeries {
        let mut series = AggregatedSeries::new();
        series.add(0, 10).unwrap();
        series.add(1, 15).unwrap();
        series.add(2, 5).unwrap();
        let display = DisplaySettings {
            window: Some(2),
            active_servers: 32,
            baseline_power_servers: 17,
            allowed_transitions: 10,
        };
        DerivedSeries::compute(
            &series,
            &aux,
            Capacity::new(1.0, 10.0, 1).unwrap(),
            &PowerModel::new(63.0, 92.0).unwrap(),
            &display,
        )
        .unwrap()
    }

    fn ids(data: &ReportData) -> Vec<&str> {
        data.charts.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn all_charts_when_aux_inputs_present() {
        let data = build_report_data(
            &derived(AuxiliaryInputs {
                live_servers: Some(vec![2, 3]),
                transitions: Some(vec![1, 0, 4]),
            }),
            2,
            10.0,
        );
        assert_eq!(
            ids(&data),
            vec!["requests", "load", "live_servers", "transitions", "power"]
        );

        let requests = &data.charts[0].traces[0];
        assert_eq!(requests.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(requests.y, vec![10.0, 15.0, 5.0]);

        let live = &data.charts[2];
        assert_eq!(live.legend, Some(LegendPosition::UpperLeft));
        assert_eq!(live.traces[0].x, vec![0.0, 1.0]);
        assert_eq!(live.traces[1].y, vec![32.0, 32.0]);

        let transitions = &data.charts[3];
        assert_eq!(transitions.traces[0].y, vec![1.0, 0.0]);
        assert_eq!(transitions.traces[1].label, "allowed server transitions");

        assert_eq!(data.totals.total_requests, 30);
        assert_eq!(data.totals.peak_requests, 15);
        assert_eq!(data.totals.peak_load, 1.5);
        assert_eq!(data.totals.window, 2);
    }

    #[test]
    fn only_baseline_power_without_live_servers() {
        let data = build_report_data(&derived(AuxiliaryInputs::default()), 1, 10.0);
        assert_eq!(ids(&data), vec!["requests", "load", "power"]);
        let power = &data.charts[2];
        assert_eq!(power.traces.len(), 1);
        assert_eq!(power.traces[0].label, "without ELB");
    }

    #[test]
    fn total_requests_does_not_overflow_a_bucket() {
        let mut series = AggregatedSeries::new();
        series.add(0, u64::MAX).unwrap();
        series.add(1, 1).unwrap();
        let display = DisplaySettings {
            window: None,
            active_servers: 32,
            baseline_power_servers: 17,
            allowed_transitions: 10,
        };
        let derived = DerivedSeries::compute(
            &series,
            &AuxiliaryInputs::default(),
            Capacity::new(0.75, 20000.0, 32).unwrap(),
            &PowerModel::new(63.0, 92.0).unwrap(),
            &display,
        )
        .unwrap();

        let data = build_report_data(&derived, 1, 480000.0);
        assert_eq!(data.totals.total_requests, u64::MAX as u128 + 1);
        assert_eq!(data.totals.total_requests, series.total());
        assert_eq!(data.totals.peak_requests, u64::MAX);
    }
}
