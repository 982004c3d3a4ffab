use crate::aggregate::AggregatedSeries;
use crate::error::{PipelineError, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// One count per line in ascending timestamp order. Timestamps are not
/// written; position in the file stands for them.
pub fn render_counts_csv(series: &AggregatedSeries) -> String {
    let mut out = String::new();
    for (_, count) in series.sorted() {
        let _ = writeln!(out, "{}", count);
    }
    out
}

pub fn write_counts_csv(series: &AggregatedSeries, path: &Path) -> Result<()> {
    fs::write(path, render_counts_csv(series)).map_err(|e| PipelineError::io(path, e))
}
