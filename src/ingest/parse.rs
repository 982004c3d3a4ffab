use crate::error::{PipelineError, Result};
use crate::ingest::row::Sample;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse a per-server sample file into its samples.
///
/// Expected shape (comma-separated, first line is a header):
/// timestamp,count,...
///
/// Example:
/// time,requests
/// 0.4,10
/// 1.2,5
///
/// The whole file is parsed before anything is returned, so a failure never
/// leaves a partial batch behind.
pub fn parse_sample_file(path: &Path, skip_header: bool) -> Result<Vec<Sample>> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let samples = parse_sample_text(&path.display().to_string(), &text, skip_header)?;
    debug!(file = %path.display(), samples = samples.len(), "parsed sample file");
    Ok(samples)
}

/// Parse sample records from already-loaded text. `source` only labels errors.
pub fn parse_sample_text(source: &str, text: &str, skip_header: bool) -> Result<Vec<Sample>> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;

        // The first line is discarded unconditionally, whatever it holds.
        if skip_header && lineno == 0 {
            continue;
        }

        let mut fields = line.split(',');
        let (ts_field, count_field) = match (fields.next(), fields.next()) {
            (Some(t), Some(c)) => (t.trim(), c.trim()),
            _ => continue,
        };

        let timestamp = parse_timestamp(source, lno, ts_field)?;
        let count = parse_count(source, lno, count_field)?;
        out.push(Sample::new(timestamp, count, lno));
    }

    Ok(out)
}

/// Float seconds floored to whole seconds.
fn parse_timestamp(source: &str, lno: usize, field: &str) -> Result<i64> {
    let raw: f64 = field.parse().map_err(|_| {
        PipelineError::parse(source, lno, format!("bad timestamp {:?}", field))
    })?;
    if !raw.is_finite() {
        return Err(PipelineError::parse(
            source,
            lno,
            format!("timestamp is not finite: {:?}", field),
        ));
    }

    let floored = raw.floor();
    if floored < i64::MIN as f64 || floored >= i64::MAX as f64 {
        return Err(PipelineError::parse(
            source,
            lno,
            format!("timestamp out of range: {:?}", field),
        ));
    }
    Ok(floored as i64)
}

fn parse_count(source: &str, lno: usize, field: &str) -> Result<u64> {
    let raw: i128 = field
        .parse()
        .map_err(|_| PipelineError::parse(source, lno, format!("bad count {:?}", field)))?;

    u64::try_from(raw).map_err(|_| PipelineError::InvalidSample {
        file: source.to_string(),
        line: Some(lno),
        value: field.to_string(),
    })
}

/// Parse a single-column auxiliary file (one integer per line, positional).
pub fn parse_integer_column(path: &Path) -> Result<Vec<u64>> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let values = parse_integer_text(&path.display().to_string(), &text)?;
    debug!(file = %path.display(), values = values.len(), "parsed auxiliary series");
    Ok(values)
}

/// Blank lines are skipped; any other non-integer line is an error.
pub fn parse_integer_text(source: &str, text: &str) -> Result<Vec<u64>> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: u64 = line
            .parse()
            .map_err(|_| PipelineError::parse(source, lno, format!("bad integer {:?}", line)))?;
        out.push(value);
    }

    Ok(out)
}
