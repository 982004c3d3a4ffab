//! Time-bucket aggregation: fold samples from every source into one
//! per-second series of summed counts.

use crate::error::{PipelineError, Result};
use crate::ingest::{self, Sample};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Summed counts keyed by whole-second timestamp.
///
/// Iteration is always in ascending timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedSeries {
    buckets: BTreeMap<i64, u64>,
}

impl AggregatedSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// `self[timestamp] += count`. None if the bucket would overflow, in which
    /// case the bucket is left as it was.
    pub fn add(&mut self, timestamp: i64, count: u64) -> Option<()> {
        let slot = self.buckets.entry(timestamp).or_insert(0);
        *slot = slot.checked_add(count)?;
        Some(())
    }

    /// Fold one fully parsed file into the series.
    ///
    /// The file is summed on its own first and then merged, so an error
    /// leaves the series exactly as it was.
    pub fn merge_samples(&mut self, source: &str, samples: &[Sample]) -> Result<()> {
        let mut part = AggregatedSeries::new();
        for s in samples {
            part.add(s.timestamp, s.count)
                .ok_or_else(|| overflow(source, Some(s.line), s.timestamp, s.count))?;
        }
        self.merge(source, &part)
    }

    /// Add every bucket of `other` into `self`. Associative and commutative.
    ///
    /// All buckets are checked before any is written. `source` labels errors.
    pub fn merge(&mut self, source: &str, other: &AggregatedSeries) -> Result<()> {
        for (&t, &c) in &other.buckets {
            let current = self.buckets.get(&t).copied().unwrap_or(0);
            if current.checked_add(c).is_none() {
                return Err(overflow(source, None, t, c));
            }
        }
        for (&t, &c) in &other.buckets {
            *self.buckets.entry(t).or_insert(0) += c;
        }
        Ok(())
    }

    /// Build a series from per-source batches of samples.
    pub fn from_batches<'a, I>(batches: I) -> Result<AggregatedSeries>
    where
        I: IntoIterator<Item = (&'a str, &'a [Sample])>,
    {
        let mut series = AggregatedSeries::new();
        for (source, samples) in batches {
            series.merge_samples(source, samples)?;
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// `(timestamp, count)` pairs in ascending timestamp order.
    pub fn sorted(&self) -> Vec<(i64, u64)> {
        self.buckets.iter().map(|(&t, &c)| (t, c)).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.buckets.keys().copied().collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.buckets.values().copied().collect()
    }

    pub fn total(&self) -> u128 {
        self.buckets.values().map(|&c| c as u128).sum()
    }

    pub fn peak(&self) -> Option<(i64, u64)> {
        self.buckets
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(&t, &c)| (t, c))
    }
}

fn overflow(source: &str, line: Option<usize>, timestamp: i64, count: u64) -> PipelineError {
    PipelineError::InvalidSample {
        file: source.to_string(),
        line,
        value: format!("{} (bucket {} overflows)", count, timestamp),
    }
}

/// Ingest every source file and aggregate the samples.
///
/// Every file is parsed in full before any of them touches the series; the
/// first failure aborts the run.
pub fn aggregate_sources(paths: &[PathBuf], skip_header: bool) -> Result<AggregatedSeries> {
    let batches = paths
        .iter()
        .map(|path| -> Result<(String, Vec<Sample>)> {
            let samples = ingest::parse_sample_file(path, skip_header)?;
            Ok((path.display().to_string(), samples))
        })
        .collect::<Result<Vec<_>>>()?;

    let series = AggregatedSeries::from_batches(
        batches
            .iter()
            .map(|(source, samples)| (source.as_str(), samples.as_slice())),
    )?;

    let samples: usize = batches.iter().map(|(_, s)| s.len()).sum();
    if series.is_empty() {
        warn!(sources = paths.len(), "no samples found; the series is empty");
    }
    let (peak_at, peak) = series.peak().unwrap_or((0, 0));
    info!(
        sources = paths.len(),
        samples,
        seconds = series.len(),
        total = %series.total(),
        peak,
        peak_at,
        "aggregated samples"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse::parse_sample_text;
    use pretty_assertions::assert_eq;
    use std::fs;

    const FILE1: &str = "time,requests\n0.4,10\n1.2,5\n";
    const FILE2: &str = "time,requests\n0.9,3\n1.1,7\n";

    fn parsed(name: &str, text: &str) -> Vec<Sample> {
        parse_sample_text(name, text, true).unwrap()
    }

    #[test]
    fn two_files_merge_shared_seconds() {
        let a = parsed("f1.csv", FILE1);
        let b = parsed("f2.csv", FILE2);
        let series =
            AggregatedSeries::from_batches([("f1.csv", a.as_slice()), ("f2.csv", b.as_slice())])
                .unwrap();
        assert_eq!(series.sorted(), vec![(0, 10), (1, 15)]);
    }

    #[test]
    fn file_order_does_not_matter() {
        let a = parsed("a", "h\n0.1,1\n5.0,2\n9.9,3\n");
        let b = parsed("b", "h\n5.5,10\n6.0,4\n");
        let c = parsed("c", "h\n9.0,7\n0.0,1\n0.2,1\n");
        let batches = [("a", a.as_slice()), ("b", b.as_slice()), ("c", c.as_slice())];

        let forward = AggregatedSeries::from_batches(batches).unwrap();
        let mut reversed = batches;
        reversed.reverse();
        let backward = AggregatedSeries::from_batches(reversed).unwrap();
        let rotated =
            AggregatedSeries::from_batches([batches[1], batches[2], batches[0]]).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(forward.sorted(), vec![(0, 3), (5, 12), (6, 4), (9, 10)]);
    }

    #[test]
    fn merging_partial_series_is_additive() {
        let a = AggregatedSeries::from_batches([("a", parsed("a", FILE1).as_slice())]).unwrap();
        let b = AggregatedSeries::from_batches([("b", parsed("b", FILE2).as_slice())]).unwrap();
        let mut ab = a.clone();
        ab.merge("b", &b).unwrap();
        let mut ba = b.clone();
        ba.merge("a", &a).unwrap();
        assert_eq!(ab, ba);

        let (a, b): (BTreeMap<_, _>, BTreeMap<_, _>) =
            (a.sorted().into_iter().collect(), b.sorted().into_iter().collect());
        for (t, sum) in ab.sorted() {
            assert_eq!(
                sum,
                a.get(&t).copied().unwrap_or(0) + b.get(&t).copied().unwrap_or(0)
            );
        }
    }

    #[test]
    fn duplicates_within_one_file_are_summed() {
        let s = parsed("a", "h\n3.1,1\n3.5,2\n3.9,3\n");
        let series = AggregatedSeries::from_batches([("a", s.as_slice())]).unwrap();
        assert_eq!(series.sorted(), vec![(3, 6)]);
    }

    #[test]
    fn empty_input_is_an_empty_series() {
        let series = AggregatedSeries::from_batches(std::iter::empty::<(&str, &[Sample])>()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.peak(), None);
        assert_eq!(aggregate_sources(&[], true).unwrap(), AggregatedSeries::new());
    }

    #[test]
    fn overflow_leaves_series_untouched() {
        let mut series = AggregatedSeries::new();
        series.add(0, u64::MAX - 1).unwrap();
        let before = series.clone();

        let batch = [Sample::new(1, 5, 2), Sample::new(0, 2, 3)];
        let err = series.merge_samples("x.csv", &batch).unwrap_err();
        match err {
            PipelineError::InvalidSample { file, .. } => assert_eq!(file, "x.csv"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(series, before);

        let mut other = AggregatedSeries::new();
        other.add(0, u64::MAX).unwrap();
        assert_eq!(other.add(0, 1), None);
        assert_eq!(other.sorted(), vec![(0, u64::MAX)]);
    }

    #[test]
    fn bucket_overflow_on_merge_names_no_line() {
        let mut full = AggregatedSeries::new();
        full.add(4, u64::MAX).unwrap();

        let mut series = AggregatedSeries::new();
        series.merge("y.csv", &full).unwrap();
        let err = series.merge("y.csv", &full).unwrap_err();

        assert!(matches!(err, PipelineError::InvalidSample { line: None, .. }));
        assert_eq!(
            err.to_string(),
            format!("invalid sample at y.csv: count {} (bucket 4 overflows)", u64::MAX)
        );
        assert_eq!(series.sorted(), vec![(4, u64::MAX)]);
    }

    #[test]
    fn sample_overflow_names_its_line() {
        let mut series = AggregatedSeries::new();
        series.add(0, u64::MAX).unwrap();
        let err = series
            .merge_samples("z.csv", &[Sample::new(0, 1, 7)])
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid sample at z.csv:"));
        // The file sums on its own first, so the clash surfaces on merge.
        assert!(matches!(err, PipelineError::InvalidSample { line: None, .. }));

        let mut part = AggregatedSeries::new();
        let err = part
            .merge_samples("z.csv", &[Sample::new(0, u64::MAX, 2), Sample::new(0, 1, 7)])
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSample { line: Some(7), .. }));
        assert!(err.to_string().starts_with("invalid sample at z.csv:7:"));
    }

    #[test]
    fn failing_file_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.csv");
        let bad = dir.path().join("b.csv");
        fs::write(&good, FILE1).unwrap();
        fs::write(&bad, "time,requests\n1.0,4\n2.0,-1\n").unwrap();

        let err = aggregate_sources(&[good, bad], true).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSample { line: Some(3), .. }));
    }

    #[test]
    fn aggregates_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        let header_only = dir.path().join("c.csv");
        fs::write(&a, FILE1).unwrap();
        fs::write(&b, FILE2).unwrap();
        fs::write(&header_only, "time,requests\n").unwrap();

        let series = aggregate_sources(&[a, header_only, b], true).unwrap();
        assert_eq!(series.counts(), vec![10, 15]);
        assert_eq!(series.total(), 25);
        assert_eq!(series.peak(), Some((1, 15)));
    }
}
