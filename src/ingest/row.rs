/// A single `(timestamp, count)` observation from a sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Whole seconds, floored from the source value.
    pub timestamp: i64,
    pub count: u64,
    /// 1-based line in the source file.
    pub line: usize,
}

impl Sample {
    pub fn new(timestamp: i64, count: u64, line: usize) -> Self {
        Self {
            timestamp,
            count,
            line,
        }
    }
}
