//! Error kinds surfaced by the aggregation pipeline.
//!
//! Nothing in the pipeline recovers from these; every variant aborts the run.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// A numeric field could not be coerced.
    #[error("parse error at {file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    /// A sample count that cannot be accumulated (negative, or overflowing).
    /// `line` is None when the overflow happens while merging whole buckets.
    #[error("invalid sample at {file}{}: count {value}", line_suffix(.line))]
    InvalidSample {
        file: String,
        line: Option<usize>,
        value: String,
    },

    /// A series is shorter than the window it is asked to cover.
    #[error("series '{series}' has {available} values but {required} are required")]
    Alignment {
        series: String,
        required: usize,
        available: usize,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(":{}", l)).unwrap_or_default()
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}
