use crate::error::{PipelineError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default file-name filter for sample sources.
pub const DEFAULT_PATTERN: &str = r"\.csv$";

/// List regular files in `dir` whose file name matches `pattern`.
///
/// Sorted by path so that runs are reproducible; aggregation does not depend
/// on the order.
pub fn discover_sources(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let re = Regex::new(pattern).map_err(|e| {
        PipelineError::Configuration(format!("bad source pattern {:?}: {}", pattern, e))
    })?;

    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let matched = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| re.is_match(n))
            .unwrap_or(false);
        if matched {
            debug!(file = %path.display(), "discovered source");
            out.push(path);
        }
    }
    out.sort();

    if out.is_empty() {
        warn!(dir = %dir.display(), pattern, "no source files matched");
    }

    Ok(out)
}
