//! Failure list persistence
//!
//! Units still failing at the end of a run are written as a JSON array of
//! `{url, path, title}` objects, the input format of `--retry-failed`.

use crate::structure::CrawlTarget;
use crate::ArchiveError;
use std::fs;
use std::path::Path;

/// Reads a failure list; a missing file is an error
pub fn read_failure_list(path: &Path) -> Result<Vec<CrawlTarget>, ArchiveError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Replaces the failure list with `targets`
///
/// An empty list is still written so a stale list never outlives a clean run.
pub fn write_failure_list(path: &Path, targets: &[CrawlTarget]) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(targets)?;
    fs::write(path, json)?;

    tracing::info!("Wrote {} failed units to {}", targets.len(), path.display());
    Ok(())
}
