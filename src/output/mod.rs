//! Output module for run reporting
//!
//! This module handles:
//! - Tallying per-unit outcomes of a run
//! - Printing run summaries and archive statistics
//! - Persisting the list of units still failing

mod failures;
pub mod stats;

pub use failures::{read_failure_list, write_failure_list};
pub use stats::{
    archive_statistics, print_run_summary, print_statistics, ArchiveStatistics, RunTally,
};
