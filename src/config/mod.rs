//! Configuration module for Learn-Archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use learn_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archive.toml")).unwrap();
//! println!("Archiving {} learning paths", config.learning_paths.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AssetConfig, BatchConfig, Config, CourseConfig, DiscoveryConfig, ExtractionConfig,
    LearningPathEntry, OutputConfig, RetryTierConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub(crate) use types::default_retry_tiers;
