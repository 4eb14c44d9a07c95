//! Storage module for persisting the course manifest
//!
//! The manifest is the join key between the remote course and the local
//! archive: targeted re-crawls read it to find where each unit's document
//! lives, and a full crawl writes it once discovery is complete.

mod json;
mod traits;

pub use json::JsonStructureStore;
pub use traits::{StorageError, StorageResult, StructureStore};

use crate::config::Config;

/// Opens the manifest store configured for this archive
pub fn open_store(config: &Config) -> JsonStructureStore {
    JsonStructureStore::new(config.manifest_path())
}
