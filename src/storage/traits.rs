//! Storage traits and error types
//!
//! This module defines the trait interface for manifest backends and
//! associated error types.

use crate::structure::CourseStructure;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for manifest backends
///
/// Implementations only (de)serialize; they never interpret the tree.
pub trait StructureStore {
    /// Loads the persisted course structure
    ///
    /// Returns `StorageError::NotFound` when no manifest has been written yet.
    fn load(&self) -> StorageResult<CourseStructure>;

    /// Persists the course structure, replacing any previous manifest
    fn save(&self, structure: &CourseStructure) -> StorageResult<()>;
}
