//! JSON manifest storage

use crate::storage::traits::{StorageError, StorageResult, StructureStore};
use crate::structure::CourseStructure;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores the course structure as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonStructureStore {
    path: PathBuf,
}

impl JsonStructureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StructureStore for JsonStructureStore {
    fn load(&self) -> StorageResult<CourseStructure> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, structure: &CourseStructure) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(structure)?;

        // Write next to the target and rename so a crash never leaves half a manifest
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved manifest to {}", self.path.display());
        Ok(())
    }
}
