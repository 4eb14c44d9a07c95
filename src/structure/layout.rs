//! Archive directory layout
//!
//! ```text
//! <root>/<locale>/<NN>_<learning-path>/<NN>_<module>/<NN>_<unit>.html
//! <root>/assets/<file>
//! ```
//!
//! Unit documents sit three directories below the root, so they reference
//! assets through [`ASSET_LINK_PREFIX`].

use crate::url::clean_filename;
use std::path::{Path, PathBuf};

/// Relative path from a unit document to the asset directory
pub const ASSET_LINK_PREFIX: &str = "../../../assets/";

/// Directory name of the flat asset cache under the archive root
pub const ASSETS_DIR: &str = "assets";

/// Computes where documents and assets live in the archive
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    root: PathBuf,
    locale: String,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>, locale: &str) -> Self {
        Self {
            root: root.into(),
            locale: locale.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }

    /// `<locale>/<NN>_<title>` for the learning path at 1-based `index`
    pub fn learning_path_dir(&self, index: usize, title: &str) -> String {
        format!("{}/{}", self.locale, numbered(index, title))
    }

    /// `<learning-path-dir>/<NN>_<title>` for the module at 1-based `index`
    pub fn module_dir(&self, learning_path_dir: &str, index: usize, title: &str) -> String {
        format!("{}/{}", learning_path_dir, numbered(index, title))
    }

    /// `<module-dir>/<NN>_<title>.html` for the unit at 1-based `index`
    pub fn unit_file(&self, module_dir: &str, index: usize, title: &str) -> String {
        format!("{}/{}.html", module_dir, numbered(index, title))
    }

    /// Resolves a manifest-relative path against the archive root
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

fn numbered(index: usize, title: &str) -> String {
    format!("{:02}_{}", index, clean_filename(title))
}
