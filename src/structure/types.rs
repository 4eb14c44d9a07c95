//! Course tree types
//!
//! These types serialize directly to the manifest format:
//!
//! ```json
//! { "course_title": "...", "course_url": "...", "crawl_timestamp": "...",
//!   "total_learning_paths": 6,
//!   "learning_paths": [ { "title": "...", "url": "...", "expected_modules": 5,
//!     "actual_modules": 5, "modules": [ { "title": "...",
//!       "units": [ { "title": "...", "url": "...", "local_file": "..." } ] } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

/// Root of the archived course tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStructure {
    pub course_title: String,
    pub course_url: String,
    pub crawl_timestamp: String,
    pub total_learning_paths: usize,
    #[serde(default)]
    pub learning_paths: Vec<LearningPath>,
}

/// A top-level grouping of modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub title: String,
    pub url: String,

    /// Advisory module count from configuration
    #[serde(default)]
    pub expected_modules: u32,

    /// Number of modules actually discovered
    #[serde(default)]
    pub actual_modules: usize,

    /// Modules in discovery order
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// Units grouped by the module segment of their URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// The smallest crawlable page, mapped 1:1 to an archive document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub title: String,
    pub url: String,

    /// Document path relative to the archive root
    #[serde(default)]
    pub local_file: String,
}

/// A unit to (re-)extract without rediscovery
///
/// `path` is relative to the archive root; an absolute path is used as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub url: String,
    pub path: String,
    pub title: String,
}

/// Outcome of extracting one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub target: CrawlTarget,
    pub success: bool,
    pub error: Option<String>,
}

impl CourseStructure {
    /// Creates an empty structure stamped with the current local time
    pub fn new(course_title: &str, course_url: &str, total_learning_paths: usize) -> Self {
        Self {
            course_title: course_title.to_string(),
            course_url: course_url.to_string(),
            crawl_timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total_learning_paths,
            learning_paths: Vec::new(),
        }
    }

    /// Iterates over every unit in tree order
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.learning_paths
            .iter()
            .flat_map(|path| path.modules.iter())
            .flat_map(|module| module.units.iter())
    }

    /// Total number of units in the tree
    pub fn unit_count(&self) -> usize {
        self.units().count()
    }

    /// Total number of modules in the tree
    pub fn module_count(&self) -> usize {
        self.learning_paths.iter().map(|p| p.modules.len()).sum()
    }

    /// Crawl targets for every unit that has both a URL and a local file
    pub fn targets(&self) -> Vec<CrawlTarget> {
        self.units()
            .filter(|unit| !unit.url.is_empty() && !unit.local_file.is_empty())
            .map(Unit::target)
            .collect()
    }
}

impl Unit {
    pub fn target(&self) -> CrawlTarget {
        CrawlTarget {
            url: self.url.clone(),
            path: self.local_file.clone(),
            title: self.title.clone(),
        }
    }
}

impl CrawlResult {
    pub fn succeeded(target: CrawlTarget) -> Self {
        Self {
            target,
            success: true,
            error: None,
        }
    }

    pub fn failed(target: CrawlTarget, error: impl Into<String>) -> Self {
        Self {
            target,
            success: false,
            error: Some(error.into()),
        }
    }
}
