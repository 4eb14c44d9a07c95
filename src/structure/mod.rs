//! Course structure module
//!
//! The archived tree (learning paths → modules → units), the per-unit crawl
//! outcome, and the directory layout that maps tree positions to files.

mod layout;
mod types;

pub use layout::{ArchiveLayout, ASSETS_DIR, ASSET_LINK_PREFIX};
pub use types::{CourseStructure, CrawlResult, CrawlTarget, LearningPath, Module, Unit};
