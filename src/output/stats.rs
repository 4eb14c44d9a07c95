//! Run tallies and archive statistics
//!
//! `RunTally` aggregates per-unit outcomes of one run; `ArchiveStatistics`
//! describes what the manifest and the archive directory currently hold.

use crate::extract::is_error_document;
use crate::structure::{ArchiveLayout, CourseStructure, CrawlResult, CrawlTarget};
use std::fs;

/// Per-run success and failure counts
///
/// Every attempted unit is recorded exactly once, so
/// `processed() + failed() == attempted()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTally {
    processed: usize,
    failed: usize,
    still_failing: Vec<CrawlTarget>,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: CrawlResult) {
        if result.success {
            self.processed += 1;
        } else {
            self.failed += 1;
            self.still_failing.push(result.target);
        }
    }

    /// Folds another tally (e.g. one batch) into this one
    pub fn merge(&mut self, other: RunTally) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.still_failing.extend(other.still_failing);
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn attempted(&self) -> usize {
        self.processed + self.failed
    }

    /// Units whose last attempt in this run failed, in attempt order
    pub fn still_failing(&self) -> &[CrawlTarget] {
        &self.still_failing
    }

    pub fn into_still_failing(self) -> Vec<CrawlTarget> {
        self.still_failing
    }
}

impl FromIterator<CrawlResult> for RunTally {
    fn from_iter<I: IntoIterator<Item = CrawlResult>>(iter: I) -> Self {
        let mut tally = RunTally::new();
        for result in iter {
            tally.record(result);
        }
        tally
    }
}

/// Prints the end-of-run tally
///
/// # Arguments
///
/// * `tally` - Outcomes of the run
/// * `list_failures` - Whether to list units still failing (retry flows)
pub fn print_run_summary(tally: &RunTally, list_failures: bool) {
    println!();
    println!("=== Run Summary ===");
    println!("  Successfully processed: {} units", tally.processed());
    println!("  Failed: {} units", tally.failed());
    println!("  Total: {} units", tally.attempted());

    if list_failures && !tally.still_failing().is_empty() {
        println!();
        println!("Units still failing ({}):", tally.still_failing().len());
        for target in tally.still_failing() {
            println!("  - {} ({})", target.title, target.url);
        }
    }
}

/// Archive contents as recorded in the manifest and found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStatistics {
    pub course_title: String,
    pub crawl_timestamp: String,
    pub learning_paths: usize,
    pub modules: usize,
    pub units: usize,

    /// Units whose document exists on disk
    pub documents_present: usize,

    /// Documents on disk that are error documents
    pub error_documents: usize,

    /// Files in the asset directory
    pub assets: usize,
}

/// Computes statistics for a manifest against the archive directory
pub fn archive_statistics(structure: &CourseStructure, layout: &ArchiveLayout) -> ArchiveStatistics {
    let mut documents_present = 0;
    let mut error_documents = 0;

    for unit in structure.units() {
        if unit.local_file.is_empty() {
            continue;
        }

        if let Ok(content) = fs::read_to_string(layout.resolve(&unit.local_file)) {
            documents_present += 1;
            if is_error_document(&content) {
                error_documents += 1;
            }
        }
    }

    let assets = fs::read_dir(layout.assets_dir())
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .count()
        })
        .unwrap_or(0);

    ArchiveStatistics {
        course_title: structure.course_title.clone(),
        crawl_timestamp: structure.crawl_timestamp.clone(),
        learning_paths: structure.learning_paths.len(),
        modules: structure.module_count(),
        units: structure.unit_count(),
        documents_present,
        error_documents,
        assets,
    }
}

/// Prints archive statistics to stdout
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Course: {}", stats.course_title);
    println!("Crawled: {}", stats.crawl_timestamp);
    println!();

    println!("Structure:");
    println!("  Learning paths: {}", stats.learning_paths);
    println!("  Modules: {}", stats.modules);
    println!("  Units: {}", stats.units);
    println!();

    let archived = stats.documents_present - stats.error_documents;
    let coverage = if stats.units > 0 {
        (archived as f64 / stats.units as f64) * 100.0
    } else {
        0.0
    };

    println!("Documents:");
    println!("  Present: {}", stats.documents_present);
    println!("  Error documents: {}", stats.error_documents);
    println!("  Missing: {}", stats.units.saturating_sub(stats.documents_present));
    println!("  Archived content: {} ({:.1}%)", archived, coverage);
    println!();

    println!("Assets: {}", stats.assets);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::error_document;
    use crate::structure::{LearningPath, Module, Unit};
    use tempfile::TempDir;

    fn target(n: usize) -> CrawlTarget {
        CrawlTarget {
            url: format!("https://learn.example.com/training/modules/m/{}", n),
            path: format!("english/01_P/01_M/{:02}_U.html", n),
            title: format!("Unit {}", n),
        }
    }

    #[test]
    fn test_tally_invariant() {
        let results = (0..7).map(|n| {
            if n % 3 == 0 {
                CrawlResult::failed(target(n), "boom")
            } else {
                CrawlResult::succeeded(target(n))
            }
        });
        let tally: RunTally = results.collect();

        assert_eq!(tally.failed(), 3);
        assert_eq!(tally.processed(), 4);
        assert_eq!(tally.attempted(), 7);
        assert_eq!(tally.still_failing()[0], target(0));
    }

    #[test]
    fn test_tally_merge() {
        let mut total = RunTally::new();
        total.merge(vec![CrawlResult::succeeded(target(1))].into_iter().collect());
        total.merge(vec![CrawlResult::failed(target(2), "x")].into_iter().collect());

        assert_eq!(total.attempted(), 2);
        assert_eq!(total.into_still_failing(), vec![target(2)]);
    }

    #[test]
    fn test_archive_statistics() {
        let dir = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(dir.path(), "english");

        let mut structure = CourseStructure::new("Course", "https://learn.example.com/", 1);
        structure.learning_paths.push(LearningPath {
            title: "P".to_string(),
            url: "https://learn.example.com/p".to_string(),
            expected_modules: 1,
            actual_modules: 1,
            modules: vec![Module {
                title: "M".to_string(),
                units: (1..=3)
                    .map(|n| Unit {
                        title: format!("Unit {}", n),
                        url: target(n).url,
                        local_file: target(n).path,
                    })
                    .collect(),
            }],
        });

        let unit_dir = dir.path().join("english/01_P/01_M");
        fs::create_dir_all(&unit_dir).unwrap();
        fs::write(unit_dir.join("01_U.html"), "<html>ok</html>").unwrap();
        fs::write(unit_dir.join("02_U.html"), error_document("u", "No main content found")).unwrap();
        fs::create_dir_all(layout.assets_dir()).unwrap();
        fs::write(layout.assets_dir().join("a_0123abcd.png"), b"x").unwrap();

        let stats = archive_statistics(&structure, &layout);
        assert_eq!(stats.units, 3);
        assert_eq!(stats.modules, 1);
        assert_eq!(stats.documents_present, 2);
        assert_eq!(stats.error_documents, 1);
        assert_eq!(stats.assets, 1);
    }
}
