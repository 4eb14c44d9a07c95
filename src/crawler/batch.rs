//! Batch runner for targeted re-crawls and retries
//!
//! Units are partitioned into fixed-size batches; a batch is fanned out with
//! `join_all` and awaited as a whole before the next one starts. Each unit
//! gets its own rendering session, which is closed on every exit path.

use crate::config::BatchConfig;
use crate::crawler::retry::RetryPolicy;
use crate::extract::{ContentExtractor, Extraction};
use crate::output::RunTally;
use crate::render::Renderer;
use crate::structure::{ArchiveLayout, CrawlResult, CrawlTarget};
use crate::ArchiveError;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Extracts units into their archive paths
pub struct UnitCrawler {
    renderer: Arc<dyn Renderer>,
    extractor: ContentExtractor,
    layout: ArchiveLayout,
    batch_size: usize,
    batch_delay: Duration,
}

impl UnitCrawler {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        extractor: ContentExtractor,
        layout: ArchiveLayout,
        batch: &BatchConfig,
    ) -> Self {
        Self {
            renderer,
            extractor,
            layout,
            batch_size: batch.batch_size.max(1),
            batch_delay: Duration::from_millis(batch.batch_delay),
        }
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Extracts one unit and writes its document (content or error document)
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - The unit's outcome, success or failure
    /// * `Err(ArchiveError::NoRenderer)` - No rendering session could be acquired
    pub async fn crawl_unit(&self, target: &CrawlTarget) -> Result<CrawlResult, ArchiveError> {
        let mut session = self
            .renderer
            .open_session()
            .await
            .map_err(|e| ArchiveError::NoRenderer(e.to_string()))?;

        let extraction = self
            .extractor
            .extract(session.as_mut(), &target.url, &target.title)
            .await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close session for {}: {}", target.url, e);
        }

        Ok(self.finish(target, extraction).await)
    }

    /// Re-crawls `targets` in batches, without retries
    pub async fn crawl_targets(&self, targets: &[CrawlTarget]) -> Result<RunTally, ArchiveError> {
        self.run_batches(targets, |target| self.crawl_unit(target))
            .await
    }

    /// Re-crawls `targets` in batches, escalating each failing unit through `policy`
    pub async fn retry_targets(
        &self,
        targets: &[CrawlTarget],
        policy: &RetryPolicy,
    ) -> Result<RunTally, ArchiveError> {
        self.run_batches(targets, |target| self.retry_unit(target, policy))
            .await
    }

    /// Runs one unit through every tier of `policy` until it succeeds
    pub async fn retry_unit(
        &self,
        target: &CrawlTarget,
        policy: &RetryPolicy,
    ) -> Result<CrawlResult, ArchiveError> {
        let retried = policy
            .run(
                |_| self.crawl_unit(target),
                |result: &CrawlResult| result.success,
            )
            .await?;

        if retried.value.success {
            tracing::info!(
                "Success: {} after {} attempt(s)",
                target.title,
                retried.attempts
            );
        } else {
            tracing::error!(
                "All {} attempts failed for: {}",
                retried.attempts,
                target.title
            );
        }
        Ok(retried.value)
    }

    /// Writes a unit's document and converts the extraction into an outcome
    pub(crate) async fn finish(&self, target: &CrawlTarget, extraction: Extraction) -> CrawlResult {
        let path = self.layout.resolve(&target.path);

        if let Err(e) = write_document(&path, extraction.document()).await {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            return CrawlResult::failed(target.clone(), format!("write failed: {}", e));
        }

        match extraction.failure_reason() {
            None => {
                tracing::info!("Archived: {}", target.title);
                CrawlResult::succeeded(target.clone())
            }
            Some(reason) => {
                tracing::warn!("Failed: {} ({})", target.title, reason);
                CrawlResult::failed(target.clone(), reason)
            }
        }
    }

    async fn run_batches<'a, F, Fut>(
        &'a self,
        targets: &'a [CrawlTarget],
        per_unit: F,
    ) -> Result<RunTally, ArchiveError>
    where
        F: Fn(&'a CrawlTarget) -> Fut,
        Fut: std::future::Future<Output = Result<CrawlResult, ArchiveError>>,
    {
        let mut tally = RunTally::new();
        let batch_count = targets.len().div_ceil(self.batch_size);
        tracing::info!("Found {} units to crawl in {} batches", targets.len(), batch_count);

        for (index, batch) in targets.chunks(self.batch_size).enumerate() {
            let results = join_all(batch.iter().map(&per_unit)).await;

            let mut fatal = None;
            for result in results {
                match result {
                    Ok(result) => tally.record(result),
                    Err(e) => fatal = Some(e),
                }
            }
            if let Some(e) = fatal {
                tracing::error!(
                    "Aborting after batch {}: {} processed, {} failed",
                    index + 1,
                    tally.processed(),
                    tally.failed()
                );
                return Err(e);
            }

            tracing::info!(
                "Progress: {} success, {} failed",
                tally.processed(),
                tally.failed()
            );

            if index + 1 < batch_count {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        Ok(tally)
    }
}

async fn write_document(path: &Path, document: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, document).await
}
