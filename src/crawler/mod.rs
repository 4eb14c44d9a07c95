//! Crawler module for archive runs
//!
//! This module contains the run orchestration, including:
//! - The shared HTTP client for asset downloads
//! - Full crawl coordination (discovery, grouping, extraction)
//! - Batched targeted re-crawls
//! - Escalating retries for failed units

mod batch;
mod coordinator;
mod fetcher;
mod retry;

pub use batch::UnitCrawler;
pub use coordinator::Coordinator;
pub use fetcher::build_http_client;
pub use retry::{Retried, RetryPolicy, RetryTier};

use crate::config::Config;
use crate::render::{ChromiumRenderer, Renderer};
use crate::ArchiveError;
use std::sync::Arc;

/// Launches headless Chromium and builds a coordinator around it
///
/// This is the main entry point for a run. A browser that fails to start is
/// reported as `ArchiveError::NoRenderer`, which is fatal for every flow.
///
/// # Arguments
///
/// * `config` - The archive configuration
///
/// # Returns
///
/// * `Ok(Coordinator)` - Ready to run any flow
/// * `Err(ArchiveError)` - Browser launch or client setup failed
pub async fn launch(config: Config) -> Result<Coordinator, ArchiveError> {
    let renderer = ChromiumRenderer::launch(
        &config.user_agent.value,
        config.extraction.navigation_timeout(),
    )
    .await
    .map_err(|e| ArchiveError::NoRenderer(e.to_string()))?;

    let renderer: Arc<dyn Renderer> = Arc::new(renderer);
    Coordinator::new(config, renderer)
}
