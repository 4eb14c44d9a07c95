//! Crawler coordinator - run-level orchestration
//!
//! This module drives the archive flows:
//! - Full crawl: discovery, module grouping and extraction of every unit
//! - Targeted re-crawl of the units recorded in the manifest
//! - Targeted retry of an explicit unit list with escalating tiers
//!
//! The coordinator owns the manifest for the duration of a run and is the
//! only place that persists it.

use crate::assets::AssetCache;
use crate::config::Config;
use crate::crawler::batch::UnitCrawler;
use crate::crawler::build_http_client;
use crate::crawler::retry::RetryPolicy;
use crate::discovery::{group_by_module, DiscoveredModule, UnitDiscovery};
use crate::extract::ContentExtractor;
use crate::output::{write_failure_list, RunTally};
use crate::render::Renderer;
use crate::storage::{JsonStructureStore, StructureStore};
use crate::structure::{ArchiveLayout, CourseStructure, CrawlTarget, LearningPath, Module, Unit};
use crate::url::resolve_against_base;
use crate::ArchiveError;
use std::sync::Arc;
use std::time::Duration;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    renderer: Arc<dyn Renderer>,
    units: UnitCrawler,
    discovery: UnitDiscovery,
    store: JsonStructureStore,
}

impl Coordinator {
    /// Creates a coordinator around an already running renderer
    ///
    /// # Arguments
    ///
    /// * `config` - The archive configuration
    /// * `renderer` - Source of rendering sessions for discovery and extraction
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ArchiveError)` - The HTTP client or extraction rules could not be built
    pub fn new(config: Config, renderer: Arc<dyn Renderer>) -> Result<Self, ArchiveError> {
        let layout = ArchiveLayout::new(config.archive_root(), &config.output.locale);
        let client = build_http_client(&config.user_agent, &config.assets)?;
        let assets = Arc::new(AssetCache::new(client, layout.assets_dir(), &config.assets));
        let extractor = ContentExtractor::new(&config.extraction, &config.course.title, assets)?;

        let units = UnitCrawler::new(renderer.clone(), extractor, layout, &config.batch);
        let discovery = UnitDiscovery::new(
            &config.discovery,
            config.extraction.navigation_timeout(),
        );
        let store = JsonStructureStore::new(config.manifest_path());

        Ok(Self {
            config: Arc::new(config),
            renderer,
            units,
            discovery,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &ArchiveLayout {
        self.units.layout()
    }

    /// Runs discovery over every configured learning path and extracts every unit
    ///
    /// The manifest is saved after each learning path, and once more if the
    /// run aborts, so it always reflects the units written so far. An
    /// aborted learning path is kept with the modules and units it reached.
    pub async fn run_full_crawl(&self) -> Result<(CourseStructure, RunTally), ArchiveError> {
        let entries = &self.config.learning_paths;
        let mut structure = CourseStructure::new(
            &self.config.course.title,
            &self.config.course.url,
            entries.len(),
        );
        let mut tally = RunTally::new();

        tracing::info!(
            "Starting full crawl of {} ({} learning paths)",
            self.config.course.title,
            entries.len()
        );

        for (index, entry) in entries.iter().enumerate() {
            tracing::info!(
                "Learning path {}/{}: {}",
                index + 1,
                entries.len(),
                entry.title
            );

            let mut learning_path = LearningPath {
                title: entry.title.clone(),
                url: entry.url.clone(),
                expected_modules: entry.expected_modules,
                actual_modules: 0,
                modules: Vec::new(),
            };
            let crawled = self
                .crawl_learning_path(index + 1, &mut learning_path, &mut tally)
                .await;
            structure.learning_paths.push(learning_path);

            if let Err(e) = crawled {
                self.save_partial(&structure);
                return Err(e);
            }
            self.store.save(&structure)?;

            if index + 1 < entries.len() {
                tokio::time::sleep(Duration::from_millis(self.config.batch.learning_path_delay))
                    .await;
            }
        }

        tracing::info!(
            "Full crawl finished: {} modules, {} units",
            structure.module_count(),
            structure.unit_count()
        );
        Ok((structure, tally))
    }

    /// Re-extracts every unit recorded in the manifest, without rediscovery
    pub async fn recrawl_manifest(&self) -> Result<RunTally, ArchiveError> {
        let structure = self.store.load()?;
        let targets = structure.targets();
        tracing::info!(
            "Re-crawling {} units from {}",
            targets.len(),
            self.store.path().display()
        );
        self.units.crawl_targets(&targets).await
    }

    /// Retries `targets` with the configured escalation tiers
    pub async fn retry_failed(&self, targets: &[CrawlTarget]) -> Result<RunTally, ArchiveError> {
        let policy = RetryPolicy::from_config(&self.config.retry_tiers);
        tracing::info!(
            "Retrying {} units, up to {} attempts each",
            targets.len(),
            policy.total_attempts()
        );
        self.units.retry_targets(targets, &policy).await
    }

    /// Re-extracts one explicit unit
    pub async fn crawl_single(&self, target: &CrawlTarget) -> Result<RunTally, ArchiveError> {
        let result = self.units.crawl_unit(target).await?;
        Ok(std::iter::once(result).collect())
    }

    /// Replaces the failure list with the units `tally` still reports failing
    pub fn record_failures(&self, tally: &RunTally) -> Result<(), ArchiveError> {
        write_failure_list(&self.config.failures_path(), tally.still_failing())
    }

    /// Tears down the renderer; the HTTP client is dropped with the coordinator
    pub async fn shutdown(self) {
        if let Err(e) = self.renderer.shutdown().await {
            tracing::warn!("Renderer did not shut down cleanly: {}", e);
        }
    }

    /// Fills `learning_path` in place so an abort keeps what was reached
    async fn crawl_learning_path(
        &self,
        index: usize,
        learning_path: &mut LearningPath,
        tally: &mut RunTally,
    ) -> Result<(), ArchiveError> {
        let url = resolve_against_base(&self.config.course.base_url, &learning_path.url)?;
        learning_path.url = url.to_string();
        let modules = self.discover_modules(&url).await?;

        if modules.is_empty() {
            tracing::warn!("No units discovered for learning path: {}", learning_path.title);
        }

        learning_path.actual_modules = modules.len();
        learning_path.modules.reserve(modules.len());
        let path_dir = self.layout().learning_path_dir(index, &learning_path.title);
        let module_count = modules.len();

        for (module_index, module) in modules.into_iter().enumerate() {
            tracing::info!(
                "Module {}/{}: {} ({} units)",
                module_index + 1,
                module_count,
                module.title,
                module.units.len()
            );

            let module_dir = self
                .layout()
                .module_dir(&path_dir, module_index + 1, &module.title);
            learning_path.modules.push(Module {
                title: module.title.clone(),
                units: Vec::with_capacity(module.units.len()),
            });
            if let Some(crawled) = learning_path.modules.last_mut() {
                self.crawl_module(&module_dir, module, crawled, tally).await?;
            }

            if module_index + 1 < module_count {
                tokio::time::sleep(Duration::from_millis(self.config.batch.module_delay)).await;
            }
        }

        Ok(())
    }

    async fn discover_modules(&self, url: &url::Url) -> Result<Vec<DiscoveredModule>, ArchiveError> {
        let mut session = self
            .renderer
            .open_session()
            .await
            .map_err(|e| ArchiveError::NoRenderer(e.to_string()))?;

        let units = self.discovery.discover(session.as_mut(), url).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close discovery session for {}: {}", url, e);
        }

        Ok(group_by_module(units, &self.config.discovery.module_segment))
    }

    /// Extracts a module's units one at a time, in discovery order
    ///
    /// Each unit is recorded in `crawled` as soon as its document is written.
    async fn crawl_module(
        &self,
        module_dir: &str,
        module: DiscoveredModule,
        crawled: &mut Module,
        tally: &mut RunTally,
    ) -> Result<(), ArchiveError> {
        let unit_delay = Duration::from_millis(self.config.batch.unit_delay);
        let unit_count = module.units.len();

        for (unit_index, unit) in module.units.into_iter().enumerate() {
            let target = CrawlTarget {
                url: unit.url.to_string(),
                path: self
                    .layout()
                    .unit_file(module_dir, unit_index + 1, &unit.title),
                title: unit.title,
            };

            tally.record(self.units.crawl_unit(&target).await?);
            crawled.units.push(Unit {
                title: target.title,
                url: target.url,
                local_file: target.path,
            });

            if unit_index + 1 < unit_count {
                tokio::time::sleep(unit_delay).await;
            }
        }

        Ok(())
    }

    fn save_partial(&self, structure: &CourseStructure) {
        if let Err(e) = self.store.save(structure) {
            tracing::error!("Failed to save partial manifest: {}", e);
        }
    }
}
