//! Unit content extraction
//!
//! Turns a rendered unit page into an archive document. Every failure is
//! folded into [`Extraction::Failed`] together with an error document, so a
//! caller always has something to write and a boolean outcome to count.

use crate::assets::AssetCache;
use crate::config::ExtractionConfig;
use crate::extract::document::{error_document, UnitDocument};
use crate::extract::rules::ExtractionRules;
use crate::extract::transform::{prepare_content, rewrite_images};
use crate::render::{RenderResult, RenderSession};
use crate::url::absolutize_image_src;
use crate::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Failure reason when no main content selector matches
pub const NO_MAIN_CONTENT: &str = "No main content found";

/// An image reference and where the document now points it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub remote: String,
    pub local: String,
}

impl ResolvedAsset {
    /// Whether the asset cache produced a local copy
    pub fn is_local(&self) -> bool {
        self.remote != self.local
    }
}

/// Result of extracting one unit page
#[derive(Debug, Clone)]
pub enum Extraction {
    Content {
        document: String,
        assets: Vec<ResolvedAsset>,
    },
    Failed {
        reason: String,
        document: String,
    },
}

impl Extraction {
    pub fn failed(unit_url: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Failed {
            document: error_document(unit_url, &reason),
            reason,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Content { .. })
    }

    pub fn document(&self) -> &str {
        match self {
            Self::Content { document, .. } | Self::Failed { document, .. } => document,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            Self::Content { .. } => None,
        }
    }
}

/// Extracts sanitized unit documents from rendering sessions
pub struct ContentExtractor {
    config: ExtractionConfig,
    rules: ExtractionRules,
    course_title: String,
    assets: Arc<AssetCache>,
}

impl ContentExtractor {
    pub fn new(
        config: &ExtractionConfig,
        course_title: &str,
        assets: Arc<AssetCache>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: ExtractionRules::from_config(config)?,
            config: config.clone(),
            course_title: course_title.to_string(),
            assets,
        })
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Loads `unit_url` in `session` and produces its archive document
    ///
    /// Never fails: load errors and missing content become
    /// [`Extraction::Failed`] carrying an error document.
    pub async fn extract(
        &self,
        session: &mut dyn RenderSession,
        unit_url: &str,
        unit_title: &str,
    ) -> Extraction {
        tracing::info!("Extracting: {}", unit_title);

        match self.try_extract(session, unit_url, unit_title).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!("Error extracting content from {}: {}", unit_url, e);
                Extraction::failed(unit_url, e.to_string())
            }
        }
    }

    async fn try_extract(
        &self,
        session: &mut dyn RenderSession,
        unit_url: &str,
        unit_title: &str,
    ) -> RenderResult<Extraction> {
        self.load(session, unit_url).await?;

        let page_title = session.title().await?.unwrap_or_default();
        let resolved: HashMap<String, String> = session
            .resolved_image_sources()
            .await?
            .into_iter()
            .filter(|image| !image.resolved.is_empty())
            .map(|image| (image.raw, image.resolved))
            .collect();
        tracing::debug!("Found {} images with resolved URLs", resolved.len());

        let html = session.content().await?;

        let Some(prepared) = prepare_content(&html, &self.rules) else {
            tracing::warn!("No main content found for {}", unit_url);
            return Ok(Extraction::failed(unit_url, NO_MAIN_CONTENT));
        };
        tracing::debug!(
            "Removed {} unwanted nodes, {} images to resolve",
            prepared.removed,
            prepared.image_sources.len()
        );

        let page_url = Url::parse(unit_url).ok();
        let remotes: Vec<String> = prepared
            .image_sources
            .iter()
            .map(|raw| match (resolved.get(raw), &page_url) {
                (Some(actual), _) => actual.clone(),
                (None, Some(page_url)) => absolutize_image_src(raw, page_url),
                (None, None) => raw.clone(),
            })
            .collect();

        let locals =
            futures::future::join_all(remotes.iter().map(|remote| self.assets.resolve(remote)))
                .await;

        let mut links = HashMap::with_capacity(locals.len());
        let mut assets = Vec::with_capacity(locals.len());
        for ((raw, remote), local) in prepared.image_sources.iter().zip(remotes).zip(locals) {
            links.insert(raw.clone(), local.clone());
            assets.push(ResolvedAsset { remote, local });
        }

        let fragment = rewrite_images(&prepared.fragment, &links);
        let document = UnitDocument {
            page_title: &page_title,
            unit_title,
            unit_url,
            course_title: &self.course_title,
        }
        .render(&fragment);

        Ok(Extraction::Content { document, assets })
    }

    /// Navigates with bounded retries, waits for the network to settle, then
    /// gives client-side rendering time to finish
    async fn load(&self, session: &mut dyn RenderSession, unit_url: &str) -> RenderResult<()> {
        let attempts = self.config.navigation_attempts.max(1);
        let mut attempt = 1;

        loop {
            match session
                .navigate(unit_url, self.config.navigation_timeout())
                .await
            {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    tracing::warn!("Attempt {} failed for {}: {}, retrying", attempt, unit_url, e);
                    attempt += 1;
                    tokio::time::sleep(self.config.navigation_retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }

        self.wait_until_idle(session, unit_url).await;
        tokio::time::sleep(self.config.settle_time()).await;
        Ok(())
    }

    /// Waits for network idle; giving up is not an error since the DOM is
    /// usually complete by then
    async fn wait_until_idle(&self, session: &mut dyn RenderSession, unit_url: &str) {
        let attempts = self.config.idle_attempts.max(1);

        for attempt in 1..=attempts {
            match session
                .wait_for_network_idle(self.config.idle_timeout())
                .await
            {
                Ok(()) => return,
                Err(e) if attempt < attempts => {
                    tracing::debug!("Network idle wait {} for {}: {}", attempt, unit_url, e);
                    tokio::time::sleep(self.config.idle_retry_delay()).await;
                }
                Err(e) => {
                    tracing::warn!("Proceeding with {} before network idle: {}", unit_url, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use crate::extract::document::{is_error_document, MAIN_CONTENT_MARKER, SOURCE_INFO_MARKER};
    use crate::render::{Renderer, SnapshotPage, SnapshotRenderer};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UNIT_URL: &str = "https://learn.example.com/training/modules/intro-to-azure/2-overview/";

    fn fast_config() -> ExtractionConfig {
        ExtractionConfig {
            navigation_retry_delay: 0,
            idle_retry_delay: 0,
            settle_time: 0,
            ..ExtractionConfig::default()
        }
    }

    fn extractor(dir: &TempDir) -> ContentExtractor {
        let assets = AssetCache::new(
            reqwest::Client::new(),
            dir.path().join("assets"),
            &AssetConfig {
                retry_delay: 0,
                ..AssetConfig::default()
            },
        );
        ContentExtractor::new(&fast_config(), "Azure Fundamentals", Arc::new(assets)).unwrap()
    }

    async fn run(renderer: &SnapshotRenderer, extractor: &ContentExtractor, url: &str) -> Extraction {
        let mut session = renderer.open_session().await.unwrap();
        let extraction = extractor.extract(session.as_mut(), url, "Overview").await;
        session.close().await.unwrap();
        extraction
    }

    #[tokio::test]
    async fn test_extracts_and_localises_images() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/overview.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        let resolved = format!("{}/media/overview.png", server.uri());

        let renderer = SnapshotRenderer::new().with_page(
            UNIT_URL,
            SnapshotPage::new(
                r#"<html><body><main><h1>Overview</h1><button>Next</button>
                   <img src="{{lazy}}"></main></body></html>"#,
            )
            .with_title("Overview - Training")
            .with_image("{{lazy}}", resolved.clone()),
        );
        let extractor = extractor(&dir);

        let extraction = run(&renderer, &extractor, UNIT_URL).await;
        let Extraction::Content { document, assets } = extraction else {
            panic!("expected content");
        };

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].remote, resolved);
        assert!(assets[0].is_local());
        assert!(document.contains(&format!(r#"src="{}""#, assets[0].local)));
        assert!(document.contains(r#"alt="Course content image""#));
        assert!(document.contains(r#"loading="lazy""#));
        assert!(!document.contains("<button>"));
        assert!(document.contains("<title>Overview - Training</title>"));
        assert!(document.contains("Azure Fundamentals"));
    }

    #[tokio::test]
    async fn test_missing_content_yields_error_document() {
        let dir = TempDir::new().unwrap();
        let renderer = SnapshotRenderer::new().with_page(
            UNIT_URL,
            SnapshotPage::new("<html><body><div class=\"shell\">Loading...</div></body></html>"),
        );

        let extraction = run(&renderer, &extractor(&dir), UNIT_URL).await;

        assert!(!extraction.is_success());
        assert_eq!(extraction.failure_reason(), Some(NO_MAIN_CONTENT));
        assert!(extraction.document().contains(UNIT_URL));
        assert!(extraction.document().contains("No main content found"));
        assert!(is_error_document(extraction.document()));
    }

    #[tokio::test]
    async fn test_navigation_retries_then_fails() {
        let dir = TempDir::new().unwrap();
        let renderer = SnapshotRenderer::new()
            .with_page(UNIT_URL, SnapshotPage::new("<main>x</main>"));
        renderer.always_fail_navigation(UNIT_URL);

        let extraction = run(&renderer, &extractor(&dir), UNIT_URL).await;

        assert!(!extraction.is_success());
        assert!(extraction.document().contains(UNIT_URL));
        assert_eq!(renderer.navigation_count(UNIT_URL), 3);
    }

    #[tokio::test]
    async fn test_transient_navigation_failure_recovers() {
        let dir = TempDir::new().unwrap();
        let renderer = SnapshotRenderer::new()
            .with_page(UNIT_URL, SnapshotPage::new("<main><p>ok</p></main>"));
        renderer.fail_navigation(UNIT_URL, 2);

        let extraction = run(&renderer, &extractor(&dir), UNIT_URL).await;
        assert!(extraction.is_success());
        assert_eq!(renderer.navigation_count(UNIT_URL), 3);
    }

    #[tokio::test]
    async fn test_idle_timeout_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let renderer = SnapshotRenderer::new()
            .with_page(UNIT_URL, SnapshotPage::new("<main><p>still here</p></main>"));
        renderer.never_idle(UNIT_URL);

        let extraction = run(&renderer, &extractor(&dir), UNIT_URL).await;
        assert!(extraction.is_success());
        assert!(extraction.document().contains("<p>still here</p>"));
    }

    #[tokio::test]
    async fn test_non_ascii_image_source_without_resolved_pair() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let unit_url = format!("{}/training/modules/m/1-intro/", server.uri());

        let renderer = SnapshotRenderer::new().with_page(
            unit_url.as_str(),
            SnapshotPage::new(r#"<main><p>Accents</p><img src="imag&eacute;.png"></main>"#),
        );

        let extraction = run(&renderer, &extractor(&dir), &unit_url).await;
        let Extraction::Content { document, assets } = extraction else {
            panic!("expected content");
        };

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].remote, format!("{}imag%C3%A9.png", unit_url));
        assert!(!assets[0].is_local());
        assert!(document.contains("<p>Accents</p>"));
    }

    #[tokio::test]
    async fn test_reextraction_is_structurally_identical() {
        let dir = TempDir::new().unwrap();
        let renderer = SnapshotRenderer::new().with_page(
            UNIT_URL,
            SnapshotPage::new(
                r#"<html><body><div id="module-unit-content"><h2 class="x" id="a">T</h2>
                   <img src="data:image/png;base64,AA"></div></body></html>"#,
            ),
        );
        let extractor = extractor(&dir);

        let first = run(&renderer, &extractor, UNIT_URL).await;
        let second = run(&renderer, &extractor, UNIT_URL).await;

        let section = |doc: &str| {
            let start = doc.find(SOURCE_INFO_MARKER).unwrap();
            let end = doc.find(crate::extract::TRANSLATION_PLACEHOLDER_MARKER).unwrap();
            doc[start..end].to_string()
        };
        assert_eq!(section(first.document()), section(second.document()));
        assert!(first.document().contains(MAIN_CONTENT_MARKER));
        assert!(first.document().contains("data:image/png;base64,AA"));
    }
}
