//! Unit link listing from rendered learning-path pages

use crate::config::DiscoveryConfig;
use crate::render::RenderSession;
use crate::url::resolve_link;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Anchor text that only navigates and never names a unit
const NAVIGATIONAL_TEXT: &[&str] = &["start", "continue", "resume"];

/// A unit link found on a learning-path page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUnit {
    pub title: String,
    pub url: Url,
}

/// Lists unit links beneath learning-path pages
pub struct UnitDiscovery {
    config: DiscoveryConfig,
    navigation_timeout: Duration,
}

impl UnitDiscovery {
    pub fn new(config: &DiscoveryConfig, navigation_timeout: Duration) -> Self {
        Self {
            config: config.clone(),
            navigation_timeout,
        }
    }

    /// Renders `learning_path_url` and lists the unit links on it
    ///
    /// A page that fails to load yields an empty list; the caller decides
    /// whether that matters.
    pub async fn discover(
        &self,
        session: &mut dyn RenderSession,
        learning_path_url: &Url,
    ) -> Vec<DiscoveredUnit> {
        tracing::info!("Extracting units from: {}", learning_path_url);

        if let Err(e) = session
            .navigate(learning_path_url.as_str(), self.navigation_timeout)
            .await
        {
            tracing::warn!("Failed to load learning path {}: {}", learning_path_url, e);
            return Vec::new();
        }

        let idle_timeout = Duration::from_millis(self.config.idle_timeout);
        if let Err(e) = session.wait_for_network_idle(idle_timeout).await {
            tracing::warn!("Listing {} before network idle: {}", learning_path_url, e);
        }
        tokio::time::sleep(Duration::from_millis(self.config.settle_time)).await;

        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to read learning path {}: {}", learning_path_url, e);
                return Vec::new();
            }
        };

        let units = unit_links(&html, learning_path_url, &self.config.unit_link_pattern);
        tracing::info!("Found {} units in this learning path", units.len());
        units
    }
}

/// Anchors whose href contains `pattern`, in document order
///
/// Hrefs are resolved against `page_url` and deduplicated by absolute URL.
/// Anchors with empty or purely navigational text are skipped.
pub fn unit_links(html: &str, page_url: &Url, pattern: &str) -> Vec<DiscoveredUnit> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut units = Vec::new();

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(pattern) {
            continue;
        }

        let Some(url) = resolve_link(href, page_url) else {
            continue;
        };

        let title = collapse_whitespace(&anchor.text().collect::<String>());
        if title.is_empty() || is_navigational(&title) {
            continue;
        }

        if seen.insert(url.to_string()) {
            units.push(DiscoveredUnit { title, url });
        }
    }

    units
}

fn is_navigational(text: &str) -> bool {
    NAVIGATIONAL_TEXT
        .iter()
        .any(|nav| text.eq_ignore_ascii_case(nav))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Renderer, SnapshotPage, SnapshotRenderer};

    const PATH_URL: &str = "https://learn.example.com/en-us/training/paths/az-104-prerequisites/";

    const PATH_PAGE: &str = r#"<html><body>
        <a href="/en-us/training/modules/tour-azure-portal/">Start</a>
        <a href="/en-us/training/modules/tour-azure-portal/1-introduction">
            Introduction
        </a>
        <a href="/en-us/training/modules/tour-azure-portal/2-azure-management">Azure   management</a>
        <a href="https://learn.example.com/en-us/training/modules/tour-azure-portal/1-introduction">Introduction again</a>
        <a href="/en-us/training/modules/intro-to-cloud-shell/1-introduction"><span></span></a>
        <a href="/en-us/training/paths/other-path/">Other path</a>
        <a href="javascript:void(0)">/training/modules/ fake</a>
        <a href="/en-us/training/modules/intro-to-cloud-shell/2-features">Features</a>
    </body></html>"#;

    fn page_url() -> Url {
        Url::parse(PATH_URL).unwrap()
    }

    #[test]
    fn test_unit_links_filters_and_dedupes() {
        let units = unit_links(PATH_PAGE, &page_url(), "/training/modules/");
        let titles: Vec<&str> = units.iter().map(|u| u.title.as_str()).collect();

        assert_eq!(titles, vec!["Introduction", "Azure management", "Features"]);
        assert_eq!(
            units[0].url.as_str(),
            "https://learn.example.com/en-us/training/modules/tour-azure-portal/1-introduction"
        );
    }

    #[test]
    fn test_is_navigational() {
        assert!(is_navigational("START"));
        assert!(is_navigational("Continue"));
        assert!(!is_navigational("Start a resource group"));
    }

    fn fast_discovery() -> UnitDiscovery {
        let config = DiscoveryConfig {
            settle_time: 0,
            ..DiscoveryConfig::default()
        };
        UnitDiscovery::new(&config, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_discover_through_session() {
        let renderer =
            SnapshotRenderer::new().with_page(PATH_URL, SnapshotPage::new(PATH_PAGE));
        renderer.never_idle(PATH_URL);

        let mut session = renderer.open_session().await.unwrap();
        let units = fast_discovery().discover(session.as_mut(), &page_url()).await;

        assert_eq!(units.len(), 3);
    }

    #[tokio::test]
    async fn test_discover_failed_load_is_empty() {
        let renderer = SnapshotRenderer::new();

        let mut session = renderer.open_session().await.unwrap();
        let units = fast_discovery().discover(session.as_mut(), &page_url()).await;

        assert!(units.is_empty());
    }
}
