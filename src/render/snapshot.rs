//! Renderer serving pre-rendered pages from memory
//!
//! Stands in for a browser when the DOM is already known: offline
//! re-extraction of captured pages, and the test-suite. Navigation failures
//! and idle timeouts can be injected per URL.

use crate::render::traits::{ImageSource, RenderError, RenderResult, RenderSession, Renderer};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A rendered page as the browser would expose it
#[derive(Debug, Clone, Default)]
pub struct SnapshotPage {
    pub html: String,
    pub title: Option<String>,
    pub images: Vec<ImageSource>,
}

impl SnapshotPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_image(mut self, raw: impl Into<String>, resolved: impl Into<String>) -> Self {
        self.images.push(ImageSource::new(raw, resolved));
        self
    }
}

struct SnapshotState {
    pages: DashMap<String, SnapshotPage>,
    failing_navigations: DashMap<String, u32>,
    idle_timeouts: DashSet<String>,
    navigations: DashMap<String, u32>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    session_limit: AtomicUsize,
    navigation_delay_ms: AtomicU64,
    unavailable: AtomicBool,
}

impl Default for SnapshotState {
    fn default() -> Self {
        Self {
            pages: DashMap::new(),
            failing_navigations: DashMap::new(),
            idle_timeouts: DashSet::new(),
            navigations: DashMap::new(),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
            session_limit: AtomicUsize::new(usize::MAX),
            navigation_delay_ms: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }
}

/// In-memory renderer
#[derive(Clone, Default)]
pub struct SnapshotRenderer {
    state: Arc<SnapshotState>,
}

impl SnapshotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_page(&self, url: impl Into<String>, page: SnapshotPage) {
        self.state.pages.insert(url.into(), page);
    }

    pub fn with_page(self, url: impl Into<String>, page: SnapshotPage) -> Self {
        self.insert_page(url, page);
        self
    }

    /// Makes the next `times` navigations to `url` fail
    pub fn fail_navigation(&self, url: impl Into<String>, times: u32) {
        self.state.failing_navigations.insert(url.into(), times);
    }

    /// Makes every navigation to `url` fail
    pub fn always_fail_navigation(&self, url: impl Into<String>) {
        self.fail_navigation(url, u32::MAX);
    }

    /// Network idle never settles on `url`
    pub fn never_idle(&self, url: impl Into<String>) {
        self.state.idle_timeouts.insert(url.into());
    }

    /// Refuses to open any session
    pub fn make_unavailable(&self) {
        self.state.unavailable.store(true, Ordering::SeqCst);
    }

    /// Opens `limit` sessions in total, then refuses every further one
    pub fn refuse_sessions_after(&self, limit: usize) {
        self.state.session_limit.store(limit, Ordering::SeqCst);
    }

    /// Every navigation takes `delay` before it completes
    pub fn delay_navigation(&self, delay: Duration) {
        self.state
            .navigation_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Highest number of sessions that were open at the same time
    pub fn peak_open_sessions(&self) -> usize {
        self.state.peak_active.load(Ordering::SeqCst)
    }

    pub fn navigation_count(&self, url: &str) -> u32 {
        self.state.navigations.get(url).map(|n| *n).unwrap_or(0)
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for SnapshotRenderer {
    async fn open_session(&self) -> RenderResult<Box<dyn RenderSession>> {
        if self.state.unavailable.load(Ordering::SeqCst)
            || self.state.opened.load(Ordering::SeqCst) >= self.state.session_limit.load(Ordering::SeqCst)
        {
            return Err(RenderError::Launch("snapshot renderer unavailable".to_string()));
        }

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_active.fetch_max(active, Ordering::SeqCst);
        Ok(Box::new(SnapshotSession {
            state: Arc::clone(&self.state),
            current: None,
        }))
    }

    async fn shutdown(&self) -> RenderResult<()> {
        Ok(())
    }
}

struct SnapshotSession {
    state: Arc<SnapshotState>,
    current: Option<String>,
}

impl SnapshotSession {
    fn page(&self) -> RenderResult<SnapshotPage> {
        let url = self.current.as_ref().ok_or(RenderError::Closed)?;
        self.state
            .pages
            .get(url)
            .map(|page| page.clone())
            .ok_or(RenderError::Closed)
    }
}

#[async_trait]
impl RenderSession for SnapshotSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> RenderResult<()> {
        let delay = self.state.navigation_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        *self.state.navigations.entry(url.to_string()).or_insert(0) += 1;

        if let Some(mut remaining) = self.state.failing_navigations.get_mut(url) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: "injected navigation failure".to_string(),
                });
            }
        }

        if !self.state.pages.contains_key(url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: "no snapshot for this URL".to_string(),
            });
        }

        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> RenderResult<()> {
        match &self.current {
            Some(url) if self.state.idle_timeouts.contains(url) => {
                Err(RenderError::timeout("network idle", timeout))
            }
            Some(_) => Ok(()),
            None => Err(RenderError::Closed),
        }
    }

    async fn title(&mut self) -> RenderResult<Option<String>> {
        Ok(self.page()?.title)
    }

    async fn content(&mut self) -> RenderResult<String> {
        Ok(self.page()?.html)
    }

    async fn resolved_image_sources(&mut self) -> RenderResult<Vec<ImageSource>> {
        Ok(self
            .page()?
            .images
            .into_iter()
            .filter(|image| !image.raw.is_empty() && !image.raw.starts_with("data:"))
            .collect())
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        self.state.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
