//! Rendering seam traits

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Browser-side failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out waiting for {what} after {after_ms}ms")]
    Timeout { what: String, after_ms: u64 },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Rendering session is closed")]
    Closed,
}

impl RenderError {
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            after_ms: after.as_millis() as u64,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// An image as it appears in the live DOM: the raw `src` attribute paired
/// with the URL the browser actually resolved it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub raw: String,
    pub resolved: String,
}

impl ImageSource {
    pub fn new(raw: impl Into<String>, resolved: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            resolved: resolved.into(),
        }
    }
}

/// Source of rendering sessions for a run
///
/// Implementations are shared by every concurrent unit of a batch; each unit
/// opens its own session and must close it on every exit path.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh session (a browser tab, or its equivalent)
    async fn open_session(&self) -> RenderResult<Box<dyn RenderSession>>;

    /// Releases the underlying browser; called once by the driver
    async fn shutdown(&self) -> RenderResult<()>;
}

/// One page's worth of client-side rendering
#[async_trait]
pub trait RenderSession: Send {
    /// Loads `url`, failing if the load does not finish within `timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()>;

    /// Waits until the page stops issuing network requests
    ///
    /// Returns `RenderError::Timeout` if activity has not settled within
    /// `timeout`; callers may treat that as non-fatal.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> RenderResult<()>;

    /// Document title of the loaded page, if any
    async fn title(&mut self) -> RenderResult<Option<String>>;

    /// Serialized HTML of the current DOM
    async fn content(&mut self) -> RenderResult<String>;

    /// Every `<img>` with a non-empty, non-data source
    async fn resolved_image_sources(&mut self) -> RenderResult<Vec<ImageSource>>;

    async fn close(self: Box<Self>) -> RenderResult<()>;
}
