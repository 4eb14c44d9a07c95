//! Headless Chromium renderer using chromiumoxide

use crate::render::traits::{ImageSource, RenderError, RenderResult, RenderSession, Renderer};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Overrides the Chromium binary picked by chromiumoxide's own lookup
pub const CHROME_PATH_ENV: &str = "LEARN_ARCHIVER_CHROME";

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);
const IDLE_QUIET_WINDOW: Duration = Duration::from_millis(500);

const NETWORK_PROBE_JS: &str =
    "[document.readyState, performance.getEntriesByType('resource').length]";

const IMAGE_SOURCES_JS: &str =
    "Array.from(document.images).map(img => [img.getAttribute('src') || '', img.src || ''])";

/// One long-lived browser; every session is a new tab in it
pub struct ChromiumRenderer {
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launches headless Chromium
    ///
    /// # Arguments
    /// * `user_agent` - User agent presented by every tab
    /// * `request_timeout` - Upper bound for individual DevTools requests
    pub async fn launch(user_agent: &str, request_timeout: Duration) -> RenderResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", user_agent))
            .request_timeout(request_timeout);

        if let Ok(path) = std::env::var(CHROME_PATH_ENV) {
            builder = builder.chrome_executable(PathBuf::from(path));
        }

        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Launched headless Chromium");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_session(&self) -> RenderResult<Box<dyn RenderSession>> {
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or(RenderError::Closed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(format!("failed to open tab: {}", e)))?;

        Ok(Box::new(ChromiumSession { page }))
    }

    async fn shutdown(&self) -> RenderResult<()> {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Browser did not close cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Browser process wait failed: {}", e);
            }
        }
        self.handler.abort();
        tracing::debug!("Browser shut down");
        Ok(())
    }
}

/// A single Chromium tab
pub struct ChromiumSession {
    page: Page,
}

impl ChromiumSession {
    async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> RenderResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| RenderError::Script(e.to_string()))
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(RenderError::timeout(format!("navigation to {}", url), timeout)),
        }
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> RenderResult<()> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let (ready_state, count): (String, u64) = self.evaluate(NETWORK_PROBE_JS).await?;
            let now = Instant::now();

            if ready_state != "complete" || last_count != Some(count) {
                last_count = Some(count);
                quiet_since = now;
            } else if now.duration_since(quiet_since) >= IDLE_QUIET_WINDOW {
                return Ok(());
            }

            if now >= deadline {
                return Err(RenderError::timeout("network idle", timeout));
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    async fn title(&mut self) -> RenderResult<Option<String>> {
        self.page
            .get_title()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    async fn content(&mut self) -> RenderResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    async fn resolved_image_sources(&mut self) -> RenderResult<Vec<ImageSource>> {
        let pairs: Vec<(String, String)> = self.evaluate(IMAGE_SOURCES_JS).await?;

        Ok(pairs
            .into_iter()
            .filter(|(raw, _)| !raw.is_empty() && !raw.starts_with("data:"))
            .map(|(raw, resolved)| ImageSource::new(raw, resolved))
            .collect())
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))
    }
}
