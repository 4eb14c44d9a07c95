//! Asset cache implementation
//!
//! Resolves remote image URLs to files in the archive's asset directory.
//! A URL is fetched at most once per process; a file already present under the
//! derived name counts as cached without any network access.

use crate::assets::naming::asset_filename;
use crate::assets::AssetError;
use crate::config::AssetConfig;
use crate::structure::ASSET_LINK_PREFIX;
use crate::url::is_data_url;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// URL → local link table shared by every concurrent extraction
pub struct AssetCache {
    client: Client,
    assets_dir: PathBuf,
    fetch_attempts: u32,
    retry_delay: Duration,
    request_timeout: Duration,
    resolved: DashMap<String, Arc<OnceCell<String>>>,
}

impl AssetCache {
    /// Creates an empty cache writing into `assets_dir`
    pub fn new(client: Client, assets_dir: impl Into<PathBuf>, config: &AssetConfig) -> Self {
        Self {
            client,
            assets_dir: assets_dir.into(),
            fetch_attempts: config.fetch_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay),
            request_timeout: Duration::from_millis(config.request_timeout),
            resolved: DashMap::new(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Resolves a remote asset to the link a unit document should use
    ///
    /// Returns the relative link into the asset directory on success. Data URLs
    /// and assets that could not be downloaded are returned unchanged, so the
    /// document keeps pointing at the remote source instead of a broken file.
    pub async fn resolve(&self, remote_url: &str) -> String {
        if is_data_url(remote_url) {
            return remote_url.to_string();
        }

        let cell = self
            .resolved
            .entry(remote_url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        // Concurrent callers for the same URL wait on one download; failures
        // leave the cell empty so a later unit may try again.
        match cell
            .get_or_try_init(|| self.materialize(remote_url))
            .await
        {
            Ok(link) => link.clone(),
            Err(e) => {
                tracing::warn!("Keeping remote image {}: {}", remote_url, e);
                remote_url.to_string()
            }
        }
    }

    /// Returns the local link for a URL already resolved in this process
    pub fn cached(&self, remote_url: &str) -> Option<String> {
        self.resolved
            .get(remote_url)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of URLs resolved to local files in this process
    pub fn len(&self) -> usize {
        self.resolved
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn materialize(&self, remote_url: &str) -> Result<String, AssetError> {
        let filename = asset_filename(remote_url);
        let local_path = self.assets_dir.join(&filename);
        let link = format!("{}{}", ASSET_LINK_PREFIX, filename);

        if tokio::fs::try_exists(&local_path).await.unwrap_or(false) {
            tracing::debug!("Image already archived: {}", filename);
            return Ok(link);
        }

        tracing::debug!("Downloading image: {}", remote_url);
        let bytes = self.download(remote_url).await?;
        self.write_atomically(&local_path, &bytes).await?;

        tracing::debug!("Downloaded {} ({} bytes)", filename, bytes.len());
        Ok(link)
    }

    /// Fetches the asset body, retrying transport errors with a fixed delay
    ///
    /// A non-success HTTP status is final: the server answered, and asking
    /// again will not change the answer.
    async fn download(&self, remote_url: &str) -> Result<Vec<u8>, AssetError> {
        let mut attempt = 1;

        loop {
            let result = self
                .client
                .get(remote_url)
                .timeout(self.request_timeout)
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status() == StatusCode::OK => {
                    match response.bytes().await {
                        Ok(body) => return Ok(body.to_vec()),
                        Err(e) => e,
                    }
                }
                Ok(response) => {
                    return Err(AssetError::Status {
                        url: remote_url.to_string(),
                        status: response.status().as_u16(),
                    });
                }
                Err(e) => e,
            };

            if attempt >= self.fetch_attempts {
                return Err(AssetError::Http {
                    url: remote_url.to_string(),
                    attempts: attempt,
                    source: error,
                });
            }

            tracing::debug!(
                "Download attempt {} for {} failed: {}, retrying",
                attempt,
                remote_url,
                error
            );
            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn write_atomically(&self, path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
        tokio::fs::create_dir_all(&self.assets_dir).await?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = self
            .assets_dir
            .join(format!(".{}.{}.part", file_name, std::process::id()));

        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, path).await?;
        Ok(())
    }
}
