//! Asset module for local copies of referenced images
//!
//! Every `<img>` in an archived unit is rewritten to point at a file in the
//! flat `<root>/assets/` directory. Downloads that fail degrade to leaving the
//! remote URL in place; they never fail the unit that referenced them.

mod cache;
mod naming;

pub use cache::AssetCache;
pub use naming::{asset_filename, url_hash};

use thiserror::Error;

/// Reasons an asset could not be materialised locally
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request for {url} failed after {attempts} attempts: {source}")]
    Http {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
