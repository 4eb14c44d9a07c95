//! Rendering module for client-side rendered pages
//!
//! Course pages only populate their content after scripts run, so everything
//! that reads a page goes through a `RenderSession`. The production backend is
//! headless Chromium; `SnapshotRenderer` serves already rendered pages.

mod chromium;
mod snapshot;
mod traits;

pub use chromium::{ChromiumRenderer, ChromiumSession, CHROME_PATH_ENV};
pub use snapshot::{SnapshotPage, SnapshotRenderer};
pub use traits::{ImageSource, RenderError, RenderResult, RenderSession, Renderer};
