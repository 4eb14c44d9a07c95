//! Extraction module for unit pages
//!
//! Selector tables (`rules`) drive a generic tree transform (`transform`);
//! the result is wrapped in a fixed template (`document`). `ContentExtractor`
//! sequences those steps against a live rendering session.

mod document;
mod extractor;
pub mod rules;
mod transform;

pub use document::{
    error_document, is_error_document, UnitDocument, MAIN_CONTENT_MARKER, SOURCE_INFO_MARKER,
    TRANSLATION_PLACEHOLDER_MARKER,
};
pub use extractor::{ContentExtractor, Extraction, ResolvedAsset, NO_MAIN_CONTENT};
pub use rules::ExtractionRules;
pub use transform::{prepare_content, rewrite_images, PreparedContent, DEFAULT_IMAGE_ALT};
