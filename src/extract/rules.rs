//! Selector policy tables for content extraction
//!
//! These are the defaults for `[extraction] main-content-selectors` and
//! `[extraction] remove-selectors`. Bump `RULES_VERSION` whenever either table
//! changes so archived documents can be traced to the policy that shaped them.

use crate::config::ExtractionConfig;
use crate::ConfigError;
use scraper::Selector;

pub const RULES_VERSION: u32 = 1;

/// Main content container candidates; the first selector that matches wins
pub const MAIN_CONTENT_SELECTORS: &[&str] =
    &["#module-unit-content", "main", "[data-bi-name=\"content\"]"];

/// Structural, navigational and telemetry nodes stripped from the content
pub const REMOVE_SELECTORS: &[&str] = &[
    // progress and metadata widgets
    ".xp-tag",
    ".metadata",
    ".page-metadata",
    "[data-progress-uid]",
    // feedback and rating controls
    "[data-bi-name=\"feedback\"]",
    ".feedback",
    ".rating",
    ".helpful",
    // hidden helper text and icon glyphs
    ".visually-hidden",
    ".docon",
    // buttons
    "button",
    ".button",
    "[role=\"button\"]",
    // navigation
    ".navigation",
    ".breadcrumb",
    ".next-unit",
    ".prev-unit",
];

/// Compiled selector tables
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    main_content: Vec<Selector>,
    remove: Vec<Selector>,
}

impl ExtractionRules {
    /// Compiles selector lists, rejecting the first one that does not parse
    pub fn compile<S: AsRef<str>>(main_content: &[S], remove: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            main_content: compile_all(main_content)?,
            remove: compile_all(remove)?,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Self::compile(
            config.main_content_selectors.as_slice(),
            config.remove_selectors.as_slice(),
        )
    }

    pub fn main_content(&self) -> &[Selector] {
        &self.main_content
    }

    pub fn remove(&self) -> &[Selector] {
        &self.remove
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            main_content: MAIN_CONTENT_SELECTORS
                .iter()
                .filter_map(|s| Selector::parse(s).ok())
                .collect(),
            remove: REMOVE_SELECTORS
                .iter()
                .filter_map(|s| Selector::parse(s).ok())
                .collect(),
        }
    }
}

fn compile_all<S: AsRef<str>>(selectors: &[S]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|s| {
            Selector::parse(s.as_ref()).map_err(|e| {
                ConfigError::Validation(format!("Invalid selector '{}': {:?}", s.as_ref(), e))
            })
        })
        .collect()
}
