use crate::extract::rules;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Learn-Archiver
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub course: CourseConfig,
    #[serde(rename = "learning-path", default)]
    pub learning_paths: Vec<LearningPathEntry>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(rename = "retry-tier", default = "default_retry_tiers")]
    pub retry_tiers: Vec<RetryTierConfig>,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Course identification, copied into every unit document and the manifest
#[derive(Debug, Clone, Deserialize)]
pub struct CourseConfig {
    /// Human-readable course name
    pub title: String,

    /// Landing page of the course
    pub url: String,

    /// Origin used to absolutise relative links found on rendered pages
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// A learning path entry page to discover units from
#[derive(Debug, Clone, Deserialize)]
pub struct LearningPathEntry {
    pub title: String,

    /// Absolute URL, or a path relative to `course.base-url`
    pub url: String,

    /// Number of modules the path is expected to contain (advisory only)
    #[serde(rename = "expected-modules", default)]
    pub expected_modules: u32,
}

/// Unit discovery settings
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Substring an anchor's href must contain to be treated as a unit link
    #[serde(rename = "unit-link-pattern", default = "default_unit_link_pattern")]
    pub unit_link_pattern: String,

    /// Path segment that precedes the module name in unit URLs
    #[serde(rename = "module-segment", default = "default_module_segment")]
    pub module_segment: String,

    /// Extra time to let the listing render after the network settles (milliseconds)
    #[serde(rename = "settle-time", default = "default_discovery_settle")]
    pub settle_time: u64,

    /// How long to wait for the listing page to go idle (milliseconds)
    #[serde(rename = "idle-timeout", default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

/// Content extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Timeout for a single navigation (milliseconds)
    #[serde(rename = "navigation-timeout", default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    #[serde(rename = "navigation-attempts", default = "default_navigation_attempts")]
    pub navigation_attempts: u32,

    #[serde(
        rename = "navigation-retry-delay",
        default = "default_navigation_retry_delay"
    )]
    pub navigation_retry_delay: u64,

    /// Timeout for a single wait-for-network-idle (milliseconds)
    #[serde(rename = "idle-timeout", default = "default_idle_timeout")]
    pub idle_timeout: u64,

    #[serde(rename = "idle-attempts", default = "default_idle_attempts")]
    pub idle_attempts: u32,

    #[serde(rename = "idle-retry-delay", default = "default_idle_retry_delay")]
    pub idle_retry_delay: u64,

    /// Extra time for client-side rendering after the network settles (milliseconds)
    #[serde(rename = "settle-time", default = "default_extraction_settle")]
    pub settle_time: u64,

    /// Main content container selectors, tried in order
    #[serde(
        rename = "main-content-selectors",
        default = "default_main_content_selectors"
    )]
    pub main_content_selectors: Vec<String>,

    /// Selectors removed from the main content before archiving
    #[serde(rename = "remove-selectors", default = "default_remove_selectors")]
    pub remove_selectors: Vec<String>,
}

/// Asset download settings
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(rename = "fetch-attempts", default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Fixed delay between download attempts (milliseconds)
    #[serde(rename = "retry-delay", default = "default_asset_retry_delay")]
    pub retry_delay: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Batch scheduling and politeness settings
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Number of units extracted concurrently
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (milliseconds)
    #[serde(rename = "batch-delay", default = "default_batch_delay")]
    pub batch_delay: u64,

    /// Pause between units of a full crawl (milliseconds)
    #[serde(rename = "unit-delay", default = "default_unit_delay")]
    pub unit_delay: u64,

    /// Pause between modules (milliseconds)
    #[serde(rename = "module-delay", default = "default_module_delay")]
    pub module_delay: u64,

    /// Pause between learning paths (milliseconds)
    #[serde(rename = "learning-path-delay", default = "default_learning_path_delay")]
    pub learning_path_delay: u64,
}

/// One escalation tier of the targeted retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct RetryTierConfig {
    /// Wait after each failed attempt in this tier (milliseconds)
    pub wait: u64,

    /// Number of attempts made in this tier
    pub retries: u32,
}

/// User agent presented to the remote site
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_user_agent")]
    pub value: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the archive
    #[serde(rename = "archive-root", default = "default_archive_root")]
    pub archive_root: String,

    /// Locale directory unit documents are written under
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Manifest file name, relative to the archive root
    #[serde(rename = "manifest-file", default = "default_manifest_file")]
    pub manifest_file: String,

    /// Failure list file name, relative to the archive root
    #[serde(rename = "failures-file", default = "default_failures_file")]
    pub failures_file: String,
}

impl ExtractionConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    pub fn navigation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_retry_delay)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout)
    }

    pub fn idle_retry_delay(&self) -> Duration {
        Duration::from_millis(self.idle_retry_delay)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            unit_link_pattern: default_unit_link_pattern(),
            module_segment: default_module_segment(),
            settle_time: default_discovery_settle(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: default_navigation_timeout(),
            navigation_attempts: default_navigation_attempts(),
            navigation_retry_delay: default_navigation_retry_delay(),
            idle_timeout: default_idle_timeout(),
            idle_attempts: default_idle_attempts(),
            idle_retry_delay: default_idle_retry_delay(),
            settle_time: default_extraction_settle(),
            main_content_selectors: default_main_content_selectors(),
            remove_selectors: default_remove_selectors(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            fetch_attempts: default_fetch_attempts(),
            retry_delay: default_asset_retry_delay(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay: default_batch_delay(),
            unit_delay: default_unit_delay(),
            module_delay: default_module_delay(),
            learning_path_delay: default_learning_path_delay(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_root: default_archive_root(),
            locale: default_locale(),
            manifest_file: default_manifest_file(),
            failures_file: default_failures_file(),
        }
    }
}

fn default_unit_link_pattern() -> String {
    "/training/modules/".to_string()
}

fn default_module_segment() -> String {
    "modules".to_string()
}

fn default_discovery_settle() -> u64 {
    2_000
}

fn default_idle_timeout() -> u64 {
    30_000
}

fn default_navigation_timeout() -> u64 {
    60_000
}

fn default_navigation_attempts() -> u32 {
    3
}

fn default_navigation_retry_delay() -> u64 {
    5_000
}

fn default_idle_attempts() -> u32 {
    2
}

fn default_idle_retry_delay() -> u64 {
    2_000
}

fn default_extraction_settle() -> u64 {
    5_000
}

fn default_main_content_selectors() -> Vec<String> {
    rules::MAIN_CONTENT_SELECTORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_remove_selectors() -> Vec<String> {
    rules::REMOVE_SELECTORS.iter().map(|s| s.to_string()).collect()
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_asset_retry_delay() -> u64 {
    2_000
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay() -> u64 {
    2_000
}

fn default_unit_delay() -> u64 {
    1_000
}

fn default_module_delay() -> u64 {
    2_000
}

fn default_learning_path_delay() -> u64 {
    10_000
}

pub(crate) fn default_retry_tiers() -> Vec<RetryTierConfig> {
    vec![
        RetryTierConfig {
            wait: 10_000,
            retries: 1,
        },
        RetryTierConfig {
            wait: 15_000,
            retries: 2,
        },
        RetryTierConfig {
            wait: 20_000,
            retries: 3,
        },
    ]
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_archive_root() -> String {
    "content".to_string()
}

fn default_locale() -> String {
    "english".to_string()
}

fn default_manifest_file() -> String {
    "course_structure.json".to_string()
}

fn default_failures_file() -> String {
    "failed_units.json".to_string()
}

impl Config {
    /// Root directory of the archive
    pub fn archive_root(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.output.archive_root)
    }

    /// Location of the manifest file
    pub fn manifest_path(&self) -> std::path::PathBuf {
        self.archive_root().join(&self.output.manifest_file)
    }

    /// Location of the list of units that are still failing
    pub fn failures_path(&self) -> std::path::PathBuf {
        self.archive_root().join(&self.output.failures_file)
    }
}
