use crate::config::types::{
    AssetConfig, BatchConfig, Config, CourseConfig, DiscoveryConfig, ExtractionConfig,
    LearningPathEntry, OutputConfig, RetryTierConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

const MAX_BATCH_SIZE: usize = 50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = validate_course(&config.course)?;
    validate_learning_paths(&config.learning_paths, &base)?;
    validate_discovery(&config.discovery)?;
    validate_extraction(&config.extraction)?;
    validate_assets(&config.assets)?;
    validate_batch(&config.batch)?;
    validate_retry_tiers(&config.retry_tiers)?;
    validate_output(&config.output)?;
    Ok(())
}

/// Validates the course block and returns the parsed base URL
fn validate_course(course: &CourseConfig) -> Result<Url, ConfigError> {
    if course.title.trim().is_empty() {
        return Err(ConfigError::Validation(
            "course title cannot be empty".to_string(),
        ));
    }

    let base = Url::parse(&course.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            course.base_url
        )));
    }

    base.join(&course.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid course url: {}", e)))?;

    Ok(base)
}

fn validate_learning_paths(paths: &[LearningPathEntry], base: &Url) -> Result<(), ConfigError> {
    for entry in paths {
        if entry.title.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "learning path '{}' must have a title",
                entry.url
            )));
        }

        if entry.url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "learning path '{}' must have a url",
                entry.title
            )));
        }

        base.join(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid learning path url '{}': {}",
                entry.url, e
            ))
        })?;
    }

    Ok(())
}

fn validate_discovery(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.module_segment.is_empty() || config.module_segment.contains('/') {
        return Err(ConfigError::Validation(format!(
            "module-segment must be a single non-empty path segment, got '{}'",
            config.module_segment
        )));
    }

    if config.unit_link_pattern.is_empty() {
        return Err(ConfigError::Validation(
            "unit-link-pattern cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_extraction(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.navigation_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation-attempts must be >= 1, got {}",
            config.navigation_attempts
        )));
    }

    if config.idle_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "idle-attempts must be >= 1, got {}",
            config.idle_attempts
        )));
    }

    if config.navigation_timeout == 0 || config.idle_timeout == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout and idle-timeout must be positive".to_string(),
        ));
    }

    if config.main_content_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "main-content-selectors must name at least one selector".to_string(),
        ));
    }

    for selector in config
        .main_content_selectors
        .iter()
        .chain(config.remove_selectors.iter())
    {
        if let Err(e) = Selector::parse(selector) {
            return Err(ConfigError::Validation(format!(
                "Invalid selector '{}': {:?}",
                selector, e
            )));
        }
    }

    Ok(())
}

fn validate_assets(config: &AssetConfig) -> Result<(), ConfigError> {
    if config.fetch_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-attempts must be >= 1, got {}",
            config.fetch_attempts
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be positive".to_string(),
        ));
    }

    Ok(())
}

fn validate_batch(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.batch_size
        )));
    }

    Ok(())
}

fn validate_retry_tiers(tiers: &[RetryTierConfig]) -> Result<(), ConfigError> {
    if tiers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one retry-tier is required".to_string(),
        ));
    }

    for (index, tier) in tiers.iter().enumerate() {
        if tier.retries < 1 {
            return Err(ConfigError::Validation(format!(
                "retry-tier {} must allow at least one retry",
                index + 1
            )));
        }
    }

    Ok(())
}

fn validate_output(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("archive-root", &config.archive_root),
        ("locale", &config.locale),
        ("manifest-file", &config.manifest_file),
        ("failures-file", &config.failures_file),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.locale.contains('/') || config.locale.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "locale must be a plain directory name, got '{}'",
            config.locale
        )));
    }

    Ok(())
}
