use crate::config::types::{Config, CrawlerConfig, OutputConfig, SourceEntry, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > 64 {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and 64, got {}",
            config.worker_count
        )));
    }

    if config.frame_budget < 1 || config.frame_budget > 1000 {
        return Err(ConfigError::Validation(format!(
            "frame_budget must be between 1 and 1000, got {}",
            config.frame_budget
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    if config.queue_capacity < 1 || config.queue_capacity > 1024 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be between 1 and 1024, got {}",
            config.queue_capacity
        )));
    }

    if config.max_ad_count == Some(0) {
        return Err(ConfigError::Validation(
            "max_ad_count must be >= 1 when set".to_string(),
        ));
    }

    if config.run_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "run_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates source entries, their seeds and selectors
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    for source in sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if source.category.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' must declare a category",
                source.name
            )));
        }

        if source.seeds.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' must have at least one seed URL",
                source.name
            )));
        }

        for seed in &source.seeds {
            let url = Url::parse(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "Seed URL '{}' must use HTTP or HTTPS",
                    seed
                )));
            }
        }

        for (key, selector) in source.selectors.entries() {
            Selector::parse(selector).map_err(|e| {
                ConfigError::InvalidSelector(format!(
                    "{}.{} = '{}': {}",
                    source.name, key, selector, e
                ))
            })?;
        }

        if matches!(&source.selectors.page_param, Some(param) if param.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Source '{}' has an empty page-param",
                source.name
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
