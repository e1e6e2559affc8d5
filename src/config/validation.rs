use crate::config::types::{Config, CrawlerConfig, HostnamesConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_hostnames(&config.hostnames)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_user_agent(&config.user_agent)?;

    if config.request_timeout < 1 || config.request_timeout > 300 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be between 1 and 300 seconds, got {}",
            config.request_timeout
        )));
    }

    if config.fallback_crawl_delay > 3600 {
        return Err(ConfigError::Validation(format!(
            "fallback-crawl-delay must be at most 3600 seconds, got {}",
            config.fallback_crawl_delay
        )));
    }

    if config.robots_cache_ttl < 1 {
        return Err(ConfigError::Validation(
            "robots-cache-ttl must be at least 1 second".to_string(),
        ));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// User agent must be a non-empty, printable header value
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user-agent must not contain control characters, got {:?}",
            user_agent
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates approved and banned hostname patterns
fn validate_hostnames(config: &HostnamesConfig) -> Result<(), ConfigError> {
    for pattern in config.approved.iter().chain(&config.banned) {
        validate_hostname_pattern(pattern)?;
    }
    Ok(())
}

/// Validates seed URLs
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        validate_seed(seed)?;
    }
    Ok(())
}

/// A seed must be an absolute http(s) URL with a host
pub fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates a hostname pattern (supports `*.` wildcards)
fn validate_hostname_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Hostname pattern cannot be empty".to_string(),
        ));
    }

    let hostname = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_hostname(hostname)
}

/// Validates a hostname (without wildcard prefix)
fn validate_hostname(hostname: &str) -> Result<(), ConfigError> {
    if hostname.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Hostname cannot be empty".to_string(),
        ));
    }

    if !hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Hostname '{}' contains invalid characters",
            hostname
        )));
    }

    if hostname.starts_with('.')
        || hostname.ends_with('.')
        || hostname.starts_with('-')
        || hostname.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Hostname '{}' cannot start or end with '.' or '-'",
            hostname
        )));
    }

    if hostname.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Hostname '{}' cannot contain consecutive dots",
            hostname
        )));
    }

    if !hostname.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Hostname '{}' must contain at least one dot (e.g., 'example.com')",
            hostname
        )));
    }

    Ok(())
}
