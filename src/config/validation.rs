use crate::config::types::{Config, FetcherConfig, FrontierConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Characters the search engine rejects in index names
const INVALID_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Largest result window the search engine serves without extra settings
const MAX_RESULT_SIZE: u32 = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_frontier_config(&config.frontier)?;
    Ok(())
}

/// Validates search engine configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    validate_index_name(&config.index_name)?;

    if config.connect_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-attempts must be >= 1, got {}",
            config.connect_attempts
        )));
    }

    if config.health_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "health-attempts must be >= 1, got {}",
            config.health_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.result_size < 1 || config.result_size > MAX_RESULT_SIZE {
        return Err(ConfigError::Validation(format!(
            "result-size must be between 1 and {}, got {}",
            MAX_RESULT_SIZE, config.result_size
        )));
    }

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "password is set but username is missing".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates frontier configuration
fn validate_frontier_config(config: &FrontierConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.claim_batch_size < 1 {
        return Err(ConfigError::Validation(
            "claim-batch-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates an index name against the engine's naming rules
fn validate_index_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "index-name cannot be empty".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "index-name '{}' must be lowercase",
            name
        )));
    }

    if name.contains(INVALID_INDEX_CHARS) {
        return Err(ConfigError::Validation(format!(
            "index-name '{}' contains invalid characters",
            name
        )));
    }

    if name.starts_with('-') || name.starts_with('_') || name.starts_with('+') {
        return Err(ConfigError::Validation(format!(
            "index-name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }

    if name == "." || name == ".." {
        return Err(ConfigError::Validation(format!(
            "index-name '{}' is reserved",
            name
        )));
    }

    Ok(())
}
