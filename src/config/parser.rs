use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable overriding `search.endpoint`
pub const ENDPOINT_ENV: &str = "ELASTICSEARCH_URL";

/// Environment variable overriding `search.password`
pub const PASSWORD_ENV: &str = "ELASTICSEARCH_PASSWORD";

/// User name sent with a password when none is configured
pub const DEFAULT_USERNAME: &str = "elastic";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config = parse_config(&content)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Parses configuration text without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies environment overrides using the given lookup
///
/// Empty values are ignored. A password without a user name, from the file or
/// the environment, is paired with [`DEFAULT_USERNAME`].
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
        config.search.endpoint = endpoint;
    }

    if let Some(password) = lookup(PASSWORD_ENV).filter(|v| !v.is_empty()) {
        config.search.password = Some(password);
    }

    if config.search.password.is_some() && config.search.username.is_none() {
        config.search.username = Some(DEFAULT_USERNAME.to_string());
    }
}
