use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates the TOML file at `path`
///
/// ```no_run
/// use std::path::Path;
/// use handmade_crawler::config::load_config;
///
/// let config = load_config(Path::new("crawler.toml")).unwrap();
/// println!("User agent: {}", config.crawler.user_agent);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 of the configuration file, logged at startup
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(digest(&std::fs::read_to_string(path)?))
}

/// Like [`load_config`], also returning the hash of the text that was parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, digest(&content)))
}

fn digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
