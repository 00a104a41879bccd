use crate::config::types::{Config, GeneralConfig, SourceConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// On-disk shape of the configuration file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    general: GeneralConfig,

    #[serde(default)]
    sources: toml::Table,
}

/// On-disk shape of one `[sources.<name>]` table
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSource {
    #[serde(rename = "type")]
    kind: Option<String>,

    #[serde(default = "default_frequency")]
    frequency: String,

    #[serde(default = "default_enabled")]
    enabled: bool,

    #[serde(default)]
    display_name: String,

    #[serde(flatten)]
    params: toml::Table,
}

fn default_frequency() -> String {
    "daily".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Loads and parses a configuration file from the given path
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
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(content)?;

    let mut sources = Vec::with_capacity(raw.sources.len());
    for (name, value) in raw.sources {
        let entry: RawSource = value.try_into()?;
        let display_name = if entry.display_name.is_empty() {
            name.clone()
        } else {
            entry.display_name
        };
        sources.push(SourceConfig {
            name,
            kind: entry.kind,
            frequency: entry.frequency,
            enabled: entry.enabled,
            display_name,
            params: entry.params,
        });
    }

    let config = Config {
        general: raw.general,
        sources,
    };
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so archived snapshots can be traced back to the
/// configuration revision that produced them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
