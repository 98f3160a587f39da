//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidatedConfig, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[source] toml::de::Error),

    #[error("Parse error: {0}")]
    Yaml(#[source] serde_yaml::Error),

    #[error("Invalid {var}: {message}")]
    Env { var: String, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Syntax of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// `.toml` files are TOML; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Deserialize `content` without validating it.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<GatewayConfig, ConfigError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(ConfigError::Toml),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(ConfigError::Yaml),
    }
}

/// Apply `DB_DRIVER`, `DB_FILEPATH` and `PORT` on top of the file values.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(driver) = lookup("DB_DRIVER") {
        config.db.driver = driver;
    }
    if let Some(filepath) = lookup("DB_FILEPATH") {
        config.db.filepath = filepath;
    }
    if let Some(port) = lookup("PORT") {
        config.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                var: "PORT".to_string(),
                message: e.to_string(),
            }
        })?;
    }
    Ok(())
}

/// Load, override from the environment, and validate configuration.
pub fn load_config(path: &Path) -> Result<ValidatedConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config = parse_config(&content, ConfigFormat::from_path(path))?;
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;

    validate_config(config).map_err(ConfigError::Validation)
}
