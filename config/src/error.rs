use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Setting '{name}' is not configured")]
    MissingSetting { name: String },

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
