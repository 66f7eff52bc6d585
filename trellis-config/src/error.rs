// Error types for configuration loading

use thiserror::Error;

/// Failures raised while loading a config set. Every file-level
/// variant names the file so a broken mapping is diagnosable from the
/// message alone.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Configuration file '{file}' has an unsupported extension '{extension}'")]
    UnsupportedFormat { file: String, extension: String },

    #[error("Failed to read configuration file '{file}': {source}")]
    FileRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file '{file}': {detail}")]
    Parse { file: String, detail: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
