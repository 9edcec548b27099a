//! Error types for loading schema and defaults files.

use command_resolve_core::SchemaError;
use thiserror::Error;

/// Errors raised while reading or interpreting configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A declared command is malformed or conflicts with another.
    #[error("invalid schema: {0}")]
    SchemaError(#[from] SchemaError),

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
