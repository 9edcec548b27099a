//! Error types for run orchestration.
//!
//! User-input problems never show up here; they are reported as
//! [`InvalidArgument`](command_resolve_core::InvalidArgument) records. These
//! errors mean a collaborator or the declared schema is broken.

use command_resolve_core::{SchemaError, ValueError};
use thiserror::Error;

/// Error returned by collaborators: executors, service providers and
/// default-value providers.
pub type ExecuteError = Box<dyn std::error::Error + Send + Sync>;

/// Framework-level failures during a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Service modifiers clash with each other or with registered commands.
    #[error("invalid command declaration: {0}")]
    Schema(#[from] SchemaError),

    /// External defaults could not be merged with parsed values.
    #[error("invalid default values: {0}")]
    Value(#[from] ValueError),

    /// A default-value provider failed.
    #[error("failed to load default values for {command}: {source}")]
    Defaults {
        command: String,
        #[source]
        source: ExecuteError,
    },

    /// A service provider failed to initialize.
    #[error("failed to initialize service {service}: {source}")]
    ServiceInit {
        service: String,
        #[source]
        source: ExecuteError,
    },

    /// The configured default command is not registered.
    #[error("unknown default command: {0}")]
    UnknownDefaultCommand(String),
}

/// Convenience alias for results with [`RunnerError`].
pub type Result<T> = std::result::Result<T, RunnerError>;
