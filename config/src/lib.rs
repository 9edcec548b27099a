//! Schema and default-value files for command resolution.
//!
//! - [`SchemaFile`] declares commands, service tiers and a default command.
//! - [`DefaultsFile`] holds per-command value trees and configuration values.
//! - [`FileDefaults`] serves a defaults file to the engine's
//!   [`Runner`](command_resolve_engine::Runner).
//!
//! Both files are YAML (`.yaml`, `.yml`) or JSON (`.json`), chosen by
//! extension.
//!
//! # Example
//!
//! ```
//! use command_resolve_config::{Format, SchemaFile};
//!
//! let schema = SchemaFile::from_str_with(
//!     r#"{"commands": [{"kind": "sub", "name": "status"}], "default_command": "status"}"#,
//!     Format::Json,
//! )
//! .unwrap();
//! let registry = schema.registry().unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

mod defaults;
mod error;
mod format;
mod schema;

pub use defaults::{DefaultsFile, FileDefaults};
pub use error::{ConfigError, Result};
pub use format::Format;
pub use schema::{SchemaFile, ServiceDecl};
