//! Command schema files.
//!
//! A schema file declares the commands a program accepts, its service tiers
//! and an optional default command.
//!
//! # Example YAML
//!
//! ```yaml
//! default_command: status
//! commands:
//!   - kind: sub
//!     name: status
//!   - kind: group
//!     name: db
//!     members:
//!       - name: migrate
//!         options:
//!           - name: steps
//!             type: primitive
//!             kind: integer
//!             is_optional: true
//! services:
//!   - name: logging
//!     priority: 10
//!     modifiers:
//!       - name: log-level
//!         short_alias: l
//!         execute_priority: 100
//!         argument:
//!           name: level
//!           kind: string
//! ```

use std::path::Path;

use command_resolve_core::{Command, CommandRegistry, GlobalModifierCommand};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::{Format, read_file, write_file};

/// A service tier declared in a schema file.
///
/// Its modifiers are kept out of the command registry and resolved before
/// the service is initialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub name: String,
    /// Higher tiers initialize first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<GlobalModifierCommand>,
}

/// Top-level schema file.
///
/// # Examples
///
/// ```
/// use command_resolve_config::{Format, SchemaFile};
///
/// let yaml = r#"
/// commands:
///   - kind: sub
///     name: status
///   - kind: global
///     name: help
///     short_alias: h
/// "#;
/// let schema: SchemaFile = Format::Yaml.parse(yaml).unwrap();
/// let registry = schema.registry().unwrap();
/// assert!(registry.find("help").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDecl>,
    /// Command run when the tokens name none; `group:member` for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_command: Option<String>,
}

impl SchemaFile {
    /// Loads a schema from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](crate::ConfigError::UnsupportedFormat)
    /// for unknown extensions, [`IoError`](crate::ConfigError::IoError) if the
    /// file cannot be read, or a parse error for malformed content.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_file(path.as_ref())
    }

    /// Parses a schema from a string in the given format.
    pub fn from_str_with(contents: &str, format: Format) -> Result<Self> {
        format.parse(contents)
    }

    /// Saves the schema; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), self)
    }

    /// Builds a registry from the declared commands.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`](crate::ConfigError::SchemaError) for the first
    /// malformed or conflicting command.
    pub fn registry(&self) -> Result<CommandRegistry> {
        Ok(CommandRegistry::with_commands(self.commands.iter().cloned())?)
    }

    /// Looks up a service tier by name.
    pub fn service(&self, name: &str) -> Option<&ServiceDecl> {
        self.services.iter().find(|s| s.name == name)
    }
}
