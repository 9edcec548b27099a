//! File format detection and (de)serialization by extension.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Picks the format from the file extension (`.yaml`, `.yml` or `.json`,
    /// case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use command_resolve_config::Format;
    ///
    /// assert_eq!(Format::from_path("cli.yml").unwrap(), Format::Yaml);
    /// assert_eq!(Format::from_path("defaults.JSON").unwrap(), Format::Json);
    /// assert!(Format::from_path("schema.toml").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ConfigError::UnsupportedFormat) for any
    /// other extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parses `contents` in this format.
    pub fn parse<T: DeserializeOwned>(self, contents: &str) -> Result<T> {
        Ok(match self {
            Self::Yaml => serde_yaml::from_str(contents)?,
            Self::Json => serde_json::from_str(contents)?,
        })
    }
}

/// Reads a file, choosing the format from its extension.
pub(crate) fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = Format::from_path(path)?;
    debug!(path = %path.display(), ?format, "Reading configuration file");
    let reader = BufReader::new(File::open(path)?);
    Ok(match format {
        Format::Yaml => serde_yaml::from_reader(reader)?,
        Format::Json => serde_json::from_reader(reader)?,
    })
}

/// Writes a file, choosing the format from its extension.
pub(crate) fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = Format::from_path(path)?;
    let writer = BufWriter::new(File::create(path)?);
    match format {
        Format::Yaml => serde_yaml::to_writer(writer, value)?,
        Format::Json => serde_json::to_writer_pretty(writer, value)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path("a/b/schema.yaml").unwrap(), Format::Yaml);
        assert_eq!(Format::from_path("schema.YML").unwrap(), Format::Yaml);
        assert_eq!(Format::from_path("schema.json").unwrap(), Format::Json);
    }

    #[test]
    fn test_unsupported_format() {
        let err = Format::from_path("schema").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
        assert!(Format::from_path("schema.toml").is_err());
    }

    #[test]
    fn test_parse_both_formats() {
        let yaml: Vec<i64> = Format::Yaml.parse("[1, 2]").unwrap();
        let json: Vec<i64> = Format::Json.parse("[1, 2]").unwrap();
        assert_eq!(yaml, json);
        assert!(Format::Json.parse::<Vec<i64>>("- 1").is_err());
    }
}
