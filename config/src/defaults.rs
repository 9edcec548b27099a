//! External default values read from a file.
//!
//! A defaults file supplies values per command name plus a flat table of
//! configuration values. Sub-commands that enable configuration pick up any
//! configuration value whose key one of their primitives declares.
//!
//! # Example YAML
//!
//! ```yaml
//! commands:
//!   deploy:
//!     replicas: 3
//!     target:
//!       zone: eu-1
//! configuration:
//!   deploy.region: eu-west
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use command_resolve_core::{
    ArgumentType, ArgumentValue, ArgumentValues, CommandRef, OptionArgument, SubCommand,
    merge_argument_values,
};
use command_resolve_engine::{DefaultValueProvider, ExecuteError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::format::{read_file, write_file};

/// Contents of a defaults file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsFile {
    /// Value trees keyed by command name. Group members use their own name.
    #[serde(default)]
    pub commands: BTreeMap<String, ArgumentValues>,
    /// Values keyed by configuration key.
    #[serde(default)]
    pub configuration: BTreeMap<String, ArgumentValue>,
}

impl DefaultsFile {
    /// Loads defaults from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::ConfigError) if the file cannot be
    /// read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_file(path.as_ref())
    }

    /// Saves the defaults; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), self)
    }
}

/// [`DefaultValueProvider`] backed by a [`DefaultsFile`].
///
/// Per-command values win over configuration values when both address the
/// same argument.
///
/// # Examples
///
/// ```
/// use command_resolve_config::{DefaultsFile, FileDefaults};
/// use command_resolve_core::*;
/// use command_resolve_engine::DefaultValueProvider;
///
/// let command = SubCommand::new("deploy")
///     .with_option(OptionArgument::primitive(
///         "region",
///         PrimitiveType::string().with_configuration_key("deploy.region"),
///     ))
///     .with_configuration();
///
/// let mut file = DefaultsFile::default();
/// file.configuration.insert("deploy.region".into(), "eu-west".into());
///
/// let defaults = FileDefaults::new(file);
/// let values = defaults.default_values(CommandRef::Sub(&command)).unwrap().unwrap();
/// assert_eq!(values["region"], ArgumentValue::from("eu-west"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileDefaults {
    file: DefaultsFile,
}

impl FileDefaults {
    pub fn new(file: DefaultsFile) -> Self {
        Self { file }
    }

    /// Loads a defaults file and wraps it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        DefaultsFile::load(path).map(Self::new)
    }

    pub fn file(&self) -> &DefaultsFile {
        &self.file
    }
}

impl DefaultValueProvider for FileDefaults {
    fn default_values(
        &self,
        command: CommandRef<'_>,
    ) -> std::result::Result<Option<ArgumentValues>, ExecuteError> {
        let mut values = self
            .file
            .commands
            .get(command.name())
            .cloned()
            .unwrap_or_default();

        if let CommandRef::Sub(sub) = command {
            if sub.enable_configuration && !self.file.configuration.is_empty() {
                let configured = configuration_values(sub, &self.file.configuration);
                debug!(command = %sub.name, count = configured.len(), "Applying configuration values");
                values = merge_argument_values(&values, &configured)?;
            }
        }

        Ok((!values.is_empty()).then_some(values))
    }
}

/// Places configuration values at the arguments declaring their keys.
fn configuration_values(
    command: &SubCommand,
    configuration: &BTreeMap<String, ArgumentValue>,
) -> ArgumentValues {
    let mut values = ArgumentValues::new();
    for positional in &command.positionals {
        let key = positional.value_type.configuration_key.as_deref();
        if let Some(value) = key.and_then(|k| configuration.get(k)) {
            values.insert(positional.name.clone(), value.clone());
        }
    }
    for option in &command.options {
        if let Some(value) = option_configuration(option, configuration) {
            values.insert(option.name.clone(), value);
        }
    }
    values
}

/// Configuration value tree for one option. Repeated complex options get a
/// single element.
fn option_configuration(
    option: &OptionArgument,
    configuration: &BTreeMap<String, ArgumentValue>,
) -> Option<ArgumentValue> {
    match &option.value_type {
        ArgumentType::Primitive(primitive) => primitive
            .configuration_key
            .as_deref()
            .and_then(|key| configuration.get(key))
            .cloned(),
        ArgumentType::Complex(complex) => {
            let fields: BTreeMap<String, ArgumentValue> = complex
                .properties
                .iter()
                .filter_map(|p| option_configuration(p, configuration).map(|v| (p.name.clone(), v)))
                .collect();
            if fields.is_empty() {
                return None;
            }
            let object = ArgumentValue::Object(fields);
            Some(if option.is_array {
                ArgumentValue::List(vec![object])
            } else {
                object
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use command_resolve_core::{GlobalCommand, PositionalArgument, PrimitiveType};

    use super::*;

    fn configured_command() -> SubCommand {
        SubCommand::new("deploy")
            .with_option(OptionArgument::primitive(
                "region",
                PrimitiveType::string().with_configuration_key("deploy.region"),
            ))
            .with_option(
                OptionArgument::complex(
                    "target",
                    vec![
                        OptionArgument::primitive(
                            "zone",
                            PrimitiveType::string().with_configuration_key("deploy.zone"),
                        ),
                        OptionArgument::primitive("weight", PrimitiveType::integer()),
                    ],
                )
                .array(),
            )
            .with_positional(PositionalArgument::new(
                "service",
                PrimitiveType::string().with_configuration_key("deploy.service"),
            ))
            .with_configuration()
    }

    fn configuration(entries: &[(&str, ArgumentValue)]) -> DefaultsFile {
        DefaultsFile {
            commands: BTreeMap::new(),
            configuration: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_configuration_placed_at_key_paths() {
        let command = configured_command();
        let defaults = FileDefaults::new(configuration(&[
            ("deploy.region", "eu-west".into()),
            ("deploy.zone", "b".into()),
            ("deploy.service", "api".into()),
            ("unrelated", true.into()),
        ]));

        let values = defaults
            .default_values(CommandRef::Sub(&command))
            .unwrap()
            .unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values["region"], ArgumentValue::from("eu-west"));
        assert_eq!(values["service"], ArgumentValue::from("api"));

        let ArgumentValue::List(targets) = &values["target"] else {
            panic!("target should be a list");
        };
        let ArgumentValue::Object(target) = &targets[0] else {
            panic!("target element should be an object");
        };
        assert_eq!(target["zone"], ArgumentValue::from("b"));
        assert!(!target.contains_key("weight"));
    }

    #[test]
    fn test_command_values_win_over_configuration() {
        let command = configured_command();
        let mut file = configuration(&[("deploy.region", "eu-west".into())]);
        let mut own = ArgumentValues::new();
        own.insert("region".into(), "us-east".into());
        file.commands.insert("deploy".into(), own);

        let values = FileDefaults::new(file)
            .default_values(CommandRef::Sub(&command))
            .unwrap()
            .unwrap();
        assert_eq!(values["region"], ArgumentValue::from("us-east"));
    }

    #[test]
    fn test_configuration_ignored_when_disabled() {
        let command = SubCommand::new("deploy").with_option(OptionArgument::primitive(
            "region",
            PrimitiveType::string(),
        ));
        let defaults = FileDefaults::new(configuration(&[("deploy.region", "eu-west".into())]));
        assert!(defaults.default_values(CommandRef::Sub(&command)).unwrap().is_none());
    }

    #[test]
    fn test_global_command_values() {
        let help = GlobalCommand::new("help");
        let mut file = DefaultsFile::default();
        let mut values = ArgumentValues::new();
        values.insert("topic".into(), "intro".into());
        file.commands.insert("help".into(), values.clone());

        let defaults = FileDefaults::new(file);
        assert_eq!(defaults.default_values(CommandRef::Global(&help)).unwrap(), Some(values));
        assert!(defaults.file().configuration.is_empty());
    }

    #[test]
    fn test_incompatible_values_are_an_error() {
        let command = configured_command();
        let mut file = configuration(&[("deploy.region", "eu-west".into())]);
        let mut own = ArgumentValues::new();
        own.insert("region".into(), ArgumentValue::Object(BTreeMap::new()));
        file.commands.insert("deploy".into(), own);

        let err = FileDefaults::new(file)
            .default_values(CommandRef::Sub(&command))
            .unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn test_defaults_file_from_yaml() {
        let yaml = r#"
commands:
  deploy:
    replicas: 3
    target:
      - zone: a
configuration:
  deploy.region: eu-west
"#;
        let file: DefaultsFile = crate::Format::Yaml.parse(yaml).unwrap();
        assert_eq!(file.commands["deploy"]["replicas"], ArgumentValue::Integer(3));
        assert_eq!(file.configuration["deploy.region"], ArgumentValue::from("eu-west"));
    }
}
