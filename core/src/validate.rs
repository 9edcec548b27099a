//! Command declaration validation.
//!
//! Catches structural errors in declared commands, such as duplicate option
//! names, illegal argument names, over-deep complex options and misplaced
//! vararg positionals, before any tokens are resolved against them. These
//! are program bugs rather than user mistakes, so registration refuses the
//! command outright.
//!
//! # Examples
//!
//! ```
//! use command_resolve_core::*;
//!
//! let ok = Command::Sub(
//!     SubCommand::new("run").with_option(OptionArgument::primitive("fast", PrimitiveType::boolean())),
//! );
//! assert!(validate_command(&ok).is_empty());
//!
//! // Invalid: argument names must not start with a dash
//! let bad = Command::Sub(
//!     SubCommand::new("run").with_option(OptionArgument::primitive("-fast", PrimitiveType::boolean())),
//! );
//! assert_eq!(validate_command(&bad), vec![SchemaError::InvalidName("-fast".to_string())]);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{
    ArgumentType, Command, GlobalCommand, GroupCommand, MAX_NESTING_DEPTH, OptionArgument,
    PrimitiveType, SubCommand,
};

/// Command declaration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Name contains characters outside `[A-Za-z0-9_-]` or starts with `-`.
    #[error("invalid name: {0}")]
    InvalidName(String),
    /// Short alias is not a valid single name or character.
    #[error("invalid short alias: {0}")]
    InvalidAlias(String),
    /// Two commands share a name or joined `group:member` name.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// Two global commands share a short alias.
    #[error("duplicate command alias: -{0}")]
    DuplicateCommandAlias(char),
    /// Two options or properties in the same scope share a name or alias.
    #[error("duplicate option in scope: {0}")]
    DuplicateOption(String),
    /// An option and a positional share a name.
    #[error("duplicate argument name: {0}")]
    DuplicateArgument(String),
    /// A complex option declares no properties.
    #[error("complex option has no properties: {0}")]
    EmptyComplexOption(String),
    /// Complex options nest deeper than [`MAX_NESTING_DEPTH`].
    #[error("complex option nesting exceeds {MAX_NESTING_DEPTH}: {0}")]
    NestingTooDeep(String),
    /// A vararg flag is set on a positional that is not the last one.
    #[error("only the last positional may be vararg: {0}")]
    MisplacedVararg(String),
    /// A configuration key is declared on a command without configuration.
    #[error("configuration is not enabled for command {command}: {key}")]
    ConfigurationDisabled { command: String, key: String },
    /// Two values of the same command share a configuration key.
    #[error("duplicate configuration key: {0}")]
    DuplicateConfigurationKey(String),
    /// A group command has no members.
    #[error("group command has no members: {0}")]
    EmptyGroup(String),
}

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: compile-time constant pattern, covered by tests.
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").expect("static regex must compile")
});

/// Returns `true` if `name` is a legal command, argument or property name.
///
/// # Examples
///
/// ```
/// use command_resolve_core::is_valid_name;
///
/// assert!(is_valid_name("log-level"));
/// assert!(is_valid_name("max_depth2"));
/// assert!(!is_valid_name("-v"));
/// assert!(!is_valid_name("a.b"));
/// assert!(!is_valid_name(""));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Validates a single command declaration.
///
/// Returns at most one error per scope, stopping at the first problem found.
pub fn validate_command(command: &Command) -> Vec<SchemaError> {
    match command {
        Command::Sub(sub) => validate_sub_command(sub),
        Command::Group(group) => validate_group(group),
        Command::Global(global) => validate_global(global),
        Command::Modifier(modifier) => validate_global(&modifier.command),
    }
}

fn validate_command_name(name: &str) -> Vec<SchemaError> {
    if name.trim().is_empty() {
        return vec![SchemaError::EmptyCommandName];
    }
    if !is_valid_name(name) {
        return vec![SchemaError::InvalidName(name.to_string())];
    }
    Vec::new()
}

fn validate_group(group: &GroupCommand) -> Vec<SchemaError> {
    let mut errors = validate_command_name(&group.name);
    if !errors.is_empty() {
        return errors;
    }

    if group.members.is_empty() {
        errors.push(SchemaError::EmptyGroup(group.name.clone()));
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for member in &group.members {
        if !seen.insert(member.name.as_str()) {
            errors.push(SchemaError::DuplicateCommand(group.joined_name(member)));
            return errors;
        }
        errors.extend(validate_sub_command(member));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_global(global: &GlobalCommand) -> Vec<SchemaError> {
    let mut errors = validate_command_name(&global.name);
    if !errors.is_empty() {
        return errors;
    }

    if let Some(alias) = global.short_alias {
        if !alias.is_ascii_alphanumeric() {
            errors.push(SchemaError::InvalidAlias(alias.to_string()));
            return errors;
        }
    }

    if let Some(argument) = &global.argument {
        if !is_valid_name(&argument.name) {
            errors.push(SchemaError::InvalidName(argument.name.clone()));
            return errors;
        }
        if let Some(key) = &argument.value_type.configuration_key {
            errors.push(SchemaError::ConfigurationDisabled {
                command: global.name.clone(),
                key: key.clone(),
            });
        }
    }

    errors
}

fn validate_sub_command(sub: &SubCommand) -> Vec<SchemaError> {
    let mut errors = validate_command_name(&sub.name);
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_options(&sub.options, &sub.name, 1));
    if !errors.is_empty() {
        return errors;
    }

    let mut names: HashSet<&str> = sub.options.iter().map(|o| o.name.as_str()).collect();
    let last = sub.positionals.len().saturating_sub(1);
    for (i, positional) in sub.positionals.iter().enumerate() {
        if !is_valid_name(&positional.name) {
            errors.push(SchemaError::InvalidName(positional.name.clone()));
            return errors;
        }
        if !names.insert(positional.name.as_str()) {
            errors.push(SchemaError::DuplicateArgument(positional.name.clone()));
            return errors;
        }
        if positional.is_vararg() && i != last {
            errors.push(SchemaError::MisplacedVararg(positional.name.clone()));
            return errors;
        }
    }

    let mut keys: Vec<&str> = Vec::new();
    collect_configuration_keys(&sub.options, &mut keys);
    keys.extend(
        sub.positionals
            .iter()
            .filter_map(|p| p.value_type.configuration_key.as_deref()),
    );

    let mut seen_keys: HashSet<&str> = HashSet::new();
    for key in keys {
        if !sub.enable_configuration {
            errors.push(SchemaError::ConfigurationDisabled {
                command: sub.name.clone(),
                key: key.to_string(),
            });
            return errors;
        }
        if !seen_keys.insert(key) {
            errors.push(SchemaError::DuplicateConfigurationKey(key.to_string()));
            return errors;
        }
    }

    errors
}

fn validate_options(options: &[OptionArgument], scope: &str, depth: usize) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for option in options {
        let path = format!("{scope}.{}", option.name);

        if !is_valid_name(&option.name) {
            errors.push(SchemaError::InvalidName(option.name.clone()));
            return errors;
        }
        if !seen.insert(option.name.as_str()) {
            errors.push(SchemaError::DuplicateOption(path));
            return errors;
        }

        if let Some(alias) = &option.short_alias {
            if !is_valid_name(alias) {
                errors.push(SchemaError::InvalidAlias(alias.clone()));
                return errors;
            }
            if !seen.insert(alias.as_str()) {
                errors.push(SchemaError::DuplicateOption(format!("{scope}.{alias}")));
                return errors;
            }
        }

        if let ArgumentType::Complex(complex) = &option.value_type {
            if depth >= MAX_NESTING_DEPTH {
                errors.push(SchemaError::NestingTooDeep(path));
                return errors;
            }
            if complex.properties.is_empty() {
                errors.push(SchemaError::EmptyComplexOption(path));
                return errors;
            }
            errors.extend(validate_options(&complex.properties, &path, depth + 1));
            if !errors.is_empty() {
                return errors;
            }
        }
    }

    errors
}

fn collect_configuration_keys<'a>(options: &'a [OptionArgument], keys: &mut Vec<&'a str>) {
    for option in options {
        match &option.value_type {
            ArgumentType::Primitive(PrimitiveType {
                configuration_key: Some(key),
                ..
            }) => keys.push(key),
            ArgumentType::Primitive(_) => {}
            ArgumentType::Complex(complex) => collect_configuration_keys(&complex.properties, keys),
        }
    }
}
