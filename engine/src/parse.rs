//! Clause parsing: populate, merge external defaults, validate.

use command_resolve_core::{
    ArgumentValues, CheckedValues, CommandRef, GroupCommand, InvalidArgument, ValueError,
    check_global_values, check_sub_command_values, merge_argument_values,
};
use tracing::debug;

use crate::populate::{populate_global, populate_sub_command};
use crate::scanner::Clause;

/// A command with validated values, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand<'a> {
    pub command: CommandRef<'a>,
    pub group: Option<&'a GroupCommand>,
    pub values: ArgumentValues,
    /// Clause tokens the command did not consume.
    pub unused: Vec<String>,
}

impl ParsedCommand<'_> {
    /// `group:member` for group members, the plain name otherwise.
    pub fn display_name(&self) -> String {
        match self.group {
            Some(group) => format!("{}:{}", group.name, self.command.name()),
            None => self.command.name().to_string(),
        }
    }

    /// Execute priority of a modifier command.
    pub fn execute_priority(&self) -> Option<i32> {
        self.command.execute_priority()
    }
}

/// Result of parsing one clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<'a> {
    Parsed(ParsedCommand<'a>),
    /// User-input errors; parsing stopped.
    Invalid(Vec<InvalidArgument>),
}

/// Parses a clause into validated values.
///
/// Value precedence, highest first: clause tokens, `external` defaults,
/// declared defaults.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::{Clause, ParseOutcome, parse_clause};
///
/// let command = SubCommand::new("scale")
///     .with_option(OptionArgument::primitive("replicas", PrimitiveType::integer()))
///     .with_option(OptionArgument::primitive("zone", PrimitiveType::string()).with_default("a"));
///
/// let mut external = ArgumentValues::new();
/// external.insert("replicas".into(), 2_i64.into());
///
/// let clause = Clause::new(CommandRef::Sub(&command), vec![]);
/// let ParseOutcome::Parsed(parsed) = parse_clause(clause, Some(&external)).unwrap() else {
///     panic!("expected values");
/// };
/// assert_eq!(parsed.values["replicas"], ArgumentValue::Integer(2));
/// assert_eq!(parsed.values["zone"], ArgumentValue::from("a"));
///
/// let clause = Clause::new(CommandRef::Sub(&command), vec!["--replicas=two".into()]);
/// let ParseOutcome::Invalid(invalid) = parse_clause(clause, None).unwrap() else {
///     panic!("expected an invalid argument");
/// };
/// assert_eq!(invalid[0].reason, InvalidArgumentReason::IncorrectValueType);
/// ```
///
/// # Errors
///
/// Returns a [`ValueError`] if external defaults cannot be merged with the
/// parsed values.
pub fn parse_clause<'a>(
    clause: Clause<'a>,
    external: Option<&ArgumentValues>,
) -> Result<ParseOutcome<'a>, ValueError> {
    let populated = match clause.command {
        CommandRef::Sub(sub) => populate_sub_command(sub, &clause.tokens),
        CommandRef::Global(global) => populate_global(global, &clause.tokens),
        CommandRef::Modifier(modifier) => populate_global(&modifier.command, &clause.tokens),
    };
    if !populated.is_valid() {
        return Ok(ParseOutcome::Invalid(populated.invalid));
    }

    let merged = match external {
        Some(defaults) => merge_argument_values(&populated.values, defaults)?,
        None => populated.values,
    };

    finish(clause.command, clause.group, &merged, populated.unused)
}

/// Resolves a command that no token names, from defaults alone.
///
/// Nothing is populated, so a boolean argument is not implied `true`: it
/// takes the `external` value, then its declared default, else stays absent.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::{ParseOutcome, parse_unnamed};
///
/// let color = GlobalCommand::new("color")
///     .with_argument(GlobalArgument::new("enabled", PrimitiveType::boolean()));
///
/// let mut external = ArgumentValues::new();
/// external.insert("enabled".into(), false.into());
///
/// let ParseOutcome::Parsed(parsed) = parse_unnamed(CommandRef::Global(&color), None, Some(&external)).unwrap() else {
///     panic!("defaults are valid");
/// };
/// assert_eq!(parsed.values["enabled"], ArgumentValue::Boolean(false));
/// ```
///
/// # Errors
///
/// Returns a [`ValueError`] if `external` does not fit the declaration.
pub fn parse_unnamed<'a>(
    command: CommandRef<'a>,
    group: Option<&'a GroupCommand>,
    external: Option<&ArgumentValues>,
) -> Result<ParseOutcome<'a>, ValueError> {
    let values = external.cloned().unwrap_or_default();
    finish(command, group, &values, Vec::new())
}

fn finish<'a>(
    command: CommandRef<'a>,
    group: Option<&'a GroupCommand>,
    values: &ArgumentValues,
    unused: Vec<String>,
) -> Result<ParseOutcome<'a>, ValueError> {
    let CheckedValues { values, invalid } = match command {
        CommandRef::Sub(sub) => check_sub_command_values(sub, values)?,
        CommandRef::Global(global) => check_global_values(global, values),
        CommandRef::Modifier(modifier) => check_global_values(&modifier.command, values),
    };
    if !invalid.is_empty() {
        debug!(command = command.name(), invalid = invalid.len(), "Invalid arguments");
        return Ok(ParseOutcome::Invalid(invalid));
    }

    debug!(command = command.name(), values = ?values, "Parsed command");
    Ok(ParseOutcome::Parsed(ParsedCommand {
        command,
        group,
        values,
        unused,
    }))
}
