//! Command clause discovery.
//!
//! A scan walks token sequences left to right looking for a known command.
//! Tokens before a match are unused; tokens after it are the clause's own
//! arguments. Two modes share the walk:
//!
//! - [`scan_modifiers`] finds any number of modifier flags per sequence. The
//!   tokens between two matches belong to the earlier one.
//! - [`scan_command`] finds the single active command: a global flag, a
//!   sub-command, or a group member written `group:member` or `group member`.
//!   Once it is found, later sequences are left untouched.
//!
//! Scanning never fails. Every input token ends up as a matched command
//! name, in a clause, or in an unused sequence.

use std::collections::VecDeque;

use command_resolve_core::{CommandRef, CommandTable, GroupCommand};
use tracing::debug;

use crate::normalize::{normalize_front, single_char};

/// A discovered command with the tokens left for it to parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause<'a> {
    pub command: CommandRef<'a>,
    /// Owning group, for commands addressed as group members.
    pub group: Option<&'a GroupCommand>,
    pub tokens: Vec<String>,
}

impl<'a> Clause<'a> {
    /// Creates a clause for a command outside any group.
    pub fn new(command: CommandRef<'a>, tokens: Vec<String>) -> Self {
        Self {
            command,
            group: None,
            tokens,
        }
    }
}

/// Clauses found by a scan pass, plus the token sequences nobody claimed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult<'a> {
    pub clauses: Vec<Clause<'a>>,
    /// Unclaimed sequences in input order; never contains an empty sequence.
    pub unused: Vec<Vec<String>>,
}

impl ScanResult<'_> {
    fn push_unused(&mut self, tokens: Vec<String>) {
        if !tokens.is_empty() {
            self.unused.push(tokens);
        }
    }
}

/// Scans for modifier commands, allowing several per sequence.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::scan_modifiers;
///
/// let verbose = GlobalModifierCommand::new(GlobalCommand::new("verbose").with_alias('v'), 1);
/// let color = GlobalModifierCommand::new(GlobalCommand::new("color"), 2);
/// let table = CommandTable::from_modifiers([&verbose, &color]).unwrap();
///
/// let tokens = ["build", "-v", "--color", "never", "x"].map(String::from).to_vec();
/// let result = scan_modifiers(vec![tokens], &table);
///
/// assert_eq!(result.unused, vec![vec!["build".to_string()]]);
/// assert_eq!(result.clauses[0].command.name(), "verbose");
/// assert!(result.clauses[0].tokens.is_empty());
/// assert_eq!(result.clauses[1].tokens, ["never", "x"]);
/// ```
pub fn scan_modifiers<'a>(sequences: Vec<Vec<String>>, table: &CommandTable<'a>) -> ScanResult<'a> {
    let mut result = ScanResult::default();

    for sequence in sequences {
        let (found, unused) = scan_sequence(sequence.into(), table, false);
        result.push_unused(unused);

        let Some(mut current) = found else {
            continue;
        };
        loop {
            let rest = std::mem::take(&mut current.tokens);
            let (next, between) = scan_sequence(rest.into(), table, false);
            current.tokens = between;
            result.clauses.push(current);
            match next {
                Some(clause) => current = clause,
                None => break,
            }
        }
    }

    result
}

/// Scans for the single active (non-modifier) command.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::scan_command;
///
/// let commands = vec![Command::Group(GroupCommand::new("db").with_member(SubCommand::new("seed")))];
/// let table = CommandTable::from_commands(&commands).unwrap();
///
/// let result = scan_command(vec![["db", "seed", "--count", "3"].map(String::from).to_vec()], &table);
/// let clause = &result.clauses[0];
/// assert_eq!(clause.command.name(), "seed");
/// assert_eq!(clause.group.map(|g| g.name.as_str()), Some("db"));
/// assert_eq!(clause.tokens, ["--count", "3"]);
/// assert!(result.unused.is_empty());
/// ```
pub fn scan_command<'a>(sequences: Vec<Vec<String>>, table: &CommandTable<'a>) -> ScanResult<'a> {
    let mut result = ScanResult::default();

    for sequence in sequences {
        if !result.clauses.is_empty() {
            result.push_unused(sequence);
            continue;
        }
        let (found, unused) = scan_sequence(sequence.into(), table, true);
        result.push_unused(unused);
        result.clauses.extend(found);
    }

    result
}

/// Scans one sequence up to its first match.
fn scan_sequence<'a>(
    mut buffer: VecDeque<String>,
    table: &CommandTable<'a>,
    sub_commands: bool,
) -> (Option<Clause<'a>>, Vec<String>) {
    let mut unused = Vec::new();

    loop {
        normalize_front(&mut buffer, table);
        let Some(token) = buffer.pop_front() else {
            return (None, unused);
        };

        if let Some(command) = match_flag(&token, table) {
            debug!(command = command.name(), skipped = unused.len(), "Matched command flag");
            return (Some(Clause::new(command, buffer.into())), unused);
        }

        if sub_commands && !token.starts_with('-') {
            if let Some((group, member)) = table.member(&token) {
                debug!(group = %group.name, command = %member.name, "Matched group member");
                let clause = Clause {
                    command: CommandRef::Sub(member),
                    group: Some(group),
                    tokens: buffer.into(),
                };
                return (Some(clause), unused);
            }

            if table.is_group(&token) {
                let joined = buffer.front().map(|next| format!("{token}:{next}"));
                if let Some((group, member)) = joined.and_then(|name| table.member(&name)) {
                    buffer.pop_front();
                    debug!(group = %group.name, command = %member.name, "Matched group member");
                    let clause = Clause {
                        command: CommandRef::Sub(member),
                        group: Some(group),
                        tokens: buffer.into(),
                    };
                    return (Some(clause), unused);
                }
                debug!(group = %token, "Group without a valid member");
            } else if let Some(sub) = table.sub_command(&token) {
                debug!(command = %sub.name, skipped = unused.len(), "Matched sub-command");
                return (Some(Clause::new(CommandRef::Sub(sub), buffer.into())), unused);
            }
        }

        unused.push(token);
    }
}

/// Looks a `--name` or `-x` token up in the table.
fn match_flag<'a>(token: &str, table: &CommandTable<'a>) -> Option<CommandRef<'a>> {
    if let Some(name) = token.strip_prefix("--") {
        return table.global(name);
    }
    token
        .strip_prefix('-')
        .and_then(single_char)
        .and_then(|alias| table.alias(alias))
}

#[cfg(test)]
mod tests {
    use command_resolve_core::{
        Command, GlobalArgument, GlobalCommand, GlobalModifierCommand, PrimitiveType, SubCommand,
    };

    use super::*;

    fn seq(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn commands() -> Vec<Command> {
        vec![
            Command::Sub(SubCommand::new("build")),
            Command::Group(
                GroupCommand::new("db")
                    .with_member(SubCommand::new("migrate"))
                    .with_member(SubCommand::new("seed")),
            ),
            Command::Global(GlobalCommand::new("help").with_alias('h')),
        ]
    }

    fn modifiers() -> Vec<GlobalModifierCommand> {
        vec![
            GlobalModifierCommand::new(GlobalCommand::new("verbose").with_alias('v'), 10),
            GlobalModifierCommand::new(
                GlobalCommand::new("log-level")
                    .with_alias('l')
                    .with_argument(GlobalArgument::new("level", PrimitiveType::string())),
                20,
            ),
        ]
    }

    /// Every input token is the matched name, in a clause, or unused.
    fn assert_conserved(input: &[&str], result: &ScanResult<'_>, matched_names: usize) {
        let accounted = result.clauses.iter().map(|c| c.tokens.len()).sum::<usize>()
            + result.unused.iter().map(Vec::len).sum::<usize>()
            + matched_names;
        assert_eq!(accounted, input.len());
    }

    #[test]
    fn test_scan_command_group_colon_syntax() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let input = ["x", "db:migrate", "--to", "5"];
        let result = scan_command(vec![seq(&input)], &table);

        assert_eq!(result.clauses.len(), 1);
        assert_eq!(result.clauses[0].command.name(), "migrate");
        assert_eq!(result.clauses[0].tokens, seq(&["--to", "5"]));
        assert_eq!(result.unused, vec![seq(&["x"])]);
        assert_conserved(&input, &result, 1);
    }

    #[test]
    fn test_scan_command_bare_group_is_unused() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let result = scan_command(vec![seq(&["db", "nope", "build", "-x"])], &table);

        assert_eq!(result.clauses[0].command.name(), "build");
        assert_eq!(result.clauses[0].tokens, seq(&["-x"]));
        assert_eq!(result.unused, vec![seq(&["db", "nope"])]);
    }

    #[test]
    fn test_scan_command_first_sequence_wins() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let result = scan_command(
            vec![seq(&["a"]), seq(&["build", "1"]), seq(&["db", "seed"]), seq(&[])],
            &table,
        );

        assert_eq!(result.clauses.len(), 1);
        assert_eq!(result.clauses[0].command.name(), "build");
        assert_eq!(result.unused, vec![seq(&["a"]), seq(&["db", "seed"])]);
    }

    #[test]
    fn test_scan_command_global_alias() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let result = scan_command(vec![seq(&["-h", "build"])], &table);

        assert_eq!(result.clauses[0].command.name(), "help");
        assert_eq!(result.clauses[0].tokens, seq(&["build"]));
    }

    #[test]
    fn test_scan_modifiers_chains_and_folds_leftovers() {
        let modifiers = modifiers();
        let table = CommandTable::from_modifiers(&modifiers).unwrap();
        let input = ["build", "--log-level", "debug", "x", "--verbose", "y", "z"];
        let result = scan_modifiers(vec![seq(&input)], &table);

        let names: Vec<_> = result.clauses.iter().map(|c| c.command.name()).collect();
        assert_eq!(names, ["log-level", "verbose"]);
        assert_eq!(result.clauses[0].tokens, seq(&["debug", "x"]));
        assert_eq!(result.clauses[1].tokens, seq(&["y", "z"]));
        assert_eq!(result.unused, vec![seq(&["build"])]);
        assert_conserved(&input, &result, 2);
    }

    #[test]
    fn test_scan_modifiers_normalizes_each_match() {
        let modifiers = modifiers();
        let table = CommandTable::from_modifiers(&modifiers).unwrap();
        let result = scan_modifiers(vec![seq(&["-v", "-l=info", "rest"])], &table);

        assert_eq!(result.clauses[1].command.name(), "log-level");
        assert_eq!(result.clauses[1].tokens, seq(&["info", "rest"]));
    }

    #[test]
    fn test_scan_modifiers_repeated_flag() {
        let modifiers = modifiers();
        let table = CommandTable::from_modifiers(&modifiers).unwrap();
        let result = scan_modifiers(vec![seq(&["-v", "-v"]), seq(&["a", "b"])], &table);

        assert_eq!(result.clauses.len(), 2);
        assert!(result.clauses.iter().all(|c| c.tokens.is_empty()));
        assert_eq!(result.unused, vec![seq(&["a", "b"])]);
    }

    #[test]
    fn test_modifier_scan_ignores_sub_commands() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let result = scan_modifiers(vec![seq(&["build", "db:seed"])], &table);

        assert!(result.clauses.is_empty());
        assert_eq!(result.unused, vec![seq(&["build", "db:seed"])]);
    }
}
