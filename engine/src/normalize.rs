//! Canonical form for global command flags.
//!
//! Only the first token of a buffer is inspected. `-x=value` and
//! `--name=value` naming a known command become the pair `--name`, `value`;
//! anything else is left as it is. The scanner normalizes before every match
//! attempt because a buffer's first token changes as tokens are consumed.

use std::collections::VecDeque;

use command_resolve_core::CommandTable;

/// Rewrites the first token of `tokens` into canonical `--name value` form.
///
/// Returns `true` if the buffer was changed.
///
/// # Examples
///
/// ```
/// use std::collections::VecDeque;
///
/// use command_resolve_core::*;
/// use command_resolve_engine::normalize_front;
///
/// let commands = vec![Command::Global(GlobalCommand::new("output").with_alias('o'))];
/// let table = CommandTable::from_commands(&commands).unwrap();
///
/// let mut tokens: VecDeque<String> = ["-o=out.json", "build"].map(String::from).into();
/// assert!(normalize_front(&mut tokens, &table));
/// assert_eq!(tokens, ["--output", "out.json", "build"]);
///
/// // Unknown aliases and bare flags are untouched
/// let mut tokens: VecDeque<String> = ["-x=1"].map(String::from).into();
/// assert!(!normalize_front(&mut tokens, &table));
/// let mut tokens: VecDeque<String> = ["-o"].map(String::from).into();
/// assert!(!normalize_front(&mut tokens, &table));
/// ```
pub fn normalize_front(tokens: &mut VecDeque<String>, table: &CommandTable<'_>) -> bool {
    let Some(first) = tokens.front() else {
        return false;
    };
    let Some((flag, value)) = first.split_once('=') else {
        return false;
    };

    let name = if let Some(long) = flag.strip_prefix("--") {
        table.global(long).map(|command| command.name())
    } else if let Some(short) = flag.strip_prefix('-') {
        single_char(short)
            .and_then(|alias| table.alias(alias))
            .map(|command| command.name())
    } else {
        None
    };

    let Some(name) = name else {
        return false;
    };

    let value = value.to_string();
    tokens[0] = format!("--{name}");
    tokens.insert(1, value);
    true
}

/// The only character of `s`, if it has exactly one.
pub(crate) fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use command_resolve_core::{Command, GlobalCommand, SubCommand};

    use super::*;

    fn tokens(items: &[&str]) -> VecDeque<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn commands() -> Vec<Command> {
        vec![
            Command::Global(GlobalCommand::new("config").with_alias('c')),
            Command::Sub(SubCommand::new("build")),
        ]
    }

    #[test]
    fn test_long_form_with_value_is_split() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let mut buffer = tokens(&["--config=a=b", "x"]);
        assert!(normalize_front(&mut buffer, &table));
        assert_eq!(buffer, tokens(&["--config", "a=b", "x"]));
    }

    #[test]
    fn test_only_first_token_is_inspected() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let mut buffer = tokens(&["build", "-c=1"]);
        assert!(!normalize_front(&mut buffer, &table));
        assert_eq!(buffer, tokens(&["build", "-c=1"]));
    }

    #[test]
    fn test_empty_value_is_kept_as_token() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let mut buffer = tokens(&["-c="]);
        assert!(normalize_front(&mut buffer, &table));
        assert_eq!(buffer, tokens(&["--config", ""]));
    }

    #[test]
    fn test_sub_command_names_are_not_flags() {
        let commands = commands();
        let table = CommandTable::from_commands(&commands).unwrap();
        let mut buffer = tokens(&["--build=1"]);
        assert!(!normalize_front(&mut buffer, &table));
        assert!(!normalize_front(&mut VecDeque::new(), &table));
    }
}
