//! Option and positional population for sub-commands.
//!
//! Tokens drive a small state machine:
//!
//! | State                   | Token                 | Next                                   |
//! |-------------------------|-----------------------|----------------------------------------|
//! | `Empty`                 | known option path     | `OptionValueExpected` (or `Empty` with `=value`) |
//! | `Empty`                 | anything else         | next positional, else `Unused`         |
//! | `OptionValueExpected`   | value                 | `Empty`                                |
//! | any                     | rejected value / path | `Error`                                |
//! | `Error`                 | anything              | `Error`, token unused                  |
//!
//! Option paths address nested complex options: `--alpha.beta[1].gamma=x`.
//! The root segment is a long name (`--alpha`) or short alias (`-a`); deeper
//! segments match a property name or alias. An intermediate array without
//! an index addresses element 0. A leaf array without an index appends.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use command_resolve_core::{
    ArgumentPath, ArgumentValue, ArgumentValues, InvalidArgument, InvalidArgumentReason,
    MAX_ARRAY_SIZE, MAX_NESTING_DEPTH, OptionArgument, PathSegment, PrimitiveKind, SubCommand,
    parse_bool,
};
use regex::Regex;
use tracing::debug;

use super::Populated;

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: compile-time constant pattern, covered by tests.
    Regex::new(r"^([A-Za-z0-9_][A-Za-z0-9_-]*)(?:\[(\d+)\])?$").expect("static regex must compile")
});

/// Extracts option and positional values of a sub-command.
///
/// Unknown root options and surplus positionals are returned as unused.
/// The first invalid path or value stops population; it and every later
/// token are returned as unused.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::populate_sub_command;
///
/// let command = SubCommand::new("copy")
///     .with_option(OptionArgument::primitive("force", PrimitiveType::boolean()).with_alias("f"))
///     .with_positional(PositionalArgument::new("source", PrimitiveType::string()))
///     .with_positional(PositionalArgument::new("dest", PrimitiveType::string()));
///
/// let tokens = ["a.txt", "-f", "b.txt", "c.txt"].map(String::from);
/// let populated = populate_sub_command(&command, &tokens);
///
/// assert_eq!(populated.values["force"], ArgumentValue::from("true"));
/// assert_eq!(populated.values["source"], ArgumentValue::from("a.txt"));
/// assert_eq!(populated.values["dest"], ArgumentValue::from("b.txt"));
/// assert_eq!(populated.unused, ["c.txt"]);
/// ```
pub fn populate_sub_command(command: &SubCommand, tokens: &[String]) -> Populated {
    Populator::new(command).run(tokens)
}

/// An option path resolved to a leaf option.
#[derive(Debug, Clone)]
struct Target<'a> {
    option: &'a OptionArgument,
    /// Path of the option, with indices of enclosing arrays.
    path: ArgumentPath,
    /// Explicit index into the option's own array.
    index: Option<usize>,
    /// Token the path was read from.
    flag: String,
}

impl Target<'_> {
    fn is_boolean(&self) -> bool {
        self.option
            .primitive_type()
            .is_some_and(|p| p.kind == PrimitiveKind::Boolean)
    }

    fn value_path(&self) -> ArgumentPath {
        match self.index {
            Some(index) => self.path.index(index),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug)]
enum State<'a> {
    Empty,
    OptionValueExpected(Target<'a>),
    Unused,
    Error,
}

enum Resolution<'a> {
    /// Root segment names no option of the command.
    Unknown,
    Target(Target<'a>),
    Invalid(InvalidArgument),
}

struct Populator<'a> {
    command: &'a SubCommand,
    values: ArgumentValues,
    unused: Vec<String>,
    invalid: Vec<InvalidArgument>,
    next_positional: usize,
    /// Property lookup by name and alias, keyed by parent schema path.
    properties: HashMap<String, HashMap<&'a str, &'a OptionArgument>>,
}

impl<'a> Populator<'a> {
    fn new(command: &'a SubCommand) -> Self {
        Self {
            command,
            values: ArgumentValues::new(),
            unused: Vec::new(),
            invalid: Vec::new(),
            next_positional: 0,
            properties: HashMap::new(),
        }
    }

    fn run(mut self, tokens: &[String]) -> Populated {
        let mut state = State::Empty;
        let mut i = 0;

        while let Some(token) = tokens.get(i) {
            let next = match std::mem::replace(&mut state, State::Empty) {
                State::OptionValueExpected(target)
                    if target.is_boolean() && parse_bool(token).is_none() =>
                {
                    // Bare boolean flag stores the literal "true"; the token is
                    // read again from the new state.
                    state = match self.assign(&target, &ArgumentValue::from("true")) {
                        Ok(()) => State::Empty,
                        Err(invalid) => self.fail(invalid, [target.flag.as_str()]),
                    };
                    continue;
                }
                State::OptionValueExpected(target) => {
                    match self.assign(&target, &ArgumentValue::from(token.as_str())) {
                        Ok(()) => State::Empty,
                        Err(invalid) => self.fail(invalid, [target.flag.as_str(), token]),
                    }
                }
                State::Empty | State::Unused => self.read(token),
                State::Error => {
                    self.unused.push(token.clone());
                    State::Error
                }
            };

            if let State::Unused = next {
                self.unused.push(token.clone());
            }
            state = next;
            i += 1;
        }

        if let State::OptionValueExpected(target) = state {
            if target.is_boolean() {
                if let Err(invalid) = self.assign(&target, &ArgumentValue::from("true")) {
                    self.fail(invalid, [target.flag.as_str()]);
                }
            } else {
                self.invalid.push(InvalidArgument::new(
                    InvalidArgumentReason::MissingValue,
                    &target.option.name,
                    target.value_path(),
                ));
            }
        }

        Populated {
            values: self.values,
            unused: self.unused,
            invalid: self.invalid,
        }
    }

    /// Handles a token in the `Empty` state.
    fn read(&mut self, token: &str) -> State<'a> {
        if token.starts_with('-') {
            let (path, inline) = match token.split_once('=') {
                Some((path, value)) => (path, Some(value)),
                None => (token, None),
            };

            match self.resolve(path, token) {
                Resolution::Unknown => {}
                Resolution::Invalid(invalid) => return self.fail(invalid, [token]),
                Resolution::Target(target) => {
                    return match inline {
                        None => State::OptionValueExpected(target),
                        Some("") => {
                            let invalid = InvalidArgument::new(
                                InvalidArgumentReason::MissingValue,
                                &target.option.name,
                                target.value_path(),
                            );
                            self.fail(invalid, [token])
                        }
                        Some(value) => match self.assign(&target, &ArgumentValue::from(value)) {
                            Ok(()) => State::Empty,
                            Err(invalid) => self.fail(invalid, [token]),
                        },
                    };
                }
            }
        }

        self.offer_positional(token)
    }

    fn offer_positional(&mut self, token: &str) -> State<'a> {
        let command = self.command;
        let Some(positional) = command.positionals.get(self.next_positional) else {
            return State::Unused;
        };

        if !positional.is_vararg_multiple {
            self.values
                .insert(positional.name.clone(), ArgumentValue::from(token));
            self.next_positional += 1;
            return State::Empty;
        }

        let full = match self
            .values
            .entry(positional.name.clone())
            .or_insert_with(|| ArgumentValue::List(Vec::new()))
        {
            ArgumentValue::List(items) if items.len() < MAX_ARRAY_SIZE => {
                items.push(ArgumentValue::from(token));
                false
            }
            _ => true,
        };
        if full {
            let invalid = InvalidArgument::new(
                InvalidArgumentReason::ArraySizeExceeded,
                &positional.name,
                ArgumentPath::root(&positional.name).index(MAX_ARRAY_SIZE),
            )
            .with_value(token);
            return self.fail(invalid, [token]);
        }
        State::Empty
    }

    /// Resolves an option path (without any `=value`) to a leaf option.
    fn resolve(&mut self, raw: &str, token: &str) -> Resolution<'a> {
        let (rest, by_alias) = match raw.strip_prefix("--") {
            Some(rest) => (rest, false),
            None => (raw.strip_prefix('-').unwrap_or(raw), true),
        };

        let mut segments = rest.split('.');
        let Some((root_name, mut index)) = segments.next().and_then(parse_segment) else {
            return Resolution::Unknown;
        };

        let command = self.command;
        let root = command.options.iter().find(|option| {
            if by_alias {
                option.short_alias.as_deref() == Some(root_name)
            } else {
                option.name == root_name
            }
        });
        let Some(mut option) = root else {
            return Resolution::Unknown;
        };

        let invalid = |reason, argument: &str, path: ArgumentPath| {
            Resolution::Invalid(InvalidArgument::new(reason, argument, path).with_value(token))
        };

        let deeper: Vec<&str> = segments.collect();
        let mut path = ArgumentPath::root(&option.name);
        if deeper.len() + 1 > MAX_NESTING_DEPTH {
            return invalid(InvalidArgumentReason::NestingDepthExceeded, &option.name, path);
        }

        let mut schema_path = option.name.clone();
        for segment in deeper {
            if option.properties().is_none() {
                return invalid(InvalidArgumentReason::UnknownProperty, segment, path.field(segment));
            }

            match parse_index(option, index) {
                Ok(i) if option.is_array => path = path.index(i.unwrap_or(0)),
                Ok(_) => {}
                Err(reason) => return invalid(reason, &option.name, path),
            }

            let Some((name, next_index)) = parse_segment(segment) else {
                return invalid(InvalidArgumentReason::UnknownProperty, segment, path.field(segment));
            };
            let Some(property) = self.property(option, &schema_path, name) else {
                return invalid(InvalidArgumentReason::UnknownProperty, name, path.field(name));
            };

            path = path.field(&property.name);
            schema_path.push('.');
            schema_path.push_str(&property.name);
            option = property;
            index = next_index;
        }

        if option.properties().is_some() {
            return invalid(InvalidArgumentReason::OptionIsComplex, &option.name, path);
        }

        match parse_index(option, index) {
            Ok(index) => Resolution::Target(Target {
                option,
                path,
                index,
                flag: token.to_string(),
            }),
            Err(reason) => invalid(reason, &option.name, path),
        }
    }

    /// Looks up a property of a complex option by name or alias.
    fn property(
        &mut self,
        parent: &'a OptionArgument,
        schema_path: &str,
        name: &str,
    ) -> Option<&'a OptionArgument> {
        let table = self
            .properties
            .entry(schema_path.to_string())
            .or_insert_with(|| {
                let mut table = HashMap::new();
                for property in parent.properties().unwrap_or_default() {
                    table.insert(property.name.as_str(), property);
                    if let Some(alias) = &property.short_alias {
                        table.insert(alias.as_str(), property);
                    }
                }
                table
            });
        table.get(name).copied()
    }

    fn assign(&mut self, target: &Target<'a>, value: &ArgumentValue) -> Result<(), InvalidArgument> {
        let option = target.option;
        let stored = match container_mut(&mut self.values, target.path.segments()) {
            Some(container) => store(container.entry(option.name.clone()), option.is_array, target.index, value),
            None => Err(InvalidArgumentReason::IllegalMultipleValues),
        };

        stored.map_err(|reason| {
            InvalidArgument::new(reason, &option.name, target.value_path()).with_value(value.clone())
        })
    }

    /// Records an invalid argument and enters the terminal state.
    fn fail<'t>(
        &mut self,
        invalid: InvalidArgument,
        tokens: impl IntoIterator<Item = &'t str>,
    ) -> State<'a> {
        debug!(
            command = %self.command.name,
            reason = %invalid.reason,
            path = %invalid.path,
            "Rejected option"
        );
        self.unused.extend(tokens.into_iter().map(String::from));
        self.invalid.push(invalid);
        State::Error
    }
}

/// Splits `name[index]` into its name and raw index digits.
fn parse_segment(segment: &str) -> Option<(&str, Option<&str>)> {
    let caps = SEGMENT_RE.captures(segment)?;
    let name = caps.get(1)?.as_str();
    Some((name, caps.get(2).map(|m| m.as_str())))
}

fn parse_index(option: &OptionArgument, raw: Option<&str>) -> Result<Option<usize>, InvalidArgumentReason> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if !option.is_array {
        return Err(InvalidArgumentReason::IllegalMultipleValues);
    }
    match raw.parse::<usize>() {
        Ok(index) if index < MAX_ARRAY_SIZE => Ok(Some(index)),
        _ => Err(InvalidArgumentReason::ArraySizeExceeded),
    }
}

/// Walks to the object holding the last path segment, creating objects and
/// arrays on the way.
fn container_mut<'v>(
    map: &'v mut BTreeMap<String, ArgumentValue>,
    segments: &[PathSegment],
) -> Option<&'v mut BTreeMap<String, ArgumentValue>> {
    match segments {
        [_] => Some(map),
        [PathSegment::Field(name), rest @ ..] => {
            let node = map.entry(name.clone()).or_insert_with(|| match rest.first() {
                Some(PathSegment::Index(_)) => ArgumentValue::List(Vec::new()),
                _ => ArgumentValue::Object(BTreeMap::new()),
            });
            descend(node, rest)
        }
        _ => None,
    }
}

fn descend<'v>(
    node: &'v mut ArgumentValue,
    segments: &[PathSegment],
) -> Option<&'v mut BTreeMap<String, ArgumentValue>> {
    match (node, segments) {
        (ArgumentValue::Object(map), _) => container_mut(map, segments),
        (ArgumentValue::List(items), [PathSegment::Index(index), rest @ ..]) => {
            if items.len() <= *index {
                items.resize(*index + 1, ArgumentValue::Vacant);
            }
            let item = &mut items[*index];
            if item.is_vacant() {
                *item = ArgumentValue::Object(BTreeMap::new());
            }
            descend(item, rest)
        }
        _ => None,
    }
}

fn store(
    slot: Entry<'_, String, ArgumentValue>,
    is_array: bool,
    index: Option<usize>,
    value: &ArgumentValue,
) -> Result<(), InvalidArgumentReason> {
    if !is_array {
        return match slot {
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(InvalidArgumentReason::IllegalMultipleValues),
        };
    }

    let ArgumentValue::List(items) = slot.or_insert_with(|| ArgumentValue::List(Vec::new())) else {
        return Err(InvalidArgumentReason::IllegalMultipleValues);
    };

    match index {
        None if items.len() >= MAX_ARRAY_SIZE => Err(InvalidArgumentReason::ArraySizeExceeded),
        None => {
            items.push(value.clone());
            Ok(())
        }
        Some(index) => {
            if items.len() <= index {
                items.resize(index + 1, ArgumentValue::Vacant);
            }
            if !items[index].is_vacant() {
                return Err(InvalidArgumentReason::IllegalMultipleValues);
            }
            items[index] = value.clone();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use command_resolve_core::{PositionalArgument, PrimitiveType};

    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn object(entries: &[(&str, ArgumentValue)]) -> ArgumentValue {
        ArgumentValue::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn list(items: &[&str]) -> ArgumentValue {
        ArgumentValue::List(items.iter().map(|s| ArgumentValue::from(*s)).collect())
    }

    fn nested_command() -> SubCommand {
        SubCommand::new("nested")
            .with_option(
                OptionArgument::complex(
                    "alpha",
                    vec![
                        OptionArgument::complex(
                            "beta",
                            vec![
                                OptionArgument::primitive("gamma", PrimitiveType::string()).with_alias("g"),
                                OptionArgument::primitive("delta", PrimitiveType::integer())
                                    .with_alias("d")
                                    .array(),
                            ],
                        )
                        .with_alias("b")
                        .array(),
                    ],
                )
                .with_alias("a")
                .array(),
            )
            .with_option(
                OptionArgument::complex(
                    "epsilon",
                    vec![
                        OptionArgument::primitive("gamma", PrimitiveType::string()).with_alias("g"),
                        OptionArgument::primitive("delta", PrimitiveType::integer()).with_alias("d"),
                    ],
                )
                .with_alias("e"),
            )
    }

    fn flags_command() -> SubCommand {
        SubCommand::new("flags")
            .with_option(OptionArgument::primitive("flag", PrimitiveType::boolean()).optional())
            .with_option(OptionArgument::primitive("other", PrimitiveType::boolean()).optional())
            .with_option(OptionArgument::primitive("name", PrimitiveType::string()).optional())
            .with_option(OptionArgument::primitive("tags", PrimitiveType::string()).array().optional())
    }

    #[test]
    fn test_nested_paths_out_of_order() {
        let populated = populate_sub_command(
            &nested_command(),
            &tokens(&[
                "-e.g=bar",
                "-e.d=1",
                "-a.b[1].g=foo2",
                "--alpha.beta[0].gamma=foo1",
                "-a.b[1].d[1]=2",
                "-a.b[0].d=1",
                "-a.b[1].d[0]=3",
            ]),
        );

        assert!(populated.is_valid(), "{:?}", populated.invalid);
        assert!(populated.unused.is_empty());
        assert_eq!(
            populated.values["alpha"],
            ArgumentValue::List(vec![object(&[(
                "beta",
                ArgumentValue::List(vec![
                    object(&[("gamma", "foo1".into()), ("delta", list(&["1"]))]),
                    object(&[("gamma", "foo2".into()), ("delta", list(&["3", "2"]))]),
                ]),
            )])])
        );
        assert_eq!(
            populated.values["epsilon"],
            object(&[("gamma", "bar".into()), ("delta", "1".into())])
        );
    }

    #[test]
    fn test_sparse_index_leaves_vacant_slot() {
        let populated = populate_sub_command(&nested_command(), &tokens(&["-a.b[0].d[2]=7"]));
        assert!(populated.is_valid());
        let ArgumentValue::List(alpha) = &populated.values["alpha"] else {
            panic!("alpha should be a list");
        };
        let ArgumentValue::Object(first) = &alpha[0] else {
            panic!("alpha[0] should be an object");
        };
        let ArgumentValue::List(beta) = &first["beta"] else {
            panic!("beta should be a list");
        };
        assert_eq!(
            beta[0],
            object(&[(
                "delta",
                ArgumentValue::List(vec![ArgumentValue::Vacant, ArgumentValue::Vacant, "7".into()])
            )])
        );
    }

    #[test]
    fn test_boolean_flag_alone() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--flag"]));
        assert_eq!(populated.values["flag"], ArgumentValue::from("true"));
        assert!(populated.unused.is_empty());
    }

    #[test]
    fn test_boolean_flag_before_other_flag() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--flag", "--other"]));
        assert_eq!(populated.values["flag"], ArgumentValue::from("true"));
        assert_eq!(populated.values["other"], ArgumentValue::from("true"));
        assert!(populated.unused.is_empty());
    }

    #[test]
    fn test_boolean_flag_consumes_literal() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--flag", "false", "x"]));
        assert_eq!(populated.values["flag"], ArgumentValue::from("false"));
        assert_eq!(populated.unused, tokens(&["x"]));
    }

    #[test]
    fn test_empty_inline_value_is_missing() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--name=", "x"]));
        assert_eq!(populated.invalid.len(), 1);
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::MissingValue);
        assert_eq!(populated.unused, tokens(&["--name=", "x"]));
    }

    #[test]
    fn test_trailing_option_without_value() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--name"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::MissingValue);
        assert_eq!(populated.invalid[0].path.to_string(), "name");
    }

    #[test]
    fn test_repeated_single_value_option() {
        let populated =
            populate_sub_command(&flags_command(), &tokens(&["--name", "a", "--name", "b", "c"]));
        assert_eq!(populated.values["name"], ArgumentValue::from("a"));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::IllegalMultipleValues);
        assert_eq!(populated.unused, tokens(&["--name", "b", "c"]));
    }

    #[test]
    fn test_index_on_single_value_option() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--name[0]=a"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::IllegalMultipleValues);
    }

    #[test]
    fn test_index_limit() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--tags[254]=a", "--tags[255]=b"]));
        assert_eq!(populated.invalid.len(), 1);
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::ArraySizeExceeded);
        assert_eq!(populated.unused, tokens(&["--tags[255]=b"]));

        let populated =
            populate_sub_command(&flags_command(), &tokens(&["--tags[99999999999999999999999]=a"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::ArraySizeExceeded);
    }

    #[test]
    fn test_explicit_index_twice() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--tags[1]=a", "--tags[1]=b"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::IllegalMultipleValues);
        assert_eq!(populated.invalid[0].path.to_string(), "tags[1]");
    }

    #[test]
    fn test_unknown_root_is_unused() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--nope=1", "-z", "--flag"]));
        assert!(populated.is_valid());
        assert_eq!(populated.unused, tokens(&["--nope=1", "-z"]));
        assert_eq!(populated.values["flag"], ArgumentValue::from("true"));
    }

    #[test]
    fn test_unknown_property() {
        let populated = populate_sub_command(&nested_command(), &tokens(&["--epsilon.zeta=1"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::UnknownProperty);
        assert_eq!(populated.invalid[0].path.to_string(), "epsilon.zeta");
    }

    #[test]
    fn test_path_past_primitive() {
        let populated = populate_sub_command(&nested_command(), &tokens(&["-e.g.x=1"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::UnknownProperty);
    }

    #[test]
    fn test_path_ending_on_complex_option() {
        let populated = populate_sub_command(&nested_command(), &tokens(&["--alpha.beta=1"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::OptionIsComplex);
        assert_eq!(populated.invalid[0].path.to_string(), "alpha[0].beta");
    }

    #[test]
    fn test_nesting_depth_limit() {
        let populated = populate_sub_command(&nested_command(), &tokens(&["--alpha.b.c.d.e.f.g.h.i.j.k=1"]));
        assert_eq!(populated.invalid[0].reason, InvalidArgumentReason::NestingDepthExceeded);
    }

    #[test]
    fn test_vararg_positional_collects_rest() {
        let command = SubCommand::new("cat")
            .with_option(OptionArgument::primitive("number", PrimitiveType::boolean()).with_alias("n"))
            .with_positional(PositionalArgument::new("files", PrimitiveType::string()).vararg_multiple());
        let populated = populate_sub_command(&command, &tokens(&["a", "-n", "b", "-", "c"]));

        assert!(populated.unused.is_empty());
        assert_eq!(populated.values["files"], list(&["a", "b", "-", "c"]));
        assert_eq!(populated.values["number"], ArgumentValue::from("true"));
    }

    #[test]
    fn test_error_is_terminal() {
        let populated = populate_sub_command(&flags_command(), &tokens(&["--name", "a", "--name=b", "--flag"]));
        assert_eq!(populated.unused, tokens(&["--name=b", "--flag"]));
        assert!(!populated.values.contains_key("flag"));
    }
}
