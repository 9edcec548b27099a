//! Command and argument schema definitions.
//!
//! Commands and their arguments are declared once at startup and stay
//! immutable for the run. The types serialize with [`serde`] so a schema can
//! be loaded from YAML or JSON as well as built in code.

use serde::{Deserialize, Serialize};

use crate::ArgumentValue;

/// Maximum nesting depth of complex options.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Maximum number of entries in any single array dimension.
pub const MAX_ARRAY_SIZE: usize = 255;

/// Kind of a primitive argument value.
///
/// # Examples
///
/// ```
/// use command_resolve_core::PrimitiveKind;
///
/// let kind: PrimitiveKind = serde_json::from_str("\"integer\"").unwrap();
/// assert_eq!(kind, PrimitiveKind::Integer);
/// assert_eq!(kind.as_str(), "integer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Free-form string.
    String,
    /// Finite floating point number.
    Number,
    /// Integral number.
    Integer,
    /// `true` / `false`; a bare flag means `true`.
    Boolean,
    /// String that should not be echoed back.
    Secret,
}

impl PrimitiveKind {
    /// Lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Secret => "secret",
        }
    }
}

/// Schema of a primitive (leaf) value.
///
/// # Examples
///
/// ```
/// use command_resolve_core::{PrimitiveKind, PrimitiveType};
///
/// let level = PrimitiveType::integer().with_min(0.0).with_max(9.0);
/// assert_eq!(level.kind, PrimitiveKind::Integer);
/// assert_eq!(level.max_inclusive, Some(9.0));
///
/// let format = PrimitiveType::string()
///     .with_allowable_values(["json", "yaml"])
///     .case_insensitive();
/// assert!(format.case_insensitive);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveType {
    /// Value kind values are coerced to.
    pub kind: PrimitiveKind,
    /// Values the argument is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowable_values: Option<Vec<ArgumentValue>>,
    /// Compare string allowable values ignoring case.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_insensitive: bool,
    /// Inclusive lower bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_inclusive: Option<f64>,
    /// Inclusive upper bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_inclusive: Option<f64>,
    /// Key under which configuration supplies a default for this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_key: Option<String>,
}

impl PrimitiveType {
    /// Creates an unconstrained primitive of the given kind.
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            allowable_values: None,
            case_insensitive: false,
            min_inclusive: None,
            max_inclusive: None,
            configuration_key: None,
        }
    }

    pub fn string() -> Self {
        Self::new(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        Self::new(PrimitiveKind::Number)
    }

    pub fn integer() -> Self {
        Self::new(PrimitiveKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(PrimitiveKind::Boolean)
    }

    pub fn secret() -> Self {
        Self::new(PrimitiveKind::Secret)
    }

    /// Restricts the value to the given list.
    pub fn with_allowable_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ArgumentValue>,
    {
        self.allowable_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Compares allowable string values ignoring case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Sets the inclusive lower bound.
    pub fn with_min(mut self, min: f64) -> Self {
        self.min_inclusive = Some(min);
        self
    }

    /// Sets the inclusive upper bound.
    pub fn with_max(mut self, max: f64) -> Self {
        self.max_inclusive = Some(max);
        self
    }

    /// Sets the configuration key.
    pub fn with_configuration_key(mut self, key: &str) -> Self {
        self.configuration_key = Some(key.to_string());
        self
    }
}

/// Schema of a complex option: an object with declared properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexType {
    /// Declared properties, in validation order.
    pub properties: Vec<OptionArgument>,
}

/// Value schema of an option or property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArgumentType {
    /// Leaf value.
    Primitive(PrimitiveType),
    /// Object with nested properties.
    Complex(ComplexType),
}

/// A named option of a sub-command, or a property of a complex option.
///
/// Root options are addressed as `--name` or `-alias`; properties are
/// addressed by name or alias after a `.` (`--config.db.port=5432`).
///
/// # Examples
///
/// ```
/// use command_resolve_core::{OptionArgument, PrimitiveType};
///
/// let output = OptionArgument::primitive("output", PrimitiveType::string())
///     .with_alias("o")
///     .optional();
/// assert!(output.matches("o"));
/// assert!(output.matches("output"));
/// assert!(output.primitive_type().is_some());
///
/// let server = OptionArgument::complex(
///     "server",
///     vec![
///         OptionArgument::primitive("host", PrimitiveType::string()),
///         OptionArgument::primitive("port", PrimitiveType::integer()),
///     ],
/// )
/// .array();
/// assert_eq!(server.properties().map(<[_]>::len), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionArgument {
    /// Option or property name.
    pub name: String,
    /// Short alias (`-o` at the root, `o` below it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_alias: Option<String>,
    /// Description for help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when neither tokens nor external defaults supply one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ArgumentValue>,
    /// Accepts repeated values collected into an array.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,
    /// May be omitted entirely.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optional: bool,
    /// Value schema.
    #[serde(flatten)]
    pub value_type: ArgumentType,
}

impl OptionArgument {
    /// Creates a mandatory, single-valued option.
    pub fn new(name: &str, value_type: ArgumentType) -> Self {
        Self {
            name: name.to_string(),
            short_alias: None,
            description: None,
            default_value: None,
            is_array: false,
            is_optional: false,
            value_type,
        }
    }

    /// Creates an option holding a primitive value.
    pub fn primitive(name: &str, value_type: PrimitiveType) -> Self {
        Self::new(name, ArgumentType::Primitive(value_type))
    }

    /// Creates a complex option with the given properties.
    pub fn complex(name: &str, properties: Vec<OptionArgument>) -> Self {
        Self::new(name, ArgumentType::Complex(ComplexType { properties }))
    }

    /// Sets the short alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.short_alias = Some(alias.to_string());
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the declared default value.
    pub fn with_default(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Marks as array-valued.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Marks as optional.
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Returns `true` if `s` is this option's name or short alias.
    pub fn matches(&self, s: &str) -> bool {
        self.name == s || self.short_alias.as_deref() == Some(s)
    }

    /// The primitive schema, if this is a leaf option.
    pub fn primitive_type(&self) -> Option<&PrimitiveType> {
        match &self.value_type {
            ArgumentType::Primitive(primitive) => Some(primitive),
            ArgumentType::Complex(_) => None,
        }
    }

    /// The declared properties, if this is a complex option.
    pub fn properties(&self) -> Option<&[OptionArgument]> {
        match &self.value_type {
            ArgumentType::Primitive(_) => None,
            ArgumentType::Complex(complex) => Some(&complex.properties),
        }
    }

    /// Returns `true` if the option must be supplied by tokens or defaults.
    pub fn is_required(&self) -> bool {
        !self.is_optional && self.default_value.is_none()
    }
}

/// A positional argument of a sub-command.
///
/// Only the last positional may be vararg: `is_vararg_multiple` collects every
/// remaining positional token, `is_vararg_optional` allows it to be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalArgument {
    /// Argument name.
    pub name: String,
    /// Description for help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when no token is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ArgumentValue>,
    /// May be absent.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_vararg_optional: bool,
    /// Accepts one or more values.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_vararg_multiple: bool,
    /// Value schema.
    #[serde(flatten)]
    pub value_type: PrimitiveType,
}

impl PositionalArgument {
    /// Creates a mandatory positional argument.
    pub fn new(name: &str, value_type: PrimitiveType) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            default_value: None,
            is_vararg_optional: false,
            is_vararg_multiple: false,
            value_type,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the declared default value.
    pub fn with_default(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Allows the positional to be absent.
    pub fn vararg_optional(mut self) -> Self {
        self.is_vararg_optional = true;
        self
    }

    /// Collects every remaining positional token.
    pub fn vararg_multiple(mut self) -> Self {
        self.is_vararg_multiple = true;
        self
    }

    /// Returns `true` if any vararg flag is set.
    pub fn is_vararg(&self) -> bool {
        self.is_vararg_optional || self.is_vararg_multiple
    }

    /// Returns `true` if a token or default must supply a value.
    pub fn is_required(&self) -> bool {
        !self.is_vararg_optional && self.default_value.is_none()
    }
}

/// The single (optional) argument of a global command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalArgument {
    /// Key of the value in the populated values.
    pub name: String,
    /// Description for help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when neither tokens nor external defaults supply one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ArgumentValue>,
    /// May be omitted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optional: bool,
    /// Value schema.
    #[serde(flatten)]
    pub value_type: PrimitiveType,
}

impl GlobalArgument {
    /// Creates a mandatory global argument.
    pub fn new(name: &str, value_type: PrimitiveType) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            default_value: None,
            is_optional: false,
            value_type,
        }
    }

    /// Sets the declared default value.
    pub fn with_default(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Marks as optional.
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Returns `true` if a token or default must supply a value.
    ///
    /// Boolean arguments never are: the bare flag means `true`.
    pub fn is_required(&self) -> bool {
        !self.is_optional
            && self.default_value.is_none()
            && self.value_type.kind != PrimitiveKind::Boolean
    }
}

/// A command addressed by a plain name, with options and positionals.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
///
/// let deploy = SubCommand::new("deploy")
///     .with_option(OptionArgument::primitive("region", PrimitiveType::string()).with_alias("r"))
///     .with_positional(PositionalArgument::new("target", PrimitiveType::string()));
///
/// assert_eq!(deploy.find_option("r").map(|o| o.name.as_str()), Some("region"));
/// assert!(deploy.has_required_arguments());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubCommand {
    /// Command name.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Options, in validation order.
    #[serde(default)]
    pub options: Vec<OptionArgument>,
    /// Positional arguments, in token order.
    #[serde(default)]
    pub positionals: Vec<PositionalArgument>,
    /// Whether configuration keys may supply defaults.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_configuration: bool,
}

impl SubCommand {
    /// Creates a sub-command with no arguments.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds an option.
    pub fn with_option(mut self, option: OptionArgument) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional argument.
    pub fn with_positional(mut self, positional: PositionalArgument) -> Self {
        self.positionals.push(positional);
        self
    }

    /// Allows configuration keys to supply defaults.
    pub fn with_configuration(mut self) -> Self {
        self.enable_configuration = true;
        self
    }

    /// Finds a root option by name or short alias.
    pub fn find_option(&self, name_or_alias: &str) -> Option<&OptionArgument> {
        self.options.iter().find(|o| o.matches(name_or_alias))
    }

    /// Returns `true` if parsing with no tokens would report a missing value.
    pub fn has_required_arguments(&self) -> bool {
        self.options.iter().any(OptionArgument::is_required)
            || self.positionals.iter().any(PositionalArgument::is_required)
    }
}

/// A named group of sub-commands, addressed as `group:member` or `group member`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupCommand {
    /// Group name.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member sub-commands.
    pub members: Vec<SubCommand>,
}

impl GroupCommand {
    /// Creates an empty group.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a member sub-command.
    pub fn with_member(mut self, member: SubCommand) -> Self {
        self.members.push(member);
        self
    }

    /// Joined `group:member` name of a member.
    pub fn joined_name(&self, member: &SubCommand) -> String {
        format!("{}:{}", self.name, member.name)
    }
}

/// A command addressed as `--name` or `-x`, taking at most one value.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
///
/// let version = GlobalCommand::new("version").with_alias('V');
/// assert!(!version.has_required_arguments());
///
/// let log = GlobalCommand::new("log-level")
///     .with_argument(GlobalArgument::new("level", PrimitiveType::string()));
/// assert!(log.has_required_arguments());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalCommand {
    /// Long name, used as `--name`.
    pub name: String,
    /// Single-character alias, used as `-x`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_alias: Option<char>,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value taken by the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<GlobalArgument>,
}

impl GlobalCommand {
    /// Creates a global command with no argument.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the short alias.
    pub fn with_alias(mut self, alias: char) -> Self {
        self.short_alias = Some(alias);
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the argument.
    pub fn with_argument(mut self, argument: GlobalArgument) -> Self {
        self.argument = Some(argument);
        self
    }

    /// Returns `true` if the argument must be supplied.
    pub fn has_required_arguments(&self) -> bool {
        self.argument.as_ref().is_some_and(GlobalArgument::is_required)
    }
}

/// A global command that may appear anywhere, any number of times, and runs
/// before the active command in descending `execute_priority` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalModifierCommand {
    /// The underlying global command.
    #[serde(flatten)]
    pub command: GlobalCommand,
    /// Higher runs first.
    #[serde(default)]
    pub execute_priority: i32,
}

impl GlobalModifierCommand {
    /// Wraps a global command with an execute priority.
    pub fn new(command: GlobalCommand, execute_priority: i32) -> Self {
        Self {
            command,
            execute_priority,
        }
    }
}

/// Any declared command.
///
/// # Examples
///
/// ```
/// use command_resolve_core::{Command, SubCommand};
///
/// let yaml = "kind: sub\nname: build\n";
/// let command: Command = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(command, Command::Sub(SubCommand::new("build")));
/// assert_eq!(command.name(), "build");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Plain-named command with options and positionals.
    Sub(SubCommand),
    /// Group of sub-commands.
    Group(GroupCommand),
    /// `--name` command.
    Global(GlobalCommand),
    /// `--name` command with execute priority.
    Modifier(GlobalModifierCommand),
}

impl Command {
    /// Command name.
    pub fn name(&self) -> &str {
        match self {
            Self::Sub(sub) => &sub.name,
            Self::Group(group) => &group.name,
            Self::Global(global) => &global.name,
            Self::Modifier(modifier) => &modifier.command.name,
        }
    }

    /// Whether the command needs a token or default to parse. Groups are
    /// never parsed themselves and report `false`.
    pub fn has_required_arguments(&self) -> bool {
        match self {
            Self::Sub(sub) => sub.has_required_arguments(),
            Self::Group(_) => false,
            Self::Global(global) => global.has_required_arguments(),
            Self::Modifier(modifier) => modifier.command.has_required_arguments(),
        }
    }

    /// A parseable reference to this command; groups have none.
    pub fn as_command_ref(&self) -> Option<CommandRef<'_>> {
        match self {
            Self::Sub(sub) => Some(CommandRef::Sub(sub)),
            Self::Group(_) => None,
            Self::Global(global) => Some(CommandRef::Global(global)),
            Self::Modifier(modifier) => Some(CommandRef::Modifier(modifier)),
        }
    }
}

/// Borrowed reference to a command that can be parsed and executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandRef<'a> {
    Sub(&'a SubCommand),
    Global(&'a GlobalCommand),
    Modifier(&'a GlobalModifierCommand),
}

impl<'a> CommandRef<'a> {
    /// Command name.
    pub fn name(&self) -> &'a str {
        match self {
            Self::Sub(sub) => &sub.name,
            Self::Global(global) => &global.name,
            Self::Modifier(modifier) => &modifier.command.name,
        }
    }

    /// Execute priority of a modifier.
    pub fn execute_priority(&self) -> Option<i32> {
        match self {
            Self::Modifier(modifier) => Some(modifier.execute_priority),
            _ => None,
        }
    }

    /// Returns `true` if parsing with no tokens would report a missing value.
    pub fn has_required_arguments(&self) -> bool {
        match self {
            Self::Sub(sub) => sub.has_required_arguments(),
            Self::Global(global) => global.has_required_arguments(),
            Self::Modifier(modifier) => modifier.command.has_required_arguments(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_builders() {
        let option = OptionArgument::primitive("goo", PrimitiveType::string())
            .with_alias("g")
            .with_default("x")
            .array();

        assert!(option.is_array);
        assert!(!option.is_required());
        assert!(option.matches("g"));
        assert!(!option.matches("x"));
    }

    #[test]
    fn test_boolean_global_argument_is_never_required() {
        let global = GlobalCommand::new("verbose")
            .with_argument(GlobalArgument::new("verbose", PrimitiveType::boolean()));
        assert!(!global.has_required_arguments());
    }

    #[test]
    fn test_sub_command_required_arguments() {
        let sub = SubCommand::new("run")
            .with_positional(PositionalArgument::new("files", PrimitiveType::string()).vararg_optional());
        assert!(!sub.has_required_arguments());

        let sub = sub.with_option(OptionArgument::primitive("mode", PrimitiveType::string()));
        assert!(sub.has_required_arguments());
    }

    #[test]
    fn test_command_required_arguments() {
        let group = Command::Group(
            GroupCommand::new("db").with_member(
                SubCommand::new("seed").with_positional(PositionalArgument::new("file", PrimitiveType::string())),
            ),
        );
        assert!(!group.has_required_arguments());

        let level = GlobalCommand::new("log-level")
            .with_argument(GlobalArgument::new("level", PrimitiveType::string()));
        assert!(Command::Global(level.clone()).has_required_arguments());
        assert!(Command::Modifier(GlobalModifierCommand::new(level, 1)).has_required_arguments());
        assert!(!Command::Global(GlobalCommand::new("help")).has_required_arguments());
    }

    #[test]
    fn test_deserialize_complex_option() {
        let yaml = r#"
name: server
short_alias: s
is_array: true
type: complex
properties:
  - name: host
    type: primitive
    kind: string
  - name: port
    type: primitive
    kind: integer
    min_inclusive: 1
    max_inclusive: 65535
"#;
        let option: OptionArgument = serde_yaml::from_str(yaml).unwrap();
        assert!(option.is_array);
        let properties = option.properties().unwrap();
        assert_eq!(properties.len(), 2);
        let port = properties[1].primitive_type().unwrap();
        assert_eq!(port.kind, PrimitiveKind::Integer);
        assert_eq!(port.max_inclusive, Some(65535.0));
    }

    #[test]
    fn test_deserialize_modifier_command() {
        let yaml = r#"
kind: modifier
name: log-level
short_alias: l
execute_priority: 10
argument:
  name: level
  kind: string
  allowable_values: [debug, info]
"#;
        let command: Command = serde_yaml::from_str(yaml).unwrap();
        let Command::Modifier(modifier) = command else {
            panic!("expected modifier");
        };
        assert_eq!(modifier.execute_priority, 10);
        assert_eq!(modifier.command.short_alias, Some('l'));
        assert_eq!(
            modifier.command.argument.unwrap().value_type.allowable_values,
            Some(vec![ArgumentValue::from("debug"), ArgumentValue::from("info")])
        );
    }
}
