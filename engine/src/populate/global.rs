use command_resolve_core::{ArgumentValue, GlobalCommand, PrimitiveKind, parse_bool};

use super::Populated;

/// Extracts the argument value of a global or modifier command.
///
/// At most one token is consumed. A boolean argument only consumes a
/// following `true` or `false`; otherwise the bare flag stores the literal
/// `"true"`, read the same way as a typed token once merged with defaults.
/// A missing value is left for the validator, which applies external and
/// declared defaults.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::populate_global;
///
/// let color = GlobalCommand::new("color")
///     .with_argument(GlobalArgument::new("enabled", PrimitiveType::boolean()));
///
/// let populated = populate_global(&color, &["build".to_string()]);
/// assert_eq!(populated.values["enabled"], ArgumentValue::from("true"));
/// assert_eq!(populated.unused, ["build"]);
///
/// let populated = populate_global(&color, &["False".to_string(), "build".to_string()]);
/// assert_eq!(populated.values["enabled"], ArgumentValue::from("False"));
/// assert_eq!(populated.unused, ["build"]);
/// ```
pub fn populate_global(command: &GlobalCommand, tokens: &[String]) -> Populated {
    let mut populated = Populated::default();
    let Some(argument) = &command.argument else {
        populated.unused = tokens.to_vec();
        return populated;
    };

    let first = tokens.first();
    let consumed = if argument.value_type.kind == PrimitiveKind::Boolean
        && first.and_then(|token| parse_bool(token)).is_none()
    {
        populated
            .values
            .insert(argument.name.clone(), ArgumentValue::from("true"));
        0
    } else if let Some(token) = first {
        populated
            .values
            .insert(argument.name.clone(), ArgumentValue::from(token.as_str()));
        1
    } else {
        0
    };

    populated.unused = tokens[consumed..].to_vec();
    populated
}
