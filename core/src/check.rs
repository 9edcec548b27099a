//! Argument value validation and type coercion.
//!
//! Walks a populated value against its declared schema, coercing token
//! strings to the declared primitive kinds and enforcing allowable values,
//! ranges, array limits and sparsity. Within one object validation stops at
//! the first failing property, but values already validated are kept in the
//! partial result so callers can report them alongside the failure.
//!
//! # Examples
//!
//! ```
//! use command_resolve_core::*;
//!
//! let command = SubCommand::new("resize")
//!     .with_option(OptionArgument::primitive("width", PrimitiveType::integer().with_min(1.0)))
//!     .with_option(OptionArgument::primitive("keep-ratio", PrimitiveType::boolean()).optional());
//!
//! let mut values = ArgumentValues::new();
//! values.insert("width".into(), "640".into());
//! values.insert("keep-ratio".into(), "TRUE".into());
//!
//! let checked = check_sub_command_values(&command, &values).unwrap();
//! assert!(checked.invalid.is_empty());
//! assert_eq!(checked.values["width"], ArgumentValue::Integer(640));
//! assert_eq!(checked.values["keep-ratio"], ArgumentValue::Boolean(true));
//! ```

use std::collections::BTreeMap;

use crate::{
    ArgumentPath, ArgumentType, ArgumentValue, ArgumentValues, GlobalCommand, InvalidArgument,
    InvalidArgumentReason, MAX_ARRAY_SIZE, MAX_NESTING_DEPTH, OptionArgument, PositionalArgument,
    PrimitiveKind, PrimitiveType, SubCommand, ValueError,
};

/// Result of validating one value: the (possibly partial) coerced value and
/// the first failure, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checked {
    pub value: Option<ArgumentValue>,
    pub invalid: Option<InvalidArgument>,
}

impl Checked {
    fn valid(value: ArgumentValue) -> Self {
        Self {
            value: Some(value),
            invalid: None,
        }
    }

    fn failed(partial: Option<ArgumentValue>, invalid: InvalidArgument) -> Self {
        Self {
            value: partial,
            invalid: Some(invalid),
        }
    }
}

/// Validated values for a whole command, plus every top-level failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckedValues {
    pub values: ArgumentValues,
    pub invalid: Vec<InvalidArgument>,
}

impl CheckedValues {
    fn record(&mut self, name: &str, checked: Checked) {
        if let Some(value) = checked.value {
            self.values.insert(name.to_string(), value);
        }
        self.invalid.extend(checked.invalid);
    }
}

/// Coerces a value to a primitive kind and applies its constraints.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
///
/// let integer = PrimitiveType::integer();
/// assert_eq!(check_primitive(&integer, &"42".into()), Ok(ArgumentValue::Integer(42)));
/// assert_eq!(
///     check_primitive(&integer, &"1.1".into()),
///     Err(InvalidArgumentReason::IncorrectValueType)
/// );
///
/// let choice = PrimitiveType::string().with_allowable_values(["bar", "two"]);
/// assert_eq!(
///     check_primitive(&choice, &"goo".into()),
///     Err(InvalidArgumentReason::IllegalValue)
/// );
/// ```
pub fn check_primitive(
    value_type: &PrimitiveType,
    value: &ArgumentValue,
) -> Result<ArgumentValue, InvalidArgumentReason> {
    let coerced = coerce(value_type.kind, value)?;

    if let Some(allowed) = &value_type.allowable_values {
        if !allowed
            .iter()
            .any(|candidate| is_allowed(value_type, candidate, &coerced))
        {
            return Err(InvalidArgumentReason::IllegalValue);
        }
    }

    if let Some(number) = coerced.as_f64() {
        if value_type.min_inclusive.is_some_and(|min| number < min)
            || value_type.max_inclusive.is_some_and(|max| number > max)
        {
            return Err(InvalidArgumentReason::IllegalValue);
        }
    }

    Ok(coerced)
}

fn coerce(kind: PrimitiveKind, value: &ArgumentValue) -> Result<ArgumentValue, InvalidArgumentReason> {
    use ArgumentValue as V;

    let coerced = match (kind, value) {
        (_, V::List(_) | V::Object(_) | V::Vacant) => None,
        (PrimitiveKind::Boolean, V::Boolean(b)) => Some(V::Boolean(*b)),
        (PrimitiveKind::Boolean, V::String(s)) => parse_bool(s).map(V::Boolean),
        (PrimitiveKind::Boolean, _) => None,
        (PrimitiveKind::Integer, V::Integer(i)) => Some(V::Integer(*i)),
        (PrimitiveKind::Integer, V::Number(n)) => integral(*n).map(V::Integer),
        (PrimitiveKind::Integer, V::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .map(V::Integer)
        }
        (PrimitiveKind::Integer, V::Boolean(_)) => None,
        (PrimitiveKind::Number, V::Integer(i)) => Some(V::Number(*i as f64)),
        (PrimitiveKind::Number, V::Number(n)) => n.is_finite().then_some(V::Number(*n)),
        (PrimitiveKind::Number, V::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(V::Number),
        (PrimitiveKind::Number, V::Boolean(_)) => None,
        (PrimitiveKind::String | PrimitiveKind::Secret, other) => {
            other.to_primitive_string().map(|s| V::String(s.into_owned()))
        }
    };

    coerced.ok_or(InvalidArgumentReason::IncorrectValueType)
}

/// Parses `true` / `false` ignoring case.
pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

fn is_allowed(value_type: &PrimitiveType, candidate: &ArgumentValue, value: &ArgumentValue) -> bool {
    let Ok(candidate) = coerce(value_type.kind, candidate) else {
        return false;
    };
    match (&candidate, value) {
        (ArgumentValue::String(a), ArgumentValue::String(b)) if value_type.case_insensitive => {
            a.to_lowercase() == b.to_lowercase()
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

/// Validates the value of an option or complex property.
///
/// `path` is the full path of the option itself. A missing value falls back
/// to the declared default; without one, a mandatory option is reported as
/// [`MissingValue`](InvalidArgumentReason::MissingValue).
///
/// # Errors
///
/// Returns [`ValueError::NestedArray`] if an array element is itself an array.
pub fn check_option(
    option: &OptionArgument,
    value: Option<&ArgumentValue>,
    path: &ArgumentPath,
) -> Result<Checked, ValueError> {
    let invalid = |reason: InvalidArgumentReason| InvalidArgument::new(reason, &option.name, path.clone());

    if path.depth() > MAX_NESTING_DEPTH {
        return Ok(Checked::failed(
            None,
            invalid(InvalidArgumentReason::NestingDepthExceeded),
        ));
    }

    let Some(value) = value
        .filter(|v| !v.is_vacant())
        .or(option.default_value.as_ref())
    else {
        if option.is_optional {
            return Ok(Checked::default());
        }
        return Ok(Checked::failed(None, invalid(InvalidArgumentReason::MissingValue)));
    };

    if !option.is_array {
        if let ArgumentValue::List(_) = value {
            return Ok(Checked::failed(
                None,
                invalid(InvalidArgumentReason::IllegalMultipleValues).with_value(value.clone()),
            ));
        }
        return check_element(option, value, path);
    }

    let items = match value {
        ArgumentValue::List(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    if items.len() > MAX_ARRAY_SIZE {
        return Ok(Checked::failed(
            None,
            invalid(InvalidArgumentReason::ArraySizeExceeded),
        ));
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_path = path.index(i);
        match item {
            ArgumentValue::Vacant => {
                return Ok(Checked::failed(
                    Some(ArgumentValue::List(out)),
                    InvalidArgument::new(
                        InvalidArgumentReason::IllegalSparseArray,
                        &option.name,
                        item_path,
                    ),
                ));
            }
            ArgumentValue::List(_) => {
                return Err(ValueError::NestedArray {
                    path: item_path.to_string(),
                });
            }
            _ => {}
        }

        let checked = check_element(option, item, &item_path)?;
        if let Some(value) = checked.value {
            out.push(value);
        }
        if let Some(invalid) = checked.invalid {
            return Ok(Checked::failed(Some(ArgumentValue::List(out)), invalid));
        }
    }

    Ok(Checked::valid(ArgumentValue::List(out)))
}

fn check_element(
    option: &OptionArgument,
    value: &ArgumentValue,
    path: &ArgumentPath,
) -> Result<Checked, ValueError> {
    match &option.value_type {
        ArgumentType::Primitive(primitive) => Ok(match check_primitive(primitive, value) {
            Ok(coerced) => Checked::valid(coerced),
            Err(reason) => Checked::failed(
                None,
                InvalidArgument::new(reason, &option.name, path.clone()).with_value(value.clone()),
            ),
        }),
        ArgumentType::Complex(complex) => {
            let ArgumentValue::Object(fields) = value else {
                return Ok(Checked::failed(
                    None,
                    InvalidArgument::new(
                        InvalidArgumentReason::IncorrectValueType,
                        &option.name,
                        path.clone(),
                    )
                    .with_value(value.clone()),
                ));
            };

            let mut out = BTreeMap::new();
            for property in &complex.properties {
                let checked =
                    check_option(property, fields.get(&property.name), &path.field(&property.name))?;
                if let Some(value) = checked.value {
                    out.insert(property.name.clone(), value);
                }
                if let Some(invalid) = checked.invalid {
                    return Ok(Checked::failed(Some(ArgumentValue::Object(out)), invalid));
                }
            }
            Ok(Checked::valid(ArgumentValue::Object(out)))
        }
    }
}

/// Validates the value of a positional argument.
pub fn check_positional(
    positional: &PositionalArgument,
    value: Option<&ArgumentValue>,
) -> Checked {
    let path = ArgumentPath::root(&positional.name);
    let invalid = |reason: InvalidArgumentReason, path: ArgumentPath| {
        InvalidArgument::new(reason, &positional.name, path)
    };

    let Some(value) = value
        .filter(|v| !v.is_vacant())
        .or(positional.default_value.as_ref())
    else {
        if positional.is_vararg_optional {
            return Checked::default();
        }
        return Checked::failed(None, invalid(InvalidArgumentReason::MissingValue, path));
    };

    if !positional.is_vararg_multiple {
        if let ArgumentValue::List(_) = value {
            return Checked::failed(
                None,
                invalid(InvalidArgumentReason::IllegalMultipleValues, path).with_value(value.clone()),
            );
        }
        return match check_primitive(&positional.value_type, value) {
            Ok(coerced) => Checked::valid(coerced),
            Err(reason) => Checked::failed(None, invalid(reason, path).with_value(value.clone())),
        };
    }

    let items = match value {
        ArgumentValue::List(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    if items.len() > MAX_ARRAY_SIZE {
        return Checked::failed(None, invalid(InvalidArgumentReason::ArraySizeExceeded, path));
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if item.is_vacant() {
            return Checked::failed(
                Some(ArgumentValue::List(out)),
                invalid(InvalidArgumentReason::IllegalSparseArray, path.index(i)),
            );
        }
        match check_primitive(&positional.value_type, item) {
            Ok(coerced) => out.push(coerced),
            Err(reason) => {
                return Checked::failed(
                    Some(ArgumentValue::List(out)),
                    invalid(reason, path.index(i)).with_value(item.clone()),
                );
            }
        }
    }

    Checked::valid(ArgumentValue::List(out))
}

/// Validates every option and positional of a sub-command.
///
/// Each top-level argument is validated independently, so the result lists
/// one failure per failing argument.
///
/// # Errors
///
/// Returns [`ValueError::NestedArray`] if an array element is itself an array.
pub fn check_sub_command_values(
    command: &SubCommand,
    values: &ArgumentValues,
) -> Result<CheckedValues, ValueError> {
    let mut checked = CheckedValues::default();

    for option in &command.options {
        let result = check_option(option, values.get(&option.name), &ArgumentPath::root(&option.name))?;
        checked.record(&option.name, result);
    }

    for positional in &command.positionals {
        let result = check_positional(positional, values.get(&positional.name));
        checked.record(&positional.name, result);
    }

    Ok(checked)
}

/// Validates the value of a global command's argument.
pub fn check_global_values(command: &GlobalCommand, values: &ArgumentValues) -> CheckedValues {
    let mut checked = CheckedValues::default();
    let Some(argument) = &command.argument else {
        return checked;
    };

    let path = ArgumentPath::root(&argument.name);
    let result = match values
        .get(&argument.name)
        .filter(|v| !v.is_vacant())
        .or(argument.default_value.as_ref())
    {
        None if !argument.is_required() => Checked::default(),
        None => Checked::failed(
            None,
            InvalidArgument::new(InvalidArgumentReason::MissingValue, &argument.name, path),
        ),
        Some(value) => match check_primitive(&argument.value_type, value) {
            Ok(coerced) => Checked::valid(coerced),
            Err(reason) => Checked::failed(
                None,
                InvalidArgument::new(reason, &argument.name, path).with_value(value.clone()),
            ),
        },
    };
    checked.record(&argument.name, result);
    checked
}
