//! Deep merge of parsed values over externally supplied defaults.
//!
//! Defaults come from configuration or the environment; overrides come from
//! tokens. [`merge_values`] combines the two into a new tree, leaving both
//! inputs untouched. Every leaf present in the override wins.
//!
//! Before merging, shapes are reconciled: a scalar or object facing an array
//! is wrapped in a one-element array, and a number or boolean default facing
//! a string override is stringified. Anything still mismatched afterwards is
//! a [`ValueError`], as are trees deeper than [`MAX_NESTING_DEPTH`] or arrays
//! longer than [`MAX_ARRAY_SIZE`] on either side.
//!
//! # Example
//!
//! ```
//! use command_resolve_core::*;
//!
//! let overrides = ArgumentValue::from(vec![1_i64, 2, 3, 4]);
//! let defaults = ArgumentValue::from(vec![1_i64, 2, 3]);
//! let merged = merge_values(Some(&overrides), Some(&defaults)).unwrap();
//! assert_eq!(merged, ArgumentValue::from(vec![1_i64, 2, 3, 4]));
//!
//! // A scalar override lands on index 0 of an array default.
//! let merged = merge_values(Some(&ArgumentValue::Integer(3)), Some(&ArgumentValue::from(vec![1_i64, 2]))).unwrap();
//! assert_eq!(merged, ArgumentValue::from(vec![3_i64, 2]));
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::{ArgumentPath, ArgumentValue, ArgumentValues, MAX_ARRAY_SIZE, MAX_NESTING_DEPTH, ValueError};

/// Merges an override value over a default value.
///
/// # Errors
///
/// Returns [`ValueError::BothUndefined`] if neither side holds a value, and
/// the other [`ValueError`] variants for unreconcilable shapes or limit
/// violations.
pub fn merge_values(
    overrides: Option<&ArgumentValue>,
    defaults: Option<&ArgumentValue>,
) -> Result<ArgumentValue, ValueError> {
    merge_at(overrides, defaults, &ArgumentPath::new(), 1)
}

/// Merges a command's parsed values over its default values, key by key.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
///
/// let mut parsed = ArgumentValues::new();
/// parsed.insert("region".into(), "eu-west-1".into());
///
/// let mut defaults = ArgumentValues::new();
/// defaults.insert("region".into(), "us-east-1".into());
/// defaults.insert("retries".into(), 3_i64.into());
///
/// let merged = merge_argument_values(&parsed, &defaults).unwrap();
/// assert_eq!(merged["region"], ArgumentValue::from("eu-west-1"));
/// assert_eq!(merged["retries"], ArgumentValue::Integer(3));
/// ```
///
/// # Errors
///
/// See [`merge_values`].
pub fn merge_argument_values(
    overrides: &ArgumentValues,
    defaults: &ArgumentValues,
) -> Result<ArgumentValues, ValueError> {
    merge_fields(overrides, defaults, &ArgumentPath::new(), 1)
}

fn merge_at(
    overrides: Option<&ArgumentValue>,
    defaults: Option<&ArgumentValue>,
    path: &ArgumentPath,
    depth: usize,
) -> Result<ArgumentValue, ValueError> {
    let overrides = overrides.filter(|v| !v.is_vacant());
    let defaults = defaults.filter(|v| !v.is_vacant());

    match (overrides, defaults) {
        (None, None) => Err(ValueError::BothUndefined),
        (Some(only), None) | (None, Some(only)) => {
            check_limits(only, path, depth)?;
            Ok(only.clone())
        }
        (Some(overrides), Some(defaults)) => merge_both(overrides, defaults, path, depth),
    }
}

/// Merges one slot of an array or object, where both sides may be missing.
fn merge_slot(
    overrides: Option<&ArgumentValue>,
    defaults: Option<&ArgumentValue>,
    path: &ArgumentPath,
    depth: usize,
) -> Result<ArgumentValue, ValueError> {
    let missing = |v: Option<&ArgumentValue>| v.is_none_or(ArgumentValue::is_vacant);
    if missing(overrides) && missing(defaults) {
        return Ok(ArgumentValue::Vacant);
    }
    merge_at(overrides, defaults, path, depth)
}

fn merge_both(
    overrides: &ArgumentValue,
    defaults: &ArgumentValue,
    path: &ArgumentPath,
    depth: usize,
) -> Result<ArgumentValue, ValueError> {
    let (overrides, defaults) = reconcile(overrides, defaults);

    match (overrides.as_ref(), defaults.as_ref()) {
        (ArgumentValue::List(over), ArgumentValue::List(under)) => {
            for list in [over, under] {
                if list.len() > MAX_ARRAY_SIZE {
                    return Err(ValueError::ArraySizeExceeded {
                        path: path.to_string(),
                        len: list.len(),
                        max: MAX_ARRAY_SIZE,
                    });
                }
            }
            let len = over.len().max(under.len());
            let merged = (0..len)
                .map(|i| merge_slot(over.get(i), under.get(i), &path.index(i), depth))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ArgumentValue::List(merged))
        }
        (ArgumentValue::Object(over), ArgumentValue::Object(under)) => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(depth_exceeded(path));
            }
            Ok(ArgumentValue::Object(merge_fields(over, under, path, depth + 1)?))
        }
        (over, under) if over.is_primitive() && over.kind_name() == under.kind_name() => {
            Ok(over.clone())
        }
        (over, under) => Err(ValueError::TypeMismatch {
            path: path.to_string(),
            override_kind: over.kind_name(),
            default_kind: under.kind_name(),
        }),
    }
}

fn merge_fields(
    overrides: &BTreeMap<String, ArgumentValue>,
    defaults: &BTreeMap<String, ArgumentValue>,
    path: &ArgumentPath,
    depth: usize,
) -> Result<BTreeMap<String, ArgumentValue>, ValueError> {
    let mut merged = BTreeMap::new();
    for key in overrides.keys().chain(defaults.keys()) {
        if merged.contains_key(key) {
            continue;
        }
        let value = merge_slot(overrides.get(key), defaults.get(key), &path.field(key), depth)?;
        merged.insert(key.clone(), value);
    }
    Ok(merged)
}

fn reconcile<'v>(
    overrides: &'v ArgumentValue,
    defaults: &'v ArgumentValue,
) -> (Cow<'v, ArgumentValue>, Cow<'v, ArgumentValue>) {
    use ArgumentValue as V;

    match (overrides, defaults) {
        (V::List(_), V::List(_)) => (Cow::Borrowed(overrides), Cow::Borrowed(defaults)),
        (V::List(_), other) => (
            Cow::Borrowed(overrides),
            Cow::Owned(V::List(vec![other.clone()])),
        ),
        (other, V::List(_)) => (
            Cow::Owned(V::List(vec![other.clone()])),
            Cow::Borrowed(defaults),
        ),
        (V::String(_), V::Integer(_) | V::Number(_) | V::Boolean(_)) => {
            let stringified = defaults
                .to_primitive_string()
                .map(|s| V::String(s.into_owned()))
                .unwrap_or_else(|| defaults.clone());
            (Cow::Borrowed(overrides), Cow::Owned(stringified))
        }
        _ => (Cow::Borrowed(overrides), Cow::Borrowed(defaults)),
    }
}

/// Checks nesting depth and array sizes of a value taken over unmerged.
fn check_limits(value: &ArgumentValue, path: &ArgumentPath, depth: usize) -> Result<(), ValueError> {
    match value {
        ArgumentValue::List(items) => {
            if items.len() > MAX_ARRAY_SIZE {
                return Err(ValueError::ArraySizeExceeded {
                    path: path.to_string(),
                    len: items.len(),
                    max: MAX_ARRAY_SIZE,
                });
            }
            for (i, item) in items.iter().enumerate() {
                check_limits(item, &path.index(i), depth)?;
            }
            Ok(())
        }
        ArgumentValue::Object(fields) => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(depth_exceeded(path));
            }
            for (key, item) in fields {
                check_limits(item, &path.field(key), depth + 1)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn depth_exceeded(path: &ArgumentPath) -> ValueError {
    ValueError::NestingDepthExceeded {
        path: path.to_string(),
        max: MAX_NESTING_DEPTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(entries: &[(&str, ArgumentValue)]) -> ArgumentValue {
        ArgumentValue::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn nested(depth: usize) -> ArgumentValue {
        let mut value = ArgumentValue::from("leaf");
        for _ in 0..depth {
            value = object(&[("x", value)]);
        }
        value
    }

    #[test]
    fn test_merge_keeps_default_tail() {
        let overrides = object(&[("a", ArgumentValue::from(vec![1_i64, 2, 3, 4]))]);
        let defaults = object(&[("a", ArgumentValue::from(vec![1_i64, 2, 3]))]);
        let merged = merge_values(Some(&overrides), Some(&defaults)).unwrap();
        assert_eq!(merged, object(&[("a", ArgumentValue::from(vec![1_i64, 2, 3, 4]))]));

        let overrides = object(&[("a", ArgumentValue::Integer(3))]);
        let defaults = object(&[("a", ArgumentValue::from(vec![1_i64, 2]))]);
        let merged = merge_values(Some(&overrides), Some(&defaults)).unwrap();
        assert_eq!(merged, object(&[("a", ArgumentValue::from(vec![3_i64, 2]))]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let value = object(&[
            ("name", "x".into()),
            ("tags", ArgumentValue::from(vec!["a", "b"])),
            ("inner", object(&[("flag", true.into())])),
        ]);
        assert_eq!(merge_values(Some(&value), Some(&value)).unwrap(), value);
    }

    #[test]
    fn test_merge_objects_by_key_union() {
        let overrides = object(&[("db", object(&[("host", "prod".into())]))]);
        let defaults = object(&[
            ("db", object(&[("host", "localhost".into()), ("port", 5432_i64.into())])),
            ("debug", false.into()),
        ]);

        let merged = merge_values(Some(&overrides), Some(&defaults)).unwrap();
        assert_eq!(
            merged,
            object(&[
                ("db", object(&[("host", "prod".into()), ("port", 5432_i64.into())])),
                ("debug", false.into()),
            ])
        );
    }

    #[test]
    fn test_merge_stringifies_default_for_string_override() {
        let merged = merge_values(Some(&"10".into()), Some(&ArgumentValue::Integer(3))).unwrap();
        assert_eq!(merged, ArgumentValue::from("10"));
    }

    #[test]
    fn test_merge_fills_vacant_slots_from_defaults() {
        let overrides = ArgumentValue::List(vec![ArgumentValue::Vacant, "b".into()]);
        let defaults = ArgumentValue::from(vec!["a"]);
        let merged = merge_values(Some(&overrides), Some(&defaults)).unwrap();
        assert_eq!(merged, ArgumentValue::from(vec!["a", "b"]));
    }

    #[test]
    fn test_merge_type_mismatch_is_error() {
        let err = merge_values(Some(&ArgumentValue::Integer(1)), Some(&"x".into())).unwrap_err();
        assert!(matches!(err, ValueError::TypeMismatch { .. }));

        let err = merge_values(Some(&object(&[])), Some(&true.into())).unwrap_err();
        assert!(matches!(err, ValueError::TypeMismatch { .. }));
    }

    #[test]
    fn test_merge_both_undefined_is_error() {
        assert_eq!(merge_values(None, None), Err(ValueError::BothUndefined));
        assert_eq!(
            merge_values(Some(&ArgumentValue::Vacant), None),
            Err(ValueError::BothUndefined)
        );
    }

    #[test]
    fn test_merge_depth_limit_on_either_side() {
        assert!(merge_values(Some(&nested(MAX_NESTING_DEPTH - 1)), None).is_ok());
        assert!(matches!(
            merge_values(None, Some(&nested(MAX_NESTING_DEPTH))),
            Err(ValueError::NestingDepthExceeded { .. })
        ));
        assert!(matches!(
            merge_values(Some(&nested(MAX_NESTING_DEPTH)), Some(&nested(MAX_NESTING_DEPTH))),
            Err(ValueError::NestingDepthExceeded { .. })
        ));
    }

    #[test]
    fn test_merge_array_size_limit() {
        let long = ArgumentValue::from(vec!["x"; MAX_ARRAY_SIZE + 1]);
        let short = ArgumentValue::from(vec!["y"]);
        assert!(matches!(
            merge_values(Some(&short), Some(&long)),
            Err(ValueError::ArraySizeExceeded { len: 256, .. })
        ));
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let overrides = object(&[("a", "1".into())]);
        let defaults = object(&[("b", "2".into())]);
        let before = (overrides.clone(), defaults.clone());
        merge_values(Some(&overrides), Some(&defaults)).unwrap();
        assert_eq!((overrides, defaults), before);
    }
}
