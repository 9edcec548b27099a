//! User-input errors, reported as data rather than raised.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ArgumentPath, ArgumentValue};

/// Why a supplied (or missing) argument value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidArgumentReason {
    /// A mandatory value was not supplied.
    MissingValue,
    /// The value cannot be coerced to the declared kind.
    IncorrectValueType,
    /// A single-valued argument was given more than once.
    IllegalMultipleValues,
    /// The value is outside the allowable values or range.
    IllegalValue,
    /// An array has unfilled slots.
    IllegalSparseArray,
    /// A nested option path names an undeclared property.
    UnknownProperty,
    /// A path or value nests deeper than the limit.
    NestingDepthExceeded,
    /// An array is (or would become) longer than the limit.
    ArraySizeExceeded,
    /// A value was given for a complex option instead of one of its properties.
    OptionIsComplex,
}

impl InvalidArgumentReason {
    /// Upper snake case name of the reason.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingValue => "MISSING_VALUE",
            Self::IncorrectValueType => "INCORRECT_VALUE_TYPE",
            Self::IllegalMultipleValues => "ILLEGAL_MULTIPLE_VALUES",
            Self::IllegalValue => "ILLEGAL_VALUE",
            Self::IllegalSparseArray => "ILLEGAL_SPARSE_ARRAY",
            Self::UnknownProperty => "UNKNOWN_PROPERTY",
            Self::NestingDepthExceeded => "NESTING_DEPTH_EXCEEDED",
            Self::ArraySizeExceeded => "ARRAY_SIZE_EXCEEDED",
            Self::OptionIsComplex => "OPTION_IS_COMPLEX",
        }
    }

    /// Human-readable explanation.
    pub fn description(self) -> &'static str {
        match self {
            Self::MissingValue => "a value is required",
            Self::IncorrectValueType => "the value has the wrong type",
            Self::IllegalMultipleValues => "only a single value is allowed",
            Self::IllegalValue => "the value is not allowed",
            Self::IllegalSparseArray => "array entries must not be skipped",
            Self::UnknownProperty => "no such property",
            Self::NestingDepthExceeded => "the value is nested too deeply",
            Self::ArraySizeExceeded => "too many array entries",
            Self::OptionIsComplex => "the option needs a property path",
        }
    }
}

impl fmt::Display for InvalidArgumentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected argument value.
///
/// # Examples
///
/// ```
/// use command_resolve_core::{ArgumentPath, InvalidArgument, InvalidArgumentReason};
///
/// let invalid = InvalidArgument::new(
///     InvalidArgumentReason::IllegalValue,
///     "format",
///     ArgumentPath::root("format"),
/// )
/// .with_value("xml");
///
/// assert_eq!(invalid.to_string(), "ILLEGAL_VALUE: format = xml (the value is not allowed)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidArgument {
    /// What went wrong.
    pub reason: InvalidArgumentReason,
    /// Name of the declared argument or property the value belongs to.
    pub argument: String,
    /// Full path of the value, e.g. `alpha[0].beta`.
    pub path: ArgumentPath,
    /// The offending value, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ArgumentValue>,
}

impl InvalidArgument {
    /// Creates a record without an offending value.
    pub fn new(reason: InvalidArgumentReason, argument: &str, path: ArgumentPath) -> Self {
        Self {
            reason,
            argument: argument.to_string(),
            path,
            value: None,
        }
    }

    /// Attaches the offending value.
    pub fn with_value(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.path)?;
        if let Some(value) = &self.value {
            write!(f, " = {value}")?;
        }
        write!(f, " ({})", self.reason.description())
    }
}
