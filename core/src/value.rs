//! Populated argument value trees.
//!
//! Values extracted from tokens, supplied as external defaults, or produced by
//! validation all share the recursive [`ArgumentValue`] type. A command's
//! values are keyed by argument name in an [`ArgumentValues`] map.
//!
//! During population an array may be filled out of order (`--list[2]=x`
//! before `--list[0]=y`); untouched slots hold [`ArgumentValue::Vacant`] until
//! validation reports them as a sparse array.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Values for one command, keyed by argument name.
pub type ArgumentValues = BTreeMap<String, ArgumentValue>;

/// A populated argument value.
///
/// # Examples
///
/// ```
/// use command_resolve_core::ArgumentValue;
///
/// let value: ArgumentValue = serde_json::from_str(r#"{"gamma": "foo", "delta": [1, 2]}"#).unwrap();
/// let ArgumentValue::Object(map) = &value else { panic!("expected object") };
/// assert_eq!(map["gamma"], ArgumentValue::from("foo"));
/// assert_eq!(
///     map["delta"],
///     ArgumentValue::List(vec![ArgumentValue::Integer(1), ArgumentValue::Integer(2)])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    /// Boolean value.
    Boolean(bool),
    /// Integral number.
    Integer(i64),
    /// Floating point number.
    Number(f64),
    /// String value; every token starts out as one.
    String(String),
    /// Array value.
    List(Vec<ArgumentValue>),
    /// Nested object value for complex options.
    Object(BTreeMap<String, ArgumentValue>),
    /// Unfilled array slot.
    Vacant,
}

impl ArgumentValue {
    /// Returns `true` for an unfilled array slot.
    pub fn is_vacant(&self) -> bool {
        matches!(self, Self::Vacant)
    }

    /// Returns `true` for booleans, numbers and strings.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Boolean(_) | Self::Integer(_) | Self::Number(_) | Self::String(_)
        )
    }

    /// Returns the string slice of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value of an integer or number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) | Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "array",
            Self::Object(_) => "object",
            Self::Vacant => "undefined",
        }
    }

    /// Converts a primitive to its string form.
    ///
    /// Returns `None` for arrays, objects and vacant slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_resolve_core::ArgumentValue;
    ///
    /// assert_eq!(ArgumentValue::Integer(3).to_primitive_string().as_deref(), Some("3"));
    /// assert_eq!(ArgumentValue::Number(1.5).to_primitive_string().as_deref(), Some("1.5"));
    /// assert_eq!(ArgumentValue::Boolean(true).to_primitive_string().as_deref(), Some("true"));
    /// assert!(ArgumentValue::List(vec![]).to_primitive_string().is_none());
    /// ```
    pub fn to_primitive_string(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s)),
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::Boolean(b) => Some(Cow::Owned(b.to_string())),
            Self::List(_) | Self::Object(_) | Self::Vacant => None,
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_primitive_string() {
            Some(s) => f.write_str(&s),
            None => {
                let raw = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&raw)
            }
        }
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ArgumentValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ArgumentValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<ArgumentValue>> From<Vec<T>> for ArgumentValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// One step of an [`ArgumentPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property (or top-level argument) name.
    Field(String),
    /// Array index.
    Index(usize),
}

/// Location of a value inside a command's argument tree.
///
/// Renders with `.` between properties and `[n]` for indices.
///
/// # Examples
///
/// ```
/// use command_resolve_core::ArgumentPath;
///
/// let path = ArgumentPath::root("alpha").index(0).field("beta").index(1).field("gamma");
/// assert_eq!(path.to_string(), "alpha[0].beta[1].gamma");
/// assert_eq!(path.depth(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ArgumentPath(Vec<PathSegment>);

impl ArgumentPath {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path starting at a top-level argument.
    pub fn root(name: &str) -> Self {
        Self(vec![PathSegment::Field(name.to_string())])
    }

    /// Returns a copy of this path extended by a property name.
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.to_string()));
        Self(segments)
    }

    /// Returns a copy of this path extended by an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Path segments in order from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of property segments, i.e. the object nesting depth.
    pub fn depth(&self) -> usize {
        self.0
            .iter()
            .filter(|segment| matches!(segment, PathSegment::Field(_)))
            .count()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ArgumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for ArgumentPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Structural errors in value trees.
///
/// These indicate malformed configuration data or a program bug rather than
/// something a user typed, so they are raised as errors instead of being
/// reported as [`InvalidArgument`](crate::InvalidArgument) records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Neither side of a merge holds a value.
    #[error("cannot merge two undefined values")]
    BothUndefined,
    /// Override and default shapes cannot be reconciled.
    #[error("cannot merge {override_kind} over {default_kind} at `{path}`")]
    TypeMismatch {
        path: String,
        override_kind: &'static str,
        default_kind: &'static str,
    },
    /// Object nesting is deeper than [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH).
    #[error("nesting depth exceeds {max} at `{path}`")]
    NestingDepthExceeded { path: String, max: usize },
    /// An array is longer than [`MAX_ARRAY_SIZE`](crate::MAX_ARRAY_SIZE).
    #[error("array of {len} entries exceeds {max} at `{path}`")]
    ArraySizeExceeded { path: String, len: usize, max: usize },
    /// An array element is itself an array.
    #[error("nested arrays are not supported at `{path}`")]
    NestedArray { path: String },
}
