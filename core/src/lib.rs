//! Core schema and value types for command-line argument resolution.
//!
//! This crate defines what a command line can say and what it resolves to:
//!
//! - [`Command`]: a tagged sub-command, group, global or modifier command.
//! - [`OptionArgument`], [`PositionalArgument`], [`GlobalArgument`]: declared
//!   arguments with [`PrimitiveType`] or complex (nested object) values.
//! - [`ArgumentValue`]: the recursive value tree populated from tokens.
//! - [`InvalidArgument`]: a user-input error reported as data.
//!
//! Declaration checks ([`validate_command`], [`CommandRegistry::register`])
//! catch program bugs such as duplicate names or over-deep complex options.
//! Value checks ([`check_sub_command_values`], [`check_global_values`])
//! coerce and constrain user input. [`merge_values`] deep-merges parsed values
//! over external defaults.
//!
//! # Example
//!
//! ```
//! use command_resolve_core::*;
//!
//! let deploy = SubCommand::new("deploy")
//!     .with_option(
//!         OptionArgument::primitive("replicas", PrimitiveType::integer().with_min(1.0))
//!             .with_alias("r")
//!             .with_default(1_i64),
//!     )
//!     .with_positional(PositionalArgument::new("target", PrimitiveType::string()));
//!
//! let registry = CommandRegistry::with_commands([Command::Sub(deploy)]).unwrap();
//! let Some(CommandRef::Sub(deploy)) = registry.find("deploy") else {
//!     panic!("deploy is registered");
//! };
//!
//! let mut values = ArgumentValues::new();
//! values.insert("target".into(), "staging".into());
//!
//! let checked = check_sub_command_values(deploy, &values).unwrap();
//! assert!(checked.invalid.is_empty());
//! assert_eq!(checked.values["replicas"], ArgumentValue::Integer(1));
//! ```

mod check;
mod invalid;
mod merge;
mod registry;
mod types;
mod validate;
mod value;

pub use check::{
    Checked, CheckedValues, check_global_values, check_option, check_positional, check_primitive,
    check_sub_command_values, parse_bool,
};
pub use invalid::{InvalidArgument, InvalidArgumentReason};
pub use merge::{merge_argument_values, merge_values};
pub use registry::{CommandRegistry, CommandTable};
pub use types::*;
pub use validate::{SchemaError, is_valid_name, validate_command};
pub use value::{ArgumentPath, ArgumentValue, ArgumentValues, PathSegment, ValueError};
