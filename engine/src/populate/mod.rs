//! Value population: turning a clause's tokens into a raw value tree.
//!
//! Populators only shape values; coercion and constraint checks happen
//! afterwards in the validator. Tokens a command does not take are handed
//! back as unused.

mod global;
mod subcommand;

use command_resolve_core::{ArgumentValues, InvalidArgument};

pub use global::populate_global;
pub use subcommand::populate_sub_command;

/// Raw values extracted from a clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Populated {
    pub values: ArgumentValues,
    /// Tokens the command did not consume, in input order.
    pub unused: Vec<String>,
    pub invalid: Vec<InvalidArgument>,
}

impl Populated {
    /// Returns `true` if population reported no invalid argument.
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}
