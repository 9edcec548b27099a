//! Token resolution engine for declared commands.
//!
//! Given raw tokens and a [`CommandRegistry`](command_resolve_core::CommandRegistry),
//! the engine finds which commands were invoked and extracts their values:
//!
//! - [`normalize_front`] rewrites `-x=value` flag shorthand into `--name value`.
//! - [`scan_modifiers`] and [`scan_command`] split token sequences into
//!   [`Clause`]s and unused tokens.
//! - [`populate_global`] and [`populate_sub_command`] turn a clause's tokens
//!   into a raw value tree.
//! - [`parse_clause`] merges external defaults and validates the result.
//! - [`parse_unnamed`] resolves a command no token names from defaults alone.
//! - [`Runner`] sequences all of the above across service tiers, modifiers,
//!   the active command and a default command.
//!
//! # Example
//!
//! ```
//! use command_resolve_core::*;
//! use command_resolve_engine::*;
//!
//! let commands = vec![Command::Sub(
//!     SubCommand::new("greet")
//!         .with_option(OptionArgument::primitive("loud", PrimitiveType::boolean()).optional())
//!         .with_positional(PositionalArgument::new("name", PrimitiveType::string())),
//! )];
//! let table = CommandTable::from_commands(&commands).unwrap();
//!
//! let tokens = ["greet", "--loud", "world"].map(String::from).to_vec();
//! let mut scan = scan_command(vec![tokens], &table);
//! let clause = scan.clauses.remove(0);
//!
//! let ParseOutcome::Parsed(parsed) = parse_clause(clause, None).unwrap() else {
//!     panic!("tokens match the declaration");
//! };
//! assert_eq!(parsed.values["loud"], ArgumentValue::Boolean(true));
//! assert_eq!(parsed.values["name"], ArgumentValue::from("world"));
//! ```

mod error;
mod normalize;
mod parse;
mod populate;
mod runner;
mod scanner;

pub use error::{ExecuteError, Result, RunnerError};
pub use normalize::normalize_front;
pub use parse::{ParseOutcome, ParsedCommand, parse_clause, parse_unnamed};
pub use populate::{Populated, populate_global, populate_sub_command};
pub use runner::{
    CommandExecutor, DefaultValueProvider, NoDefaults, RunOutcome, Runner, ServiceProvider,
};
pub use scanner::{Clause, ScanResult, scan_command, scan_modifiers};
