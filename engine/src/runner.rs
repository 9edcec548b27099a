//! Run orchestration across scan passes.
//!
//! A run hands token sequences from phase to phase. Each phase takes the
//! sequences left unused by the previous one, so a token consumed early can
//! never be read again later:
//!
//! 1. Modifiers of each service tier, highest tier priority first. Found
//!    modifiers (and unmentioned ones with external defaults) execute in
//!    descending execute priority, then the tier's service is initialized.
//! 2. Modifiers not owned by any service tier, the same way.
//! 3. The single active command: global, sub-command or group member.
//! 4. The default command, tried against each remaining sequence in turn.
//!
//! Commands that no token names are resolved from external defaults alone.

use std::cmp::Reverse;
use std::ops::ControlFlow;

use command_resolve_core::{
    ArgumentValues, CommandRef, CommandRegistry, CommandTable, GlobalModifierCommand, GroupCommand,
    InvalidArgument,
};
use tracing::{debug, error, info, warn};

use crate::error::{ExecuteError, Result, RunnerError};
use crate::parse::{ParseOutcome, ParsedCommand, parse_clause, parse_unnamed};
use crate::scanner::{Clause, scan_command, scan_modifiers};

/// Executes a parsed command.
pub trait CommandExecutor<C> {
    fn execute(&self, command: &ParsedCommand<'_>, context: &mut C) -> std::result::Result<(), ExecuteError>;
}

/// A service tier: a set of modifier commands run before the service
/// is initialized.
pub trait ServiceProvider<C> {
    fn name(&self) -> &str;

    /// Higher tiers run first.
    fn priority(&self) -> i32;

    fn modifiers(&self) -> &[GlobalModifierCommand];

    /// Called after the tier's modifiers have executed.
    fn initialize(&self, context: &mut C) -> std::result::Result<(), ExecuteError>;
}

/// Source of external default values, such as configuration or environment.
pub trait DefaultValueProvider {
    /// Default values for `command`, consulted before its tokens are parsed.
    fn default_values(&self, command: CommandRef<'_>) -> std::result::Result<Option<ArgumentValues>, ExecuteError>;
}

/// Provider that never supplies defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl DefaultValueProvider for NoDefaults {
    fn default_values(&self, _command: CommandRef<'_>) -> std::result::Result<Option<ArgumentValues>, ExecuteError> {
        Ok(None)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Success,
    /// User-input errors of the first command that failed to parse.
    ParseError(Vec<InvalidArgument>),
    /// No command matched and no default command applied.
    NoCommand,
    /// A command failed while executing.
    ExecutionError(ExecuteError),
    RuntimeError(RunnerError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

type Phase<T> = ControlFlow<RunOutcome, T>;

/// Resolves tokens against a registry and executes the matched commands.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
/// use command_resolve_engine::{CommandExecutor, ExecuteError, ParsedCommand, Runner};
///
/// struct Record;
///
/// impl CommandExecutor<Vec<String>> for Record {
///     fn execute(&self, command: &ParsedCommand<'_>, log: &mut Vec<String>) -> Result<(), ExecuteError> {
///         log.push(command.display_name());
///         Ok(())
///     }
/// }
///
/// let registry = CommandRegistry::with_commands([
///     Command::Group(GroupCommand::new("db").with_member(SubCommand::new("migrate"))),
///     Command::Modifier(GlobalModifierCommand::new(GlobalCommand::new("quiet").with_alias('q'), 0)),
/// ])
/// .unwrap();
///
/// let runner = Runner::new(&registry, Record);
/// let mut log = Vec::new();
/// let outcome = runner.run(vec!["-q".into(), "db".into(), "migrate".into()], &mut log);
///
/// assert!(outcome.is_success());
/// assert_eq!(log, ["quiet", "db:migrate"]);
/// ```
pub struct Runner<'r, C> {
    registry: &'r CommandRegistry,
    executor: Box<dyn CommandExecutor<C> + 'r>,
    services: Vec<Box<dyn ServiceProvider<C> + 'r>>,
    defaults: Box<dyn DefaultValueProvider + 'r>,
    default_command: Option<String>,
}

impl<'r, C> Runner<'r, C> {
    pub fn new(registry: &'r CommandRegistry, executor: impl CommandExecutor<C> + 'r) -> Self {
        Self {
            registry,
            executor: Box::new(executor),
            services: Vec::new(),
            defaults: Box::new(NoDefaults),
            default_command: None,
        }
    }

    /// Adds a service tier.
    pub fn with_service(mut self, service: impl ServiceProvider<C> + 'r) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Sets the external default-value provider.
    pub fn with_defaults(mut self, defaults: impl DefaultValueProvider + 'r) -> Self {
        self.defaults = Box::new(defaults);
        self
    }

    /// Sets the command run when no command is found in the tokens.
    ///
    /// Group members are named `group:member`.
    pub fn with_default_command(mut self, name: &str) -> Self {
        self.default_command = Some(name.to_string());
        self
    }

    /// Resolves and executes `tokens`.
    pub fn run(&self, tokens: Vec<String>, context: &mut C) -> RunOutcome {
        match self.try_run(tokens, context) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "Run failed");
                RunOutcome::RuntimeError(err)
            }
        }
    }

    fn try_run(&self, tokens: Vec<String>, context: &mut C) -> Result<RunOutcome> {
        let mut available = if tokens.is_empty() { Vec::new() } else { vec![tokens] };

        // Stable: equal priorities keep registration order.
        let mut services: Vec<&(dyn ServiceProvider<C> + 'r)> =
            self.services.iter().map(|service| service.as_ref()).collect();
        services.sort_by_key(|service| Reverse(service.priority()));
        self.check_service_modifiers(&services)?;

        for service in services {
            let table = CommandTable::from_modifiers(service.modifiers())?;
            let modifiers: Vec<_> = service.modifiers().iter().collect();
            available = match self.run_modifiers(&table, &modifiers, available, context)? {
                ControlFlow::Continue(unused) => unused,
                ControlFlow::Break(outcome) => return Ok(outcome),
            };

            debug!(service = service.name(), "Initializing service");
            service
                .initialize(context)
                .map_err(|source| RunnerError::ServiceInit {
                    service: service.name().to_string(),
                    source,
                })?;
        }

        let table = self.registry.modifier_table();
        let modifiers: Vec<_> = self.registry.modifiers().collect();
        available = match self.run_modifiers(&table, &modifiers, available, context)? {
            ControlFlow::Continue(unused) => unused,
            ControlFlow::Break(outcome) => return Ok(outcome),
        };

        let table = self.registry.command_table();
        let scan = scan_command(available, &table);
        if let Some(clause) = scan.clauses.into_iter().next() {
            return match self.parse(clause)? {
                ParseOutcome::Invalid(invalid) => Ok(RunOutcome::ParseError(invalid)),
                ParseOutcome::Parsed(parsed) => {
                    let mut unused = scan.unused;
                    if !parsed.unused.is_empty() {
                        unused.push(parsed.unused.clone());
                    }
                    Ok(self.execute_command(&parsed, &unused, context))
                }
            };
        }

        self.run_default_command(scan.unused, context)
    }

    /// Rejects service modifiers whose name or alias is already taken by a
    /// registry command or another service's modifier.
    fn check_service_modifiers(&self, services: &[&(dyn ServiceProvider<C> + 'r)]) -> Result<()> {
        let mut table = CommandTable::from_commands(self.registry.commands())?;
        for service in services {
            for modifier in service.modifiers() {
                table.insert_modifier(modifier).inspect_err(|err| {
                    warn!(service = service.name(), error = %err, "Conflicting service modifier");
                })?;
            }
        }
        Ok(())
    }

    /// Scans, parses and executes one set of modifiers.
    ///
    /// Continues with the sequences left unused.
    fn run_modifiers<'s>(
        &'s self,
        table: &CommandTable<'s>,
        modifiers: &[&'s GlobalModifierCommand],
        available: Vec<Vec<String>>,
        context: &mut C,
    ) -> Result<Phase<Vec<Vec<String>>>> {
        if table.is_empty() {
            return Ok(ControlFlow::Continue(available));
        }

        let scan = scan_modifiers(available, table);
        let mut unused = scan.unused;
        let mut queue: Vec<ParsedCommand<'s>> = Vec::new();

        for clause in scan.clauses {
            match self.parse(clause)? {
                ParseOutcome::Invalid(invalid) => return Ok(ControlFlow::Break(RunOutcome::ParseError(invalid))),
                ParseOutcome::Parsed(parsed) => {
                    if !parsed.unused.is_empty() {
                        unused.push(parsed.unused.clone());
                    }
                    queue.push(parsed);
                }
            }
        }

        // Modifiers absent from the tokens still run when defaults supply them.
        for &modifier in modifiers {
            if queue.iter().any(|parsed| parsed.command.name() == modifier.command.name) {
                continue;
            }
            let command = CommandRef::Modifier(modifier);
            let Some(defaults) = self.default_values(command)? else {
                continue;
            };
            match parse_unnamed(command, None, Some(&defaults))? {
                ParseOutcome::Invalid(invalid) => return Ok(ControlFlow::Break(RunOutcome::ParseError(invalid))),
                ParseOutcome::Parsed(parsed) => queue.push(parsed),
            }
        }

        // Stable: equal priorities keep discovery order, then declaration order.
        queue.sort_by_key(|parsed| Reverse(parsed.execute_priority().unwrap_or_default()));
        for parsed in &queue {
            if let Err(err) = self.execute(parsed, context) {
                return Ok(ControlFlow::Break(RunOutcome::ExecutionError(err)));
            }
        }

        Ok(ControlFlow::Continue(unused))
    }

    fn run_default_command(&self, available: Vec<Vec<String>>, context: &mut C) -> Result<RunOutcome> {
        let Some(name) = &self.default_command else {
            return Ok(RunOutcome::NoCommand);
        };
        let (command, group) = self.find_default_command(name)?;

        let mut last_invalid = None;
        for tokens in available {
            let clause = Clause { command, group, tokens };
            match self.parse(clause)? {
                ParseOutcome::Parsed(parsed) => {
                    let unused = if parsed.unused.is_empty() {
                        Vec::new()
                    } else {
                        vec![parsed.unused.clone()]
                    };
                    return Ok(self.execute_command(&parsed, &unused, context));
                }
                ParseOutcome::Invalid(invalid) => {
                    debug!(command = name.as_str(), invalid = invalid.len(), "Default command rejected tokens");
                    last_invalid = Some(invalid);
                }
            }
        }
        if let Some(invalid) = last_invalid {
            return Ok(RunOutcome::ParseError(invalid));
        }

        let defaults = self.default_values(command)?;
        if command.has_required_arguments() && defaults.is_none() {
            return Ok(RunOutcome::NoCommand);
        }
        Ok(match parse_unnamed(command, group, defaults.as_ref())? {
            ParseOutcome::Parsed(parsed) => self.execute_command(&parsed, &[], context),
            ParseOutcome::Invalid(invalid) => RunOutcome::ParseError(invalid),
        })
    }

    fn find_default_command(&self, name: &str) -> Result<(CommandRef<'r>, Option<&'r GroupCommand>)> {
        if let Some((group, member)) = self.registry.command_table().member(name) {
            return Ok((CommandRef::Sub(member), Some(group)));
        }
        self.registry
            .find(name)
            .map(|command| (command, None))
            .ok_or_else(|| RunnerError::UnknownDefaultCommand(name.to_string()))
    }

    fn parse<'s>(&self, clause: Clause<'s>) -> Result<ParseOutcome<'s>> {
        let defaults = self.default_values(clause.command)?;
        Ok(parse_clause(clause, defaults.as_ref())?)
    }

    fn default_values(&self, command: CommandRef<'_>) -> Result<Option<ArgumentValues>> {
        self.defaults
            .default_values(command)
            .map_err(|source| RunnerError::Defaults {
                command: command.name().to_string(),
                source,
            })
    }

    /// Executes the active command, warning about tokens nobody consumed.
    fn execute_command(&self, parsed: &ParsedCommand<'_>, unused: &[Vec<String>], context: &mut C) -> RunOutcome {
        if !unused.is_empty() {
            warn!(command = %parsed.display_name(), unused = ?unused, "Ignoring unused arguments");
        }
        match self.execute(parsed, context) {
            Ok(()) => RunOutcome::Success,
            Err(err) => RunOutcome::ExecutionError(err),
        }
    }

    fn execute(&self, parsed: &ParsedCommand<'_>, context: &mut C) -> std::result::Result<(), ExecuteError> {
        info!(command = %parsed.display_name(), "Executing command");
        self.executor.execute(parsed, context).inspect_err(|err| {
            warn!(command = %parsed.display_name(), error = %err, "Command failed");
        })
    }
}
