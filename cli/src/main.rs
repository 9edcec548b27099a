use std::path::PathBuf;

use clap::Parser;
use command_resolve_config::{FileDefaults, SchemaFile, ServiceDecl};
use command_resolve_core::{GlobalModifierCommand, InvalidArgument};
use command_resolve_engine::{
    CommandExecutor, ExecuteError, ParsedCommand, RunOutcome, Runner, ServiceProvider,
};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "command-resolve", version)]
#[command(about = "Resolve command-line tokens against a declared command schema")]
struct Cli {
    /// Schema file declaring commands and service tiers (YAML or JSON).
    #[arg(long)]
    schema: PathBuf,
    /// Defaults file with per-command values and configuration (YAML or JSON).
    #[arg(long)]
    defaults: Option<PathBuf>,
    /// Command to run when the tokens name none; overrides the schema file.
    #[arg(long)]
    default_command: Option<String>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "warn")]
    log_level: String,
    /// Tokens to resolve; put them after `--`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

/// Collects what a run did, printed as JSON at the end.
#[derive(Debug, Default)]
struct Report {
    services: Vec<String>,
    executed: Vec<Value>,
}

impl Report {
    fn to_json(&self) -> Value {
        json!({
            "services": self.services,
            "executed": self.executed,
        })
    }
}

/// Records each executed command with its resolved values.
struct JsonExecutor;

impl CommandExecutor<Report> for JsonExecutor {
    fn execute(&self, command: &ParsedCommand<'_>, report: &mut Report) -> Result<(), ExecuteError> {
        let mut entry = json!({
            "command": command.display_name(),
            "values": serde_json::to_value(&command.values)?,
        });
        if !command.unused.is_empty() {
            entry["unused"] = json!(command.unused);
        }
        report.executed.push(entry);
        Ok(())
    }
}

/// A service tier declared in the schema file.
struct DeclaredService(ServiceDecl);

impl ServiceProvider<Report> for DeclaredService {
    fn name(&self) -> &str {
        &self.0.name
    }

    fn priority(&self) -> i32 {
        self.0.priority
    }

    fn modifiers(&self) -> &[GlobalModifierCommand] {
        &self.0.modifiers
    }

    fn initialize(&self, report: &mut Report) -> Result<(), ExecuteError> {
        info!(service = %self.0.name, "Initialized service");
        report.services.push(self.0.name.clone());
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let schema = SchemaFile::load(&cli.schema)
        .map_err(|e| format!("failed to load schema {}: {e}", cli.schema.display()))?;
    let registry = schema.registry().map_err(|e| e.to_string())?;

    let mut runner = Runner::new(&registry, JsonExecutor);
    for service in &schema.services {
        runner = runner.with_service(DeclaredService(service.clone()));
    }
    if let Some(path) = &cli.defaults {
        let defaults = FileDefaults::load(path)
            .map_err(|e| format!("failed to load defaults {}: {e}", path.display()))?;
        runner = runner.with_defaults(defaults);
    }
    if let Some(name) = cli.default_command.as_ref().or(schema.default_command.as_ref()) {
        runner = runner.with_default_command(name);
    }

    let mut report = Report::default();
    let outcome = runner.run(cli.tokens, &mut report);
    print_report(&report)?;

    match outcome {
        RunOutcome::Success => Ok(()),
        RunOutcome::ParseError(invalid) => Err(format_invalid(&invalid)),
        RunOutcome::NoCommand => Err("no command found".to_string()),
        RunOutcome::ExecutionError(err) => Err(format!("command failed: {err}")),
        RunOutcome::RuntimeError(err) => Err(err.to_string()),
    }
}

fn print_report(report: &Report) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(&report.to_json()).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn format_invalid(invalid: &[InvalidArgument]) -> String {
    let mut lines = vec![format!("{} invalid argument(s)", invalid.len())];
    lines.extend(invalid.iter().map(|i| format!("  {i}")));
    lines.join("\n")
}
