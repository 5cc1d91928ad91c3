// crates/hos-cli/src/main.rs
// ============================================================================
// Module: HOS CLI Entry Point
// Description: Command dispatcher for duty logging and compliance evaluation.
// Purpose: Wire configuration, store, audit sink, and engine behind one binary.
// Dependencies: clap, hos-config, hos-core, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! The `hos` binary records duty status changes, imports interval logs,
//! evaluates driver compliance, and manages violation records. Every command
//! prints one JSON document on stdout. Instants are RFC 3339; when `--at` is
//! omitted the current wall-clock time is read here and nowhere else.
//!
//! `evaluate` exits with status 2 when the driver is out of compliance.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use hos_config::HosConfig;
use hos_core::ComplianceEngine;
use hos_core::DriverId;
use hos_core::DriverProfile;
use hos_core::DriverProfileStore;
use hos_core::DutyInterval;
use hos_core::DutyLogStore;
use hos_core::DutyStatus;
use hos_core::SharedHosStore;
use hos_core::StatusChange;
use hos_core::Timestamp;
use hos_core::ViolationId;
use hos_core::ViolationRecorder;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an interval import file.
const MAX_IMPORT_BYTES: usize = 4 * 1024 * 1024;
/// Exit status for a successful command.
const EXIT_OK: u8 = 0;
/// Exit status for a completed evaluation that found violations.
const EXIT_NON_COMPLIANT: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "hos", disable_help_subcommand = true)]
struct Cli {
    /// Optional config file path (defaults to hos-engine.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a driver's compliance and print the report.
    Evaluate(EvaluateCommand),
    /// Record a duty status change.
    Status(StatusCommand),
    /// Append intervals from a JSON file to a driver's duty log.
    Import(ImportCommand),
    /// Register a driver profile or update its home terminal.
    Profile(ProfileCommand),
    /// List recorded violations.
    Violations(ViolationsCommand),
    /// Resolve a recorded violation.
    Resolve(ResolveCommand),
    /// Split open intervals at a day boundary.
    Rollover(RolloverCommand),
}

/// Arguments for the `evaluate` command.
#[derive(Args, Debug)]
struct EvaluateCommand {
    /// Driver identifier.
    #[arg(long)]
    driver: String,
    /// Evaluation instant (RFC 3339); defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<Timestamp>,
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Driver identifier.
    #[arg(long)]
    driver: String,
    /// New duty status (`off_duty`, `sleeper_berth`, `driving`, `on_duty`).
    #[arg(long)]
    status: DutyStatus,
    /// Instant of the change (RFC 3339); defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<Timestamp>,
    /// Location of the change.
    #[arg(long, default_value = "")]
    location: String,
    /// Free-form notes.
    #[arg(long)]
    notes: Option<String>,
}

/// Arguments for the `import` command.
#[derive(Args, Debug)]
struct ImportCommand {
    /// Driver identifier.
    #[arg(long)]
    driver: String,
    /// JSON file holding an array of duty intervals.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

/// Arguments for the `profile` command.
#[derive(Args, Debug)]
struct ProfileCommand {
    /// Driver identifier.
    #[arg(long)]
    driver: String,
    /// Home terminal.
    #[arg(long)]
    home_terminal: Option<String>,
}

/// Arguments for the `violations` command.
#[derive(Args, Debug)]
struct ViolationsCommand {
    /// Driver identifier.
    #[arg(long)]
    driver: String,
    /// Include resolved violations.
    #[arg(long)]
    all: bool,
}

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
struct ResolveCommand {
    /// Violation identifier.
    #[arg(long)]
    id: u64,
    /// Resolution instant (RFC 3339); defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<Timestamp>,
}

/// Arguments for the `rollover` command.
#[derive(Args, Debug)]
struct RolloverCommand {
    /// Day boundary (RFC 3339).
    #[arg(long, value_parser = parse_timestamp)]
    at: Timestamp,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI errors.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration could not be loaded or applied.
    #[error("config error: {0}")]
    Config(#[from] hos_config::ConfigError),
    /// Engine or store failure.
    #[error("engine error: {0}")]
    Engine(#[from] hos_core::EngineError),
    /// Direct store failure.
    #[error("store error: {0}")]
    Store(#[from] hos_core::StoreError),
    /// Input file could not be read or parsed.
    #[error("input error: {0}")]
    Input(String),
    /// Output could not be produced.
    #[error("output error: {0}")]
    Output(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// JSON document and exit status produced by a command.
#[derive(Debug)]
struct CommandOutput {
    /// Document printed on stdout.
    body: Value,
    /// Process exit status.
    status: u8,
}

impl CommandOutput {
    /// Wraps a successful command result.
    fn success<T: Serialize>(value: &T) -> CliResult<Self> {
        Ok(Self {
            body: to_json(value)?,
            status: EXIT_OK,
        })
    }
}

/// Engine wired to one shared store for all collaborator slots.
type HosEngine = ComplianceEngine<SharedHosStore, SharedHosStore, SharedHosStore>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(output) => match write_stdout_json(&output.body) {
            Ok(()) => ExitCode::from(output.status),
            Err(err) => emit_error(&err.to_string()),
        },
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads configuration, wires the engine, and runs the selected command.
fn dispatch(cli: Cli) -> CliResult<CommandOutput> {
    let config = HosConfig::load(cli.config.as_deref())?;
    let store = config.store.build()?;
    let sink = config.audit.build_sink()?;
    let engine = ComplianceEngine::new(store.clone(), store.clone(), store.clone(), config.engine)
        .with_audit(sink);
    match cli.command {
        Commands::Evaluate(command) => command_evaluate(&engine, command),
        Commands::Status(command) => command_status(&engine, command),
        Commands::Import(command) => command_import(&store, &command),
        Commands::Profile(command) => command_profile(&store, command),
        Commands::Violations(command) => command_violations(&store, &command),
        Commands::Resolve(command) => command_resolve(&engine, &command),
        Commands::Rollover(command) => command_rollover(&engine, &command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `evaluate` command.
fn command_evaluate(engine: &HosEngine, command: EvaluateCommand) -> CliResult<CommandOutput> {
    let driver_id = DriverId::new(command.driver);
    let as_of = command.at.unwrap_or_else(now);
    let report = engine.evaluate(&driver_id, as_of)?;
    let status = if report.is_compliant { EXIT_OK } else { EXIT_NON_COMPLIANT };
    Ok(CommandOutput {
        body: to_json(&report)?,
        status,
    })
}

/// Executes the `status` command.
fn command_status(engine: &HosEngine, command: StatusCommand) -> CliResult<CommandOutput> {
    let driver_id = DriverId::new(command.driver);
    let change = StatusChange {
        location: command.location,
        notes: command.notes,
        ..StatusChange::new(command.status, command.at.unwrap_or_else(now))
    };
    let opened = engine.record_status_change(&driver_id, &change)?;
    CommandOutput::success(&opened)
}

/// Executes the `import` command.
fn command_import(store: &SharedHosStore, command: &ImportCommand) -> CliResult<CommandOutput> {
    let bytes = read_bytes_with_limit(&command.file, MAX_IMPORT_BYTES)?;
    let intervals: Vec<DutyInterval> = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::Input(format!("{}: {err}", command.file.display())))?;
    let driver_id = DriverId::new(command.driver.as_str());
    for interval in &intervals {
        store.append_interval(&driver_id, interval)?;
    }
    CommandOutput::success(&json!({
        "driver_id": driver_id,
        "imported": intervals.len(),
    }))
}

/// Executes the `profile` command.
///
/// An existing profile keeps its cycle-used figure; only the home terminal
/// changes, and only when one is given.
fn command_profile(store: &SharedHosStore, command: ProfileCommand) -> CliResult<CommandOutput> {
    let driver_id = DriverId::new(command.driver);
    let mut profile =
        store.load_profile(&driver_id)?.unwrap_or_else(|| DriverProfile::new(driver_id));
    if let Some(home_terminal) = command.home_terminal {
        profile.home_terminal = Some(home_terminal);
    }
    store.register_profile(&profile)?;
    CommandOutput::success(&profile)
}

/// Executes the `violations` command.
fn command_violations(
    store: &SharedHosStore,
    command: &ViolationsCommand,
) -> CliResult<CommandOutput> {
    let driver_id = DriverId::new(command.driver.as_str());
    let violations = store.list_violations(&driver_id, !command.all)?;
    CommandOutput::success(&violations)
}

/// Executes the `resolve` command.
fn command_resolve(engine: &HosEngine, command: &ResolveCommand) -> CliResult<CommandOutput> {
    let at = command.at.unwrap_or_else(now);
    let violation = engine.resolve_violation(ViolationId::new(command.id), at)?;
    CommandOutput::success(&violation)
}

/// Executes the `rollover` command.
fn command_rollover(engine: &HosEngine, command: &RolloverCommand) -> CliResult<CommandOutput> {
    let records = engine.rollover_open_intervals(command.at)?;
    CommandOutput::success(&records)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Parses an RFC 3339 argument into a timestamp.
fn parse_timestamp(value: &str) -> Result<Timestamp, String> {
    Timestamp::parse_rfc3339(value).map_err(|err| err.to_string())
}

/// Reads the wall clock; only used when a command omits `--at`.
fn now() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    Timestamp::from_unix_millis(millis)
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let input_error = |err: std::io::Error| CliError::Input(format!("{}: {err}", path.display()));
    let file = File::open(path).map_err(input_error)?;
    let size = file.metadata().map_err(input_error)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(CliError::Input(format!(
            "{}: file exceeds size limit ({size} > {max_bytes})",
            path.display()
        )));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(input_error)?;
    if bytes.len() > max_bytes {
        return Err(CliError::Input(format!("{}: file exceeds size limit", path.display())));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Serializes a command result.
fn to_json<T: Serialize>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value).map_err(|err| CliError::Output(err.to_string()))
}

/// Writes a JSON document to stdout.
fn write_stdout_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.to_string()))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(&mut stdout, "{text}").map_err(|err| CliError::Output(err.to_string()))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
