// crates/viewstate-cli/src/main.rs
// ============================================================================
// Module: Viewstate CLI Entry Point
// Description: Command dispatcher for resolving and serializing view state.
// Purpose: Run resolve, change, view switch, and schema checks over query strings.
// Dependencies: clap, serde, serde_jcs, thiserror, time, viewstate-config, viewstate-core.
// ============================================================================

//! ## Overview
//! The `viewstate` binary loads `viewstate.toml`, builds a resolver for the
//! configured schema, and runs one resolution per invocation. Results are
//! printed as canonical JSON so two hosts can compare output byte for byte.
//! Query strings are untrusted input; the engine applies configured limits
//! before decoding.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use viewstate_config::ViewstateConfig;
use viewstate_core::Clock;
use viewstate_core::FieldChange;
use viewstate_core::RawInput;
use viewstate_core::ResolutionSink;
use viewstate_core::ResolvedState;
use viewstate_core::StateResolver;
use viewstate_core::Timestamp;
use viewstate_core::ViewId;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "viewstate", version, disable_help_subcommand = true)]
struct Cli {
    /// Optional config file path (defaults to viewstate.toml or `VIEWSTATE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Built-in schema to use instead of the configured one.
    #[arg(long, value_name = "NAME", global = true)]
    schema: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a query string and print the resolved state.
    Resolve(QueryArgs),
    /// Resolve a query string, then apply one field change.
    Change(ChangeCommand),
    /// Resolve a query string, then switch to another view.
    SwitchView(SwitchViewCommand),
    /// Resolve a query string and print its minimal canonical form.
    Serialize(QueryArgs),
    /// Print the active schema as JSON.
    Schema,
    /// Validate the schema and verify every view's defaults are stable.
    Check,
}

/// Query string input shared by the resolution commands.
#[derive(Args, Debug)]
struct QueryArgs {
    /// Query string, with or without a leading `?`.
    #[arg(long, value_name = "QUERY", default_value = "")]
    query: String,
}

/// Arguments for the `change` command.
#[derive(Args, Debug)]
struct ChangeCommand {
    /// Starting query string.
    #[command(flatten)]
    input: QueryArgs,
    /// Field to change.
    #[arg(long, value_name = "FIELD")]
    field: String,
    /// New value as JSON (`true`, `"bar"`, `["USA"]`, `null`).
    #[arg(long, value_name = "JSON")]
    value: String,
    /// Origin of the change.
    #[arg(long, value_enum, default_value_t = SourceArg::User)]
    source: SourceArg,
}

/// Arguments for the `switch-view` command.
#[derive(Args, Debug)]
struct SwitchViewCommand {
    /// Starting query string.
    #[command(flatten)]
    input: QueryArgs,
    /// Target view identifier.
    #[arg(long, value_name = "VIEW")]
    view: String,
}

/// Change origin selector.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SourceArg {
    /// Explicit user action; recorded as an override.
    User,
    /// Programmatic adjustment; never an override.
    System,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Resolution output printed by the resolve, change, and switch-view commands.
#[derive(Serialize)]
struct ResolutionOutput<'a> {
    /// Resolved state bundle.
    resolved: &'a ResolvedState,
    /// Canonical fingerprint of the resolved state.
    fingerprint: String,
    /// Minimal query string for the resolved state.
    query: String,
}

/// Fixed-point check output for one view.
#[derive(Serialize)]
struct ViewCheck {
    /// View identifier.
    view: ViewId,
    /// True when the defaults are a constraint fixed point.
    fixed_point: bool,
    /// Number of changes the first pass made to the defaults.
    first_pass_changes: usize,
    /// Number of changes a second pass made.
    violations: usize,
}

/// Output of the `check` command.
#[derive(Serialize)]
struct CheckOutput {
    /// Schema identifier.
    schema_id: String,
    /// Per-view results in declaration order.
    views: Vec<ViewCheck>,
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall clock stamping resolution logs with unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Timestamp::UnixMillis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Resolver type used by every command.
type CliResolver = StateResolver<SystemClock, Box<dyn ResolutionSink>>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Resolve(args) => command_resolve(&config, &args),
        Commands::Change(command) => command_change(&config, &command),
        Commands::SwitchView(command) => command_switch_view(&config, &command),
        Commands::Serialize(args) => command_serialize(&config, &args),
        Commands::Schema => command_schema(&config),
        Commands::Check => command_check(&config),
    }
}

/// Loads configuration and applies the `--schema` override.
fn load_config(cli: &Cli) -> CliResult<ViewstateConfig> {
    let config = ViewstateConfig::load_or_default(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    match &cli.schema {
        Some(name) => config
            .with_builtin_schema(name)
            .map_err(|err| CliError::new(format!("invalid --schema: {err}"))),
        None => Ok(config),
    }
}

/// Builds a resolver from validated configuration.
fn build_resolver(config: &ViewstateConfig) -> CliResult<CliResolver> {
    let schema = config
        .load_schema()
        .map_err(|err| CliError::new(format!("failed to load schema: {err}")))?;
    let sink = config
        .build_sink()
        .map_err(|err| CliError::new(format!("failed to open audit sink: {err}")))?;
    StateResolver::new(schema, SystemClock, sink, config.resolver_config())
        .map_err(|err| CliError::new(format!("failed to build resolver: {err}")))
}

// ============================================================================
// SECTION: Resolution Commands
// ============================================================================

/// Executes the `resolve` command.
fn command_resolve(config: &ViewstateConfig, args: &QueryArgs) -> CliResult<ExitCode> {
    let resolver = build_resolver(config)?;
    let resolved = resolve_query(&resolver, &args.query)?;
    write_resolution(&resolver, &resolved)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `change` command.
fn command_change(config: &ViewstateConfig, command: &ChangeCommand) -> CliResult<ExitCode> {
    let resolver = build_resolver(config)?;
    let initial = resolve_query(&resolver, &command.input.query)?;
    let change = build_change(&command.field, &command.value, command.source)?;
    let resolved = resolver
        .resolve_change(&change, &initial.state, &initial.user_overrides)
        .map_err(|err| CliError::new(format!("change resolution failed: {err}")))?;
    write_resolution(&resolver, &resolved)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `switch-view` command.
fn command_switch_view(
    config: &ViewstateConfig,
    command: &SwitchViewCommand,
) -> CliResult<ExitCode> {
    let resolver = build_resolver(config)?;
    let initial = resolve_query(&resolver, &command.input.query)?;
    let target = ViewId::new(command.view.as_str());
    let resolved = resolver
        .resolve_view_change(&target, &initial.state, &initial.user_overrides)
        .map_err(|err| CliError::new(format!("view change resolution failed: {err}")))?;
    write_resolution(&resolver, &resolved)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `serialize` command.
fn command_serialize(config: &ViewstateConfig, args: &QueryArgs) -> CliResult<ExitCode> {
    let resolver = build_resolver(config)?;
    let resolved = resolve_query(&resolver, &args.query)?;
    let query = resolver.serialize(&resolved.state).to_query_string();
    write_stdout_line(&query).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs initial resolution over a query string.
fn resolve_query(resolver: &CliResolver, query: &str) -> CliResult<ResolvedState> {
    resolver
        .resolve_initial(&RawInput::parse_query(query))
        .map_err(|err| CliError::new(format!("resolution failed: {err}")))
}

/// Builds a field change from CLI arguments.
fn build_change(field: &str, value: &str, source: SourceArg) -> CliResult<FieldChange> {
    let value: Value = serde_json::from_str(value)
        .map_err(|err| CliError::new(format!("--value must be JSON: {err}")))?;
    Ok(match source {
        SourceArg::User => FieldChange::user(field, value),
        SourceArg::System => FieldChange::system(field, value),
    })
}

/// Writes a resolution with its fingerprint and minimal query string.
fn write_resolution(resolver: &CliResolver, resolved: &ResolvedState) -> CliResult<()> {
    let fingerprint = resolved
        .fingerprint(resolver.config().hash_algorithm)
        .map_err(|err| CliError::new(format!("failed to fingerprint state: {err}")))?;
    let output = ResolutionOutput {
        resolved,
        fingerprint: fingerprint.to_string(),
        query: resolver.serialize(&resolved.state).to_query_string(),
    };
    write_canonical_json(&output)
}

// ============================================================================
// SECTION: Schema Commands
// ============================================================================

/// Executes the `schema` command.
fn command_schema(config: &ViewstateConfig) -> CliResult<ExitCode> {
    let resolver = build_resolver(config)?;
    write_canonical_json(resolver.schema())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `check` command.
fn command_check(config: &ViewstateConfig) -> CliResult<ExitCode> {
    let resolver = build_resolver(config)?;
    let reports = resolver
        .check_fixed_points()
        .map_err(|err| CliError::new(format!("fixed-point check failed: {err}")))?;
    let views: Vec<ViewCheck> = reports
        .into_iter()
        .map(|report| ViewCheck {
            fixed_point: report.is_fixed_point(),
            first_pass_changes: report.first_pass.len(),
            violations: report.violations.len(),
            view: report.view,
        })
        .collect();
    let stable = views.iter().all(|view| view.fixed_point);
    write_canonical_json(&CheckOutput {
        schema_id: resolver.schema().schema_id.to_string(),
        views,
    })?;
    Ok(if stable { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes canonical JSON to stdout followed by a newline.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to encode json: {err}")))?;
    bytes.push(b'\n');
    std::io::stdout().write_all(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
