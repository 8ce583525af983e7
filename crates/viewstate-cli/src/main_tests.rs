// crates/viewstate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and change construction.
// Purpose: Ensure CLI inputs are parsed strictly before reaching the engine.
// Dependencies: viewstate-cli main helpers
// ============================================================================

//! ## Overview
//! Validates clap parsing, JSON change values, and the wall clock.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::CommandFactory;
use clap::Parser;
use serde_json::json;
use viewstate_core::ChangeSource;
use viewstate_core::Clock;
use viewstate_core::Timestamp;

use super::Cli;
use super::Commands;
use super::SourceArg;
use super::SystemClock;
use super::build_change;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = Cli::try_parse_from([
        "viewstate",
        "resolve",
        "--query",
        "e=1",
        "--schema",
        "ranking",
        "--config",
        "custom.toml",
    ])
    .expect("parse");
    assert_eq!(cli.schema.as_deref(), Some("ranking"));
    assert_eq!(cli.config.as_deref().and_then(|path| path.to_str()), Some("custom.toml"));
    match cli.command {
        Commands::Resolve(args) => assert_eq!(args.query, "e=1"),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn change_defaults_to_a_user_source() {
    let cli = Cli::try_parse_from([
        "viewstate",
        "change",
        "--field",
        "chart_style",
        "--value",
        "\"bar\"",
    ])
    .expect("parse");
    match cli.command {
        Commands::Change(command) => {
            assert_eq!(command.source, SourceArg::User);
            assert_eq!(command.input.query, "");
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn switch_view_requires_a_target() {
    assert!(Cli::try_parse_from(["viewstate", "switch-view", "--query", "e=1"]).is_err());
}

#[test]
fn build_change_parses_json_values() {
    let change = build_change("countries", "[\"USA\",\"SWE\"]", SourceArg::System).expect("change");
    assert_eq!(change.field.as_str(), "countries");
    assert_eq!(change.value, json!(["USA", "SWE"]));
    assert_eq!(change.source, ChangeSource::System);

    let cleared = build_change("date_from", "null", SourceArg::User).expect("change");
    assert!(cleared.value.is_null());
    assert_eq!(cleared.source, ChangeSource::User);
}

#[test]
fn build_change_rejects_bare_words() {
    let err = build_change("chart_style", "bar", SourceArg::User).expect_err("not json");
    assert!(err.to_string().starts_with("--value must be JSON"));
}

#[test]
fn system_clock_reports_unix_millis() {
    match SystemClock.now() {
        Timestamp::UnixMillis(millis) => assert!(millis > 1_600_000_000_000),
        other => panic!("unexpected timestamp {other:?}"),
    }
}
