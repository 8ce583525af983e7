// crates/viewstate-core/tests/ranking_schema.rs
// ============================================================================
// Module: Ranking Schema Tests
// Description: Tests for the ranking feature on the generic resolver.
// ============================================================================
//! ## Overview
//! Confirms that a second feature schema runs on the same resolver with its
//! own views, legacy keys, and hard and soft constraints.

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

mod support;

use serde_json::json;
use support::TestResult;
use support::ensure;
use support::ranking_resolver;
use support::raw;
use viewstate_core::FieldChange;
use viewstate_core::ResolutionWarning;
use viewstate_core::UiElementState;
use viewstate_core::schemas::ranking;

#[test]
fn defaults_select_relative_ranking() -> TestResult {
    let resolver = ranking_resolver()?;
    let resolved = resolver.resolve_initial(&raw(""))?;
    ensure(resolved.view.as_str() == ranking::RELATIVE, "relative is the base view")?;
    ensure(resolved.value("show_percentage") == Some(&json!(true)), "percentages by default")?;
    ensure(resolved.user_overrides.is_empty(), "no overrides")?;
    ensure(resolver.serialize(&resolved.state).is_empty(), "defaults serialize to nothing")?;
    Ok(())
}

#[test]
fn absolute_view_hides_percentages() -> TestResult {
    let resolver = ranking_resolver()?;
    let resolved = resolver.resolve_initial(&raw("a=1&pc=1"))?;
    ensure(resolved.view.as_str() == ranking::ABSOLUTE, "absolute detected")?;
    ensure(resolved.value("show_percentage") == Some(&json!(false)), "hard rule wins")?;
    ensure(resolved.value("decimals") == Some(&json!("0")), "absolute decimals")?;
    ensure(
        resolved.element("percentage")
            == Some(UiElementState {
                visible: false,
                disabled: true,
            }),
        "percentage control hidden",
    )?;
    ensure(
        resolved.element("decimals")
            == Some(UiElementState {
                visible: true,
                disabled: true,
            }),
        "decimals locked",
    )?;
    Ok(())
}

#[test]
fn absolute_view_requires_whole_year_periods() -> TestResult {
    let resolver = ranking_resolver()?;
    let resolved = resolver.resolve_initial(&raw("a=1&p=quarterly"))?;
    ensure(resolved.view.as_str() == ranking::RELATIVE, "absolute rejected")?;
    ensure(resolved.value("decimals") == Some(&json!("auto")), "absolute default reverted")?;
    ensure(
        matches!(resolved.log.warnings.as_slice(), [ResolutionWarning::ViewFallback { .. }]),
        format!("warnings {:?}", resolved.log.warnings),
    )?;
    Ok(())
}

#[test]
fn totals_only_forces_totals() -> TestResult {
    let resolver = ranking_resolver()?;
    let resolved = resolver.resolve_initial(&raw("to=1&t=0"))?;
    ensure(resolved.value("show_totals") == Some(&json!(true)), "totals forced on")?;
    ensure(
        resolved.element("totals_only")
            == Some(UiElementState {
                visible: true,
                disabled: false,
            }),
        "totals-only control shown",
    )?;
    Ok(())
}

#[test]
fn cumulative_interval_rule_is_soft() -> TestResult {
    let resolver = ranking_resolver()?;
    let chosen = resolver.resolve_initial(&raw("c=1&pi=1"))?;
    ensure(chosen.value("show_prediction_interval") == Some(&json!(true)), "override kept")?;

    let initial = resolver.resolve_initial(&raw(""))?;
    let enabled = resolver.resolve_change(
        &FieldChange::system("show_prediction_interval", true),
        &initial.state,
        &initial.user_overrides,
    )?;
    let cumulative = resolver.resolve_change(
        &FieldChange::user("cumulative", true),
        &enabled.state,
        &enabled.user_overrides,
    )?;
    ensure(
        cumulative.value("show_prediction_interval") == Some(&json!(false)),
        "system value yields to the rule",
    )?;
    Ok(())
}

#[test]
fn legacy_totals_key_is_accepted() -> TestResult {
    let resolver = ranking_resolver()?;
    let resolved = resolver.resolve_initial(&raw("totals=0"))?;
    ensure(resolved.value("show_totals") == Some(&json!(false)), "legacy key decoded")?;
    let output = resolver.serialize(&resolved.state);
    ensure(output.to_query_string() == "t=0", "canonical key emitted")?;
    Ok(())
}
