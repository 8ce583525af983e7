// crates/viewstate-core/tests/resolve_change.rs
// ============================================================================
// Module: Change Resolution Tests
// Description: Tests for single field changes and override tracking.
// ============================================================================
//! ## Overview
//! Validates that changes re-run constraints, track user overrides, leave
//! their inputs untouched, and fall back when a change invalidates the view.

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

use serde_json::Value;
use serde_json::json;
use support::TestResult;
use support::ensure;
use support::explorer_resolver;
use support::raw;
use support::resolver_for;
use viewstate_core::ChangePriority;
use viewstate_core::ChangeSource;
use viewstate_core::FieldChange;
use viewstate_core::ResolutionTrigger;
use viewstate_core::ResolutionWarning;
use viewstate_core::schemas::explorer;

// ============================================================================
// SECTION: Overrides
// ============================================================================

#[test]
fn user_changes_become_overrides() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw(""))?;
    let change = FieldChange::user("show_logarithmic", true);
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;

    ensure(resolved.value("show_logarithmic") == Some(&json!(true)), "value applied")?;
    ensure(resolved.user_overrides.contains("show_logarithmic"), "override recorded")?;
    ensure(resolved.log.before == initial.state, "before snapshot captured")?;
    ensure(
        resolved.log.trigger
            == ResolutionTrigger::Change {
                field: "show_logarithmic".into(),
                source: ChangeSource::User,
            },
        "change trigger recorded",
    )?;
    let first = resolved.log.changes.first().ok_or("missing change record")?;
    ensure(first.priority == ChangePriority::User, "user priority recorded")?;
    Ok(())
}

#[test]
fn system_changes_leave_overrides_untouched() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw(""))?;
    let change = FieldChange::system("maximize", true);
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;

    ensure(resolved.value("maximize") == Some(&json!(true)), "value applied")?;
    ensure(resolved.user_overrides.is_empty(), "system change is not an override")?;
    let first = resolved.log.changes.first().ok_or("missing change record")?;
    ensure(first.priority == ChangePriority::System, "system priority recorded")?;
    Ok(())
}

#[test]
fn inputs_are_never_mutated() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw("ct=monthly"))?;
    let state = initial.state.clone();
    let overrides = initial.user_overrides.clone();
    let _ = resolver.resolve_change(&FieldChange::user("type", "population"), &state, &overrides)?;
    ensure(state == initial.state, "state untouched")?;
    ensure(overrides == initial.user_overrides, "overrides untouched")?;
    Ok(())
}

// ============================================================================
// SECTION: Constraints
// ============================================================================

#[test]
fn hard_constraints_win_over_user_changes() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw("e=1"))?;
    let change = FieldChange::user("show_baseline", false);
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;

    ensure(resolved.value("show_baseline") == Some(&json!(true)), "excess keeps baseline")?;
    ensure(resolved.user_overrides.contains("show_baseline"), "intent still recorded")?;
    let forced = resolved.log.changes.last().ok_or("missing change record")?;
    ensure(
        forced.constraint_id.as_ref().map(|id| id.as_str()) == Some("excess_requires_baseline"),
        format!("unexpected last record {forced:?}"),
    )?;
    Ok(())
}

#[test]
fn soft_constraints_respect_user_changes() -> TestResult {
    let resolver = explorer_resolver()?;
    let weekly = resolver.resolve_initial(&raw("ct=weekly"))?;
    ensure(weekly.value("show_labels") == Some(&json!(false)), "labels start hidden")?;

    let change = FieldChange::user("show_labels", true);
    let resolved = resolver.resolve_change(&change, &weekly.state, &weekly.user_overrides)?;
    ensure(resolved.value("show_labels") == Some(&json!(true)), "user choice survives")?;
    Ok(())
}

#[test]
fn soft_constraints_apply_to_untouched_fields() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw(""))?;
    let change = FieldChange::user("chart_type", "weekly");
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;
    ensure(resolved.value("show_labels") == Some(&json!(false)), "labels hidden")?;
    ensure(!resolved.user_overrides.contains("show_labels"), "forced value is not an override")?;
    Ok(())
}

// ============================================================================
// SECTION: Edge Cases
// ============================================================================

#[test]
fn unregistered_fields_pass_through_with_warning() -> TestResult {
    let (resolver, sink) = resolver_for(explorer::schema())?;
    let initial = resolver.resolve_initial(&raw(""))?;
    let _ = sink.drain();

    let change = FieldChange::user("colour", "red");
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;
    ensure(resolved.value("colour") == Some(&json!("red")), "value stored as-is")?;
    ensure(
        matches!(
            resolved.log.warnings.as_slice(),
            [ResolutionWarning::UnregisteredField { field }] if field.as_str() == "colour"
        ),
        format!("warnings {:?}", resolved.log.warnings),
    )?;
    ensure(sink.labels() == vec!["unregistered_field", "resolved"], "warning event emitted")?;

    let output = resolver.serialize(&resolved.state);
    ensure(output.iter().all(|(_, value)| value != "red"), "unregistered field not serialized")?;
    Ok(())
}

#[test]
fn null_values_remove_fields() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw("df=2020-01"))?;
    ensure(initial.value("date_from") == Some(&json!("2020-01")), "date set")?;

    let change = FieldChange::system("date_from", Value::Null);
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;
    ensure(!resolved.state.contains("date_from"), "field removed")?;
    let record = resolved.log.changes.first().ok_or("missing change record")?;
    ensure(record.new_value.is_none(), "removal recorded as absent")?;
    Ok(())
}

#[test]
fn changing_the_view_field_switches_views() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw(""))?;
    let change = FieldChange::user(explorer::VIEW_FIELD, explorer::EXCESS);
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;

    ensure(resolved.view.as_str() == explorer::EXCESS, "excess active")?;
    ensure(!resolved.user_overrides.contains(explorer::VIEW_FIELD), "view is never an override")?;
    ensure(
        matches!(&resolved.log.trigger, ResolutionTrigger::ViewChange { from, to }
            if from.as_str() == "mortality" && to.as_str() == "excess"),
        "handled as a view change",
    )?;
    Ok(())
}

#[test]
fn changes_that_invalidate_the_view_fall_back() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw("e=1"))?;
    let change = FieldChange::user("type", "population");
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;

    ensure(resolved.view.as_str() == explorer::MORTALITY, "excess rejected")?;
    ensure(resolved.value("chart_style") == Some(&json!("line")), "excess style reverted")?;
    ensure(resolved.value("show_baseline") == Some(&json!(false)), "population rule applied")?;
    ensure(resolved.user_overrides.contains("type"), "metric choice kept")?;
    ensure(
        resolved
            .log
            .warnings
            .iter()
            .any(|warning| matches!(warning, ResolutionWarning::ViewFallback { .. })),
        "fallback warning recorded",
    )?;
    Ok(())
}

#[test]
fn system_changes_survive_the_fallback_they_cause() -> TestResult {
    let resolver = explorer_resolver()?;
    let initial = resolver.resolve_initial(&raw("e=1"))?;
    ensure(initial.view.as_str() == explorer::EXCESS, "excess active")?;

    let change = FieldChange::system("chart_style", "matrix");
    let resolved = resolver.resolve_change(&change, &initial.state, &initial.user_overrides)?;
    ensure(resolved.view.as_str() == explorer::MORTALITY, "excess rejected")?;
    ensure(resolved.value("chart_style") == Some(&json!("matrix")), "change kept")?;
    ensure(resolved.value("show_baseline") == Some(&json!(false)), "matrix rule applied")?;
    ensure(!resolved.user_overrides.contains("chart_style"), "system change is not an override")?;
    Ok(())
}
