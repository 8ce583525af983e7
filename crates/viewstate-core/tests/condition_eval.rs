// crates/viewstate-core/tests/condition_eval.rs
// ============================================================================
// Module: Condition Evaluation Tests
// Description: Tests for equality, boolean algebra, and malformed conditions.
// ============================================================================
//! ## Overview
//! Validates that conditions evaluate structurally, treat absent fields as
//! `null`, and stay total on malformed input.

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
use viewstate_core::Condition;
use viewstate_core::FieldMap;
use viewstate_core::condition::evaluate;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Sample state used across tests.
fn sample_state() -> FieldMap {
    FieldMap::new()
        .with("countries", json!(["USA", "SWE"]))
        .with("type", "asmr")
        .with("show_baseline", true)
        .with("cumulative", false)
}

// ============================================================================
// SECTION: Equality
// ============================================================================

#[test]
fn equality_compares_values_structurally() -> TestResult {
    let state = sample_state();
    ensure(
        Condition::equals("countries", json!(["USA", "SWE"])).evaluate(&state),
        "identical arrays should be equal",
    )?;
    ensure(
        !Condition::equals("countries", json!(["SWE", "USA"])).evaluate(&state),
        "array order is significant",
    )?;
    ensure(Condition::equals("show_baseline", true).evaluate(&state), "bool equality")?;
    ensure(!Condition::equals("show_baseline", "true").evaluate(&state), "no type coercion")?;
    ensure(Condition::not_equals("type", "population").evaluate(&state), "inequality holds")?;
    ensure(!Condition::not_equals("type", "asmr").evaluate(&state), "inequality fails")?;
    Ok(())
}

#[test]
fn absent_fields_compare_as_null() -> TestResult {
    let state = sample_state();
    ensure(Condition::equals("date_from", Value::Null).evaluate(&state), "absent equals null")?;
    ensure(!Condition::equals("date_from", false).evaluate(&state), "absent is not false")?;
    ensure(Condition::not_equals("date_from", "2020").evaluate(&state), "absent differs")?;
    let nulled = state.with("date_from", Value::Null);
    ensure(
        Condition::equals("date_from", Value::Null).evaluate(&nulled),
        "explicit null behaves like absence",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Boolean Algebra
// ============================================================================

#[test]
fn empty_groups_follow_algebraic_identities() -> TestResult {
    let state = sample_state();
    ensure(Condition::all(Vec::new()).evaluate(&state), "all([]) is true")?;
    ensure(Condition::always().evaluate(&state), "always() is true")?;
    ensure(!Condition::any(Vec::new()).evaluate(&state), "any([]) is false")?;
    Ok(())
}

#[test]
fn nested_groups_combine_children() -> TestResult {
    let state = sample_state();
    let condition = Condition::all(vec![
        Condition::equals("type", "asmr"),
        Condition::any(vec![
            Condition::equals("cumulative", true),
            Condition::equals("show_baseline", true),
        ]),
    ]);
    ensure(condition.evaluate(&state), "nested condition should hold")?;

    let flipped = state.with("show_baseline", false);
    ensure(!condition.evaluate(&flipped), "nested condition should fail")?;
    ensure(evaluate(&condition, &state) == condition.evaluate(&state), "free fn matches method")?;
    Ok(())
}

#[test]
fn one_of_matches_any_listed_literal() -> TestResult {
    let state = FieldMap::new().with("chart_type", "weekly");
    ensure(
        Condition::one_of("chart_type", ["monthly", "weekly"]).evaluate(&state),
        "weekly is listed",
    )?;
    ensure(
        !Condition::one_of("chart_type", ["yearly", "midyear"]).evaluate(&state),
        "weekly is not listed",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Malformed Conditions
// ============================================================================

#[test]
fn empty_field_names_evaluate_false() -> TestResult {
    let state = sample_state().with("", "anything");
    ensure(!Condition::equals("", "anything").evaluate(&state), "equals on empty name")?;
    ensure(!Condition::not_equals("", "other").evaluate(&state), "not_equals on empty name")?;
    Ok(())
}

#[test]
fn evaluation_does_not_mutate_state() -> TestResult {
    let state = sample_state();
    let snapshot = state.clone();
    let _ = Condition::equals("type", "cmr").evaluate(&state);
    ensure(state == snapshot, "evaluation must be side-effect free")?;
    Ok(())
}

// ============================================================================
// SECTION: Structure
// ============================================================================

#[test]
fn depth_and_referenced_fields_walk_the_tree() -> TestResult {
    let condition = Condition::any(vec![
        Condition::equals("a", 1),
        Condition::all(vec![Condition::not_equals("b", 2), Condition::equals("c", 3)]),
    ]);
    ensure(condition.depth() == 3, format!("unexpected depth {}", condition.depth()))?;
    let fields: Vec<&str> =
        condition.referenced_fields().into_iter().map(|field| field.as_str()).collect();
    ensure(fields == vec!["a", "b", "c"], format!("unexpected fields {fields:?}"))?;
    Ok(())
}

#[test]
fn conditions_deserialize_from_tagged_json() -> TestResult {
    let condition: Condition = serde_json::from_value(json!({
        "op": "all",
        "conditions": [
            {"op": "equals", "field": "type", "value": "asmr"},
            {"op": "not_equals", "field": "cumulative", "value": true}
        ]
    }))?;
    ensure(condition.evaluate(&sample_state()), "deserialized condition should hold")?;
    let encoded = serde_json::to_value(&condition)?;
    ensure(encoded["op"] == json!("all"), "tag is preserved on encode")?;
    Ok(())
}
