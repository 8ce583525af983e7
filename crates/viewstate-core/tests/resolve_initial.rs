// crates/viewstate-core/tests/resolve_initial.rs
// ============================================================================
// Module: Initial Resolution Tests
// Description: End-to-end scenarios for resolving raw input.
// ============================================================================
//! ## Overview
//! Covers the default path, hard constraint precedence, legacy keys, view
//! detection and fallback, decode failures, and input truncation.

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
use support::explorer_resolver;
use support::raw;
use support::resolver_for;
use support::strict_config;
use viewstate_core::ChangePriority;
use viewstate_core::Field;
use viewstate_core::FixedClock;
use viewstate_core::InputLimits;
use viewstate_core::NoopResolutionSink;
use viewstate_core::ResolutionTrigger;
use viewstate_core::ResolutionWarning;
use viewstate_core::ResolverConfig;
use viewstate_core::Schema;
use viewstate_core::StateResolver;
use viewstate_core::UiElementState;
use viewstate_core::View;
use viewstate_core::runtime::VIEW_FALLBACK_PRIORITY;
use viewstate_core::schemas::explorer;

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_input_resolves_to_base_defaults() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw(""))?;
    let schema = resolver.schema();
    let base = schema.base().ok_or("base view missing")?;

    ensure(resolved.view.as_str() == explorer::MORTALITY, "base view selected")?;
    ensure(resolved.state == schema.defaults_for(base), "state equals base defaults")?;
    ensure(resolved.user_overrides.is_empty(), "no overrides from empty input")?;
    ensure(resolved.log.warnings.is_empty(), "no warnings")?;
    ensure(resolved.log.trigger == ResolutionTrigger::Initial, "initial trigger")?;
    ensure(resolved.log.before.is_empty(), "initial resolution starts from nothing")?;
    ensure(
        resolved.log.changes.iter().all(|change| change.priority == ChangePriority::Default),
        "only default records",
    )?;
    ensure(resolved.value(explorer::VIEW_FIELD) == Some(&json!("mortality")), "view field set")?;
    Ok(())
}

#[test]
fn resolving_twice_is_idempotent() -> TestResult {
    let resolver = explorer_resolver()?;
    let first = resolver.resolve_initial(&raw("c=SWE&ct=monthly&e=1"))?;
    let second = resolver.resolve_initial(&raw("c=SWE&ct=monthly&e=1"))?;
    ensure(first == second, "identical input yields identical output")?;
    Ok(())
}

// ============================================================================
// SECTION: Constraints
// ============================================================================

#[test]
fn population_metric_disables_baseline() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw("t=population&sb=1"))?;

    ensure(resolved.value("show_baseline") == Some(&json!(false)), "baseline forced off")?;
    ensure(resolved.value("show_prediction_interval") == Some(&json!(false)), "interval off")?;
    ensure(
        resolved.element("baseline")
            == Some(UiElementState {
                visible: false,
                disabled: true,
            }),
        "baseline control hidden",
    )?;
    ensure(resolved.user_overrides.contains("type"), "metric is an override")?;
    ensure(
        resolved.log.changes.iter().any(|change| {
            change.field.as_str() == "show_baseline"
                && change.constraint_id.as_ref().map(|id| id.as_str())
                    == Some("population_disables_baseline")
        }),
        "forced change attributed to its constraint",
    )?;
    Ok(())
}

#[test]
fn excess_view_forces_baseline_over_explicit_input() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw("e=1&sb=0&lg=1"))?;

    ensure(resolved.view.as_str() == explorer::EXCESS, "excess detected")?;
    ensure(resolved.value("show_baseline") == Some(&json!(true)), "baseline forced on")?;
    ensure(resolved.value("show_logarithmic") == Some(&json!(false)), "log scale forced off")?;
    ensure(resolved.value("chart_style") == Some(&json!("bar")), "excess default style")?;
    ensure(resolved.user_overrides.contains("show_baseline"), "explicit input still recorded")?;
    ensure(
        resolved.element("baseline")
            == Some(UiElementState {
                visible: true,
                disabled: true,
            }),
        "baseline control locked",
    )?;
    Ok(())
}

#[test]
fn dense_periodicity_hides_labels_unless_chosen() -> TestResult {
    let resolver = explorer_resolver()?;
    let forced = resolver.resolve_initial(&raw("ct=weekly"))?;
    ensure(forced.value("show_labels") == Some(&json!(false)), "labels hidden for weekly")?;

    let chosen = resolver.resolve_initial(&raw("ct=weekly&sl=0"))?;
    ensure(chosen.value("show_labels") == Some(&json!(false)), "explicit off kept")?;
    ensure(chosen.user_overrides.contains("show_labels"), "explicit off is an override")?;
    Ok(())
}

// ============================================================================
// SECTION: Keys
// ============================================================================

#[test]
fn legacy_and_canonical_keys_are_equivalent() -> TestResult {
    let resolver = explorer_resolver()?;
    let canonical = resolver.resolve_initial(&raw("p=1"))?;
    let legacy = resolver.resolve_initial(&raw("pct=1"))?;

    ensure(canonical.value("show_percentage") == Some(&json!(true)), "canonical key")?;
    ensure(legacy.state == canonical.state, "legacy key decodes identically")?;

    let output = resolver.serialize(&legacy.state);
    ensure(output.get("p") == Some("1"), "canonical key emitted")?;
    ensure(output.get("pct").is_none(), "legacy key never emitted")?;
    Ok(())
}

#[test]
fn values_equal_to_defaults_are_not_overrides() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw("sb=1&cs=line&c=USA,SWE&ct=yearly"))?;
    ensure(
        resolved.user_overrides.is_empty(),
        format!("unexpected overrides {:?}", resolved.user_overrides),
    )?;

    let excess = resolver.resolve_initial(&raw("e=1&cs=bar&cs=line"))?;
    ensure(!excess.user_overrides.contains("chart_style"), "compared to the active view")?;
    Ok(())
}

// ============================================================================
// SECTION: View Detection
// ============================================================================

#[test]
fn detection_flags_follow_declaration_order() -> TestResult {
    let resolver = explorer_resolver()?;
    let both = resolver.resolve_initial(&raw("e=1&zs=1"))?;
    ensure(both.view.as_str() == explorer::ZSCORE, "zscore is declared first")?;

    let off = resolver.resolve_initial(&raw("e=0"))?;
    ensure(off.view.as_str() == explorer::MORTALITY, "false flag selects nothing")?;

    let generic = resolver.resolve_initial(&raw("view=excess"))?;
    ensure(generic.view.as_str() == explorer::EXCESS, "generic key selects excess")?;

    let flag_wins = resolver.resolve_initial(&raw("view=excess&zs=1"))?;
    ensure(flag_wins.view.as_str() == explorer::ZSCORE, "flags outrank the generic key")?;
    Ok(())
}

#[test]
fn legacy_detection_flags_select_their_view() -> TestResult {
    let schema = Schema::new("flags", "main", "view")
        .with_field(Field::boolean("compact", "c"))
        .with_view(View::new("alt").detected_by("alt").legacy_flag("old_alt"))
        .with_view(View::new("main"));
    let (resolver, _sink) = resolver_for(schema)?;

    let legacy = resolver.resolve_initial(&raw("old_alt=1"))?;
    ensure(legacy.view.as_str() == "alt", "legacy flag detected")?;
    ensure(
        resolver.serialize(&legacy.state).to_query_string() == "alt=1",
        "canonical flag emitted",
    )?;

    let off = resolver.resolve_initial(&raw("old_alt=0"))?;
    ensure(off.view.as_str() == "main", "false legacy flag selects nothing")?;
    Ok(())
}

#[test]
fn unknown_generic_view_falls_back_with_warning() -> TestResult {
    let (resolver, sink) = resolver_for(explorer::schema())?;
    let resolved = resolver.resolve_initial(&raw("view=heatmap"))?;
    ensure(resolved.view.as_str() == explorer::MORTALITY, "base view used")?;
    ensure(
        matches!(
            resolved.log.warnings.as_slice(),
            [ResolutionWarning::UnknownView { requested }] if requested.as_str() == "heatmap"
        ),
        format!("warnings {:?}", resolved.log.warnings),
    )?;
    ensure(sink.labels() == vec!["unknown_view", "resolved"], "warning event emitted")?;
    Ok(())
}

#[test]
fn incompatible_view_falls_back_to_base() -> TestResult {
    let (resolver, sink) = resolver_for(explorer::schema())?;
    let resolved = resolver.resolve_initial(&raw("e=1&t=population"))?;

    ensure(resolved.view.as_str() == explorer::MORTALITY, "excess rejected")?;
    ensure(resolved.value("view") == Some(&json!("mortality")), "view field follows")?;
    ensure(resolved.value("chart_style") == Some(&json!("line")), "excess default reverted")?;
    ensure(resolved.value("show_percentage") == Some(&json!(false)), "excess default reverted")?;
    ensure(resolved.value("show_baseline") == Some(&json!(false)), "base constraints apply")?;
    ensure(resolved.user_overrides.contains("type"), "user choice retained")?;
    ensure(
        matches!(
            resolved.log.warnings.as_slice(),
            [ResolutionWarning::ViewFallback { rejected, fallback, .. }]
                if rejected.as_str() == "excess" && fallback.as_str() == "mortality"
        ),
        format!("warnings {:?}", resolved.log.warnings),
    )?;
    ensure(
        resolved.log.changes.iter().any(|change| {
            change.field.as_str() == "view"
                && change.priority
                    == ChangePriority::Constraint {
                        priority: VIEW_FALLBACK_PRIORITY,
                    }
        }),
        "fallback recorded with its priority",
    )?;
    ensure(sink.labels() == vec!["view_fallback", "resolved"], "fallback event emitted")?;
    Ok(())
}

#[test]
fn zscore_requires_yearly_periodicity() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw("zs=1&ct=monthly"))?;
    ensure(resolved.view.as_str() == explorer::MORTALITY, "zscore rejected for monthly")?;
    ensure(resolved.value("chart_type") == Some(&json!("monthly")), "periodicity kept")?;
    ensure(
        resolved.value("show_prediction_interval") == Some(&json!(true)),
        "zscore default reverted to base",
    )?;
    ensure(resolved.value("show_labels") == Some(&json!(false)), "soft rule still applies")?;
    Ok(())
}

#[test]
fn explicit_input_survives_a_fallback() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw("zs=1&ct=monthly&pi=0"))?;
    ensure(resolved.view.as_str() == explorer::MORTALITY, "zscore rejected")?;
    ensure(
        resolved.value("show_prediction_interval") == Some(&json!(false)),
        "explicit value re-applied against the base view",
    )?;
    ensure(
        resolved.user_overrides.contains("show_prediction_interval"),
        "explicit value becomes an override once it differs",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Untrusted Input
// ============================================================================

#[test]
fn decode_failures_keep_defaults_and_warn() -> TestResult {
    let (resolver, sink) = resolver_for(explorer::schema())?;
    let resolved = resolver.resolve_initial(&raw("ct=daily&c=DEU"))?;

    ensure(resolved.value("chart_type") == Some(&json!("yearly")), "default kept")?;
    ensure(resolved.value("countries") == Some(&json!(["DEU"])), "other fields decoded")?;
    ensure(!resolved.user_overrides.contains("chart_type"), "failure is not an override")?;
    ensure(
        matches!(
            resolved.log.warnings.as_slice(),
            [ResolutionWarning::DecodeFailed { field, .. }] if field.as_str() == "chart_type"
        ),
        format!("warnings {:?}", resolved.log.warnings),
    )?;
    ensure(sink.labels() == vec!["decode_failed", "resolved"], "decode event emitted")?;
    Ok(())
}

#[test]
fn oversized_input_is_truncated_with_warnings() -> TestResult {
    let config = ResolverConfig {
        limits: InputLimits {
            max_pairs: 1,
            max_value_bytes: 64,
        },
        ..strict_config()
    };
    let resolver =
        StateResolver::new(explorer::schema(), FixedClock::default(), NoopResolutionSink, config)?;
    let resolved = resolver.resolve_initial(&raw("c=FRA&t=cmr"))?;

    ensure(resolved.value("countries") == Some(&json!(["FRA"])), "first pair kept")?;
    ensure(resolved.value("type") == Some(&json!("asmr")), "dropped pair ignored")?;
    ensure(
        matches!(
            resolved.log.warnings.as_slice(),
            [ResolutionWarning::InputTruncated { key, .. }] if key == "t"
        ),
        format!("warnings {:?}", resolved.log.warnings),
    )?;
    Ok(())
}

#[test]
fn unknown_keys_are_ignored() -> TestResult {
    let resolver = explorer_resolver()?;
    let resolved = resolver.resolve_initial(&raw("utm_source=mail&fbclid=xyz"))?;
    ensure(resolved.user_overrides.is_empty(), "unknown keys never become overrides")?;
    ensure(resolved.log.warnings.is_empty(), "unknown keys are silent")?;
    Ok(())
}
