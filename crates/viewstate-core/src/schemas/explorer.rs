// crates/viewstate-core/src/schemas/explorer.rs
// ============================================================================
// Module: Explorer Schema
// Description: General mortality analysis fields, views, and rules.
// Purpose: Declare the explorer feature for the generic resolver.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Three views, in detection order:
//! - `zscore` (flag `zs`): standardized deviation from baseline; yearly-like
//!   periodicities only.
//! - `excess` (flag `e`): excess mortality against the baseline; bars by
//!   default; incompatible with the population metric and the matrix style.
//! - `mortality`: the base view.
//!
//! Global rules: population and matrix disable the baseline, no baseline
//! disables the prediction interval, and dense periodicities hide labels
//! unless the user asked for them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;

use crate::core::condition::Condition;
use crate::core::constraint::Constraint;
use crate::core::field::Field;
use crate::core::field::FieldCodec;
use crate::core::schema::Schema;
use crate::core::view::View;
use crate::core::view::VisibilityRule;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Schema identifier.
pub const SCHEMA_ID: &str = "explorer";
/// State field holding the active view.
pub const VIEW_FIELD: &str = "view";
/// Generic view key.
pub const VIEW_KEY: &str = "view";
/// Base view.
pub const MORTALITY: &str = "mortality";
/// Excess mortality view.
pub const EXCESS: &str = "excess";
/// Z-score view.
pub const ZSCORE: &str = "zscore";

/// Chart periodicities.
pub const CHART_TYPES: [&str; 9] = [
    "yearly",
    "fluseason",
    "midyear",
    "quarterly",
    "monthly",
    "weekly",
    "weekly_13w_sma",
    "weekly_26w_sma",
    "weekly_52w_sma",
];
/// Periodicities aggregated over whole years.
pub const YEARLY_CHART_TYPES: [&str; 3] = ["yearly", "fluseason", "midyear"];
/// Periodicities dense enough to crowd data labels.
pub const DENSE_CHART_TYPES: [&str; 5] =
    ["monthly", "weekly", "weekly_13w_sma", "weekly_26w_sma", "weekly_52w_sma"];
/// Metric types.
pub const METRIC_TYPES: [&str; 5] = ["cmr", "asmr", "le", "deaths", "population"];
/// Metric types that support a baseline.
pub const BASELINE_METRIC_TYPES: [&str; 4] = ["cmr", "asmr", "le", "deaths"];
/// Chart styles.
pub const CHART_STYLES: [&str; 3] = ["line", "bar", "matrix"];
/// Baseline methods.
pub const BASELINE_METHODS: [&str; 5] = ["naive", "mean", "median", "lin_reg", "exp"];
/// Standard populations for age standardization.
pub const STANDARD_POPULATIONS: [&str; 4] = ["who", "esp", "usa", "country"];
/// Decimal precision choices.
pub const DECIMALS: [&str; 5] = ["auto", "0", "1", "2", "3"];

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Builds the explorer schema.
#[must_use]
pub fn schema() -> Schema {
    let mut schema = Schema::new(SCHEMA_ID, MORTALITY, VIEW_FIELD).with_view_key(VIEW_KEY);
    for field in fields() {
        schema = schema.with_field(field);
    }
    schema
        .with_view(zscore_view())
        .with_view(excess_view())
        .with_view(mortality_view())
        .with_constraint(
            Constraint::new(
                "population_disables_baseline",
                Condition::equals("type", "population"),
                "population counts have no baseline",
            )
            .force("show_baseline", false)
            .force("show_prediction_interval", false)
            .priority(2),
        )
        .with_constraint(
            Constraint::new(
                "matrix_disables_baseline",
                Condition::equals("chart_style", "matrix"),
                "matrix style cannot draw a baseline",
            )
            .force("show_baseline", false)
            .force("show_prediction_interval", false)
            .priority(2),
        )
        .with_constraint(
            Constraint::new(
                "prediction_interval_requires_baseline",
                Condition::equals("show_baseline", false),
                "prediction interval is derived from the baseline",
            )
            .force("show_prediction_interval", false)
            .priority(1),
        )
        .with_constraint(
            Constraint::new(
                "dense_periodicity_hides_labels",
                Condition::one_of("chart_type", DENSE_CHART_TYPES),
                "labels crowd dense periodicities",
            )
            .force("show_labels", false)
            .priority(0)
            .soft(),
        )
}

/// Field registry.
fn fields() -> Vec<Field> {
    vec![
        Field::list("countries", "c"),
        Field::new("chart_type", "ct", chart_type_codec()),
        Field::list("age_groups", "ag"),
        Field::new("type", "t", FieldCodec::enumerated(METRIC_TYPES)),
        Field::new("chart_style", "cs", FieldCodec::enumerated(CHART_STYLES)),
        Field::boolean("show_baseline", "sb").legacy("bl"),
        Field::new("baseline_method", "bm", FieldCodec::enumerated(BASELINE_METHODS)),
        Field::text("baseline_date_from", "bf"),
        Field::text("baseline_date_to", "bt"),
        Field::boolean("show_prediction_interval", "pi"),
        Field::boolean("cumulative", "ce"),
        Field::boolean("show_percentage", "p").legacy("pct"),
        Field::boolean("show_total", "st"),
        Field::boolean("maximize", "m"),
        Field::boolean("show_labels", "sl").legacy("lb"),
        Field::boolean("show_logarithmic", "lg").legacy("log"),
        Field::new("standard_population", "sp", FieldCodec::enumerated(STANDARD_POPULATIONS)),
        Field::text("date_from", "df"),
        Field::text("date_to", "dt"),
        Field::new("decimals", "dec", FieldCodec::enumerated(DECIMALS)),
    ]
}

/// Chart type codec with legacy spellings.
fn chart_type_codec() -> FieldCodec {
    let aliases: BTreeMap<String, String> = [
        ("year", "yearly"),
        ("flu_season", "fluseason"),
        ("mid_year", "midyear"),
        ("weekly_sma", "weekly_13w_sma"),
    ]
    .into_iter()
    .map(|(legacy, current)| (legacy.to_string(), current.to_string()))
    .collect();
    FieldCodec::Enumerated {
        allowed: CHART_TYPES.iter().map(ToString::to_string).collect(),
        aliases,
    }
}

// ============================================================================
// SECTION: Views
// ============================================================================

/// Base view: raw mortality metrics.
fn mortality_view() -> View {
    View::new(MORTALITY)
        .default_value("countries", json!(["USA", "SWE"]))
        .default_value("chart_type", "yearly")
        .default_value("age_groups", json!(["all"]))
        .default_value("type", "asmr")
        .default_value("chart_style", "line")
        .default_value("show_baseline", true)
        .default_value("baseline_method", "lin_reg")
        .default_value("show_prediction_interval", true)
        .default_value("cumulative", false)
        .default_value("show_percentage", false)
        .default_value("show_total", false)
        .default_value("maximize", false)
        .default_value("show_labels", true)
        .default_value("show_logarithmic", false)
        .default_value("standard_population", "who")
        .default_value("decimals", "auto")
        .element(
            "baseline",
            VisibilityRule::when(Condition::all(vec![
                Condition::not_equals("type", "population"),
                Condition::not_equals("chart_style", "matrix"),
            ])),
        )
        .element("baseline_method", baseline_shown())
        .element("prediction_interval", baseline_shown())
        .element("cumulative", VisibilityRule::Hidden)
        .element("percentage", VisibilityRule::Hidden)
        .element("total", VisibilityRule::Hidden)
        .element("logarithmic", VisibilityRule::toggleable())
        .element("labels", VisibilityRule::toggleable())
        .element("maximize", VisibilityRule::toggleable())
        .element(
            "standard_population",
            VisibilityRule::when(Condition::equals("type", "asmr")),
        )
}

/// Excess mortality view.
fn excess_view() -> View {
    View::new(EXCESS)
        .detected_by("e")
        .default_value("chart_style", "bar")
        .default_value("show_percentage", true)
        .constraint(
            Constraint::new(
                "excess_requires_baseline",
                Condition::always(),
                "excess is measured against the baseline",
            )
            .force("show_baseline", true)
            .force("show_logarithmic", false)
            .priority(2),
        )
        .constraint(
            Constraint::new(
                "excess_total_requires_cumulative",
                Condition::equals("cumulative", false),
                "totals are only meaningful for cumulative excess",
            )
            .force("show_total", false)
            .priority(1),
        )
        .compatible_with("type", values(BASELINE_METRIC_TYPES))
        .compatible_with("chart_style", values(["line", "bar"]))
        .element("baseline", VisibilityRule::locked(true))
        .element("baseline_method", VisibilityRule::toggleable())
        .element("prediction_interval", VisibilityRule::toggleable())
        .element("cumulative", VisibilityRule::toggleable())
        .element("percentage", VisibilityRule::toggleable())
        .element("total", VisibilityRule::when(Condition::equals("cumulative", true)))
        .element("logarithmic", VisibilityRule::Hidden)
        .element("labels", VisibilityRule::toggleable())
        .element("maximize", VisibilityRule::toggleable())
        .element(
            "standard_population",
            VisibilityRule::when(Condition::equals("type", "asmr")),
        )
}

/// Z-score view.
fn zscore_view() -> View {
    View::new(ZSCORE)
        .detected_by("zs")
        .default_value("show_prediction_interval", false)
        .constraint(
            Constraint::new(
                "zscore_requires_baseline",
                Condition::always(),
                "z-scores are standardized against the baseline",
            )
            .force("show_baseline", true)
            .force("show_prediction_interval", false)
            .force("show_percentage", false)
            .force("show_logarithmic", false)
            .priority(2),
        )
        .compatible_with("chart_type", values(YEARLY_CHART_TYPES))
        .compatible_with("type", values(BASELINE_METRIC_TYPES))
        .compatible_with("chart_style", values(["line", "bar"]))
        .element("baseline", VisibilityRule::locked(true))
        .element("baseline_method", VisibilityRule::toggleable())
        .element("prediction_interval", VisibilityRule::Hidden)
        .element("cumulative", VisibilityRule::Hidden)
        .element("percentage", VisibilityRule::Hidden)
        .element("total", VisibilityRule::Hidden)
        .element("logarithmic", VisibilityRule::Hidden)
        .element("labels", VisibilityRule::toggleable())
        .element("maximize", VisibilityRule::toggleable())
        .element(
            "standard_population",
            VisibilityRule::when(Condition::equals("type", "asmr")),
        )
}

/// Rule shown only while the baseline is on.
fn baseline_shown() -> VisibilityRule {
    VisibilityRule::when(Condition::equals("show_baseline", true))
}

/// Converts string literals into JSON values.
fn values<const N: usize>(items: [&str; N]) -> Vec<Value> {
    items.into_iter().map(Value::from).collect()
}
