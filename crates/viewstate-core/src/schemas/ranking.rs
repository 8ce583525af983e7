// crates/viewstate-core/src/schemas/ranking.rs
// ============================================================================
// Module: Ranking Schema
// Description: Country ranking table fields, views, and rules.
// Purpose: Declare the ranking feature for the same generic resolver.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Two views: `absolute` (flag `a`) ranks raw excess values and `relative`
//! (base) ranks excess as a percentage of the baseline. Absolute ranking is
//! only offered for whole-year periods.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

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
pub const SCHEMA_ID: &str = "ranking";
/// State field holding the active view.
pub const VIEW_FIELD: &str = "view";
/// Generic view key.
pub const VIEW_KEY: &str = "view";
/// Base view.
pub const RELATIVE: &str = "relative";
/// Absolute view.
pub const ABSOLUTE: &str = "absolute";

/// Ranking periods.
pub const PERIODS: [&str; 4] = ["yearly", "fluseason", "midyear", "quarterly"];
/// Periods aggregated over whole years.
pub const YEARLY_PERIODS: [&str; 3] = ["yearly", "fluseason", "midyear"];
/// Jurisdiction groupings.
pub const JURISDICTIONS: [&str; 10] =
    ["countries", "countries_states", "usa", "can", "eu", "af", "as", "na", "oc", "sa"];
/// Standard populations for age standardization.
pub const STANDARD_POPULATIONS: [&str; 4] = ["who", "esp", "usa", "country"];
/// Baseline methods.
pub const BASELINE_METHODS: [&str; 5] = ["naive", "mean", "median", "lin_reg", "exp"];
/// Decimal precision choices.
pub const DECIMALS: [&str; 5] = ["auto", "0", "1", "2", "3"];

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Builds the ranking schema.
#[must_use]
pub fn schema() -> Schema {
    let fields = vec![
        Field::new("period", "p", FieldCodec::enumerated(PERIODS)),
        Field::new("jurisdiction", "j", FieldCodec::enumerated(JURISDICTIONS)),
        Field::new("standard_population", "sp", FieldCodec::enumerated(STANDARD_POPULATIONS)),
        Field::new("baseline_method", "bm", FieldCodec::enumerated(BASELINE_METHODS)),
        Field::text("date_from", "df"),
        Field::text("date_to", "dt"),
        Field::boolean("show_totals", "t").legacy("totals"),
        Field::boolean("show_totals_only", "to"),
        Field::boolean("show_percentage", "pc"),
        Field::boolean("show_prediction_interval", "pi"),
        Field::boolean("cumulative", "c"),
        Field::boolean("hide_incomplete", "hi"),
        Field::new("decimals", "d", FieldCodec::enumerated(DECIMALS)),
    ];
    let mut schema = Schema::new(SCHEMA_ID, RELATIVE, VIEW_FIELD).with_view_key(VIEW_KEY);
    for field in fields {
        schema = schema.with_field(field);
    }
    schema
        .with_view(absolute_view())
        .with_view(relative_view())
        .with_constraint(
            Constraint::new(
                "totals_only_requires_totals",
                Condition::equals("show_totals_only", true),
                "totals-only needs the totals column",
            )
            .force("show_totals", true)
            .priority(2),
        )
        .with_constraint(
            Constraint::new(
                "cumulative_hides_prediction_interval",
                Condition::equals("cumulative", true),
                "cumulative sums have no per-period interval",
            )
            .force("show_prediction_interval", false)
            .priority(1)
            .soft(),
        )
}

// ============================================================================
// SECTION: Views
// ============================================================================

/// Base view: excess relative to the baseline.
fn relative_view() -> View {
    View::new(RELATIVE)
        .default_value("period", "fluseason")
        .default_value("jurisdiction", "countries")
        .default_value("standard_population", "who")
        .default_value("baseline_method", "lin_reg")
        .default_value("show_totals", true)
        .default_value("show_totals_only", false)
        .default_value("show_percentage", true)
        .default_value("show_prediction_interval", false)
        .default_value("cumulative", false)
        .default_value("hide_incomplete", true)
        .default_value("decimals", "auto")
        .element("percentage", VisibilityRule::toggleable())
        .element("totals", VisibilityRule::toggleable())
        .element("totals_only", totals_shown())
        .element("prediction_interval", VisibilityRule::toggleable())
        .element("cumulative", VisibilityRule::toggleable())
        .element("decimals", VisibilityRule::toggleable())
}

/// Absolute view: raw excess values.
fn absolute_view() -> View {
    View::new(ABSOLUTE)
        .detected_by("a")
        .default_value("show_percentage", false)
        .default_value("decimals", "0")
        .constraint(
            Constraint::new(
                "absolute_disables_percentage",
                Condition::always(),
                "absolute values are not percentages",
            )
            .force("show_percentage", false)
            .priority(2),
        )
        .compatible_with("period", YEARLY_PERIODS.into_iter().map(Value::from))
        .element("percentage", VisibilityRule::Hidden)
        .element("totals", VisibilityRule::toggleable())
        .element("totals_only", totals_shown())
        .element("prediction_interval", VisibilityRule::toggleable())
        .element("cumulative", VisibilityRule::toggleable())
        .element("decimals", VisibilityRule::locked("0"))
}

/// Rule shown only while totals are on.
fn totals_shown() -> VisibilityRule {
    VisibilityRule::when(Condition::equals("show_totals", true))
}
