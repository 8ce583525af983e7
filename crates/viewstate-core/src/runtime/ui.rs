// crates/viewstate-core/src/runtime/ui.rs
// ============================================================================
// Module: UI State Computer
// Description: Derives visible/disabled pairs from a view's UI map.
// Purpose: Give renderers a ready-made element state map.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Pure and total. Elements are independent, so the result does not depend
//! on evaluation order. A hidden element is always disabled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::state::FieldMap;
use crate::core::state::UiElementState;
use crate::core::state::UiStateMap;
use crate::core::view::View;
use crate::core::view::VisibilityRule;

// ============================================================================
// SECTION: Computation
// ============================================================================

/// Computes the UI state for every element declared by `view`.
#[must_use]
pub fn compute_ui_state(view: &View, state: &FieldMap) -> UiStateMap {
    view.ui
        .iter()
        .map(|(element, rule)| (element.clone(), element_state(rule, state)))
        .collect()
}

/// Computes the state of one element.
#[must_use]
pub fn element_state(rule: &VisibilityRule, state: &FieldMap) -> UiElementState {
    match rule {
        VisibilityRule::Hidden => UiElementState {
            visible: false,
            disabled: true,
        },
        VisibilityRule::Visible {
            toggleable, ..
        } => UiElementState {
            visible: true,
            disabled: !toggleable,
        },
        VisibilityRule::Conditional {
            condition,
        } => {
            let shown = condition.evaluate(state);
            UiElementState {
                visible: shown,
                disabled: !shown,
            }
        }
    }
}
