// crates/viewstate-core/src/runtime/detect.rs
// ============================================================================
// Module: View Detection
// Description: Selects the active view from raw external input.
// Purpose: Single total function replacing ad hoc view inference.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Detection only looks at raw input. It never consults decoded state,
//! because the detected view decides which defaults everything else is
//! decoded against. Flags are checked in schema declaration order and the
//! first truthy flag wins. A generic `view=<id>` key is the fallback before
//! the base view.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::ViewId;
use crate::core::raw::RawInput;
use crate::core::schema::Schema;

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Result of view detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Detected view (always declared by the schema).
    pub view: ViewId,
    /// View named through the generic view key that the schema does not declare.
    pub unknown_request: Option<ViewId>,
}

/// Detects the view selected by `raw`.
#[must_use]
pub fn detect_view(schema: &Schema, raw: &RawInput) -> Detection {
    let flagged = schema
        .views
        .iter()
        .find(|view| view.detection.as_ref().is_some_and(|detection| detection.matches(raw)));
    if let Some(view) = flagged {
        return Detection {
            view: view.id.clone(),
            unknown_request: None,
        };
    }

    let mut unknown_request = None;
    if let Some(key) = &schema.view_key
        && let Some(requested) = raw.get(key).and_then(<[String]>::first)
    {
        let requested = requested.trim();
        if let Some(view) = schema.view(requested) {
            return Detection {
                view: view.id.clone(),
                unknown_request: None,
            };
        }
        if !requested.is_empty() {
            unknown_request = Some(ViewId::new(requested));
        }
    }

    Detection {
        view: schema.base_view.clone(),
        unknown_request,
    }
}
