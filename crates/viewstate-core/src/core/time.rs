// crates/viewstate-core/src/core/time.rs
// ============================================================================
// Module: Viewstate Time Model
// Description: Timestamps stamped onto resolution logs.
// Purpose: Keep wall-clock reads out of the resolution engine.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every [`ResolutionLog`](crate::core::state::ResolutionLog) carries a
//! [`Timestamp`] taken from the host's [`Clock`](crate::interfaces::Clock).
//! The engine itself never looks at the system clock, so identical inputs
//! resolve to identical states regardless of when they run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Point in time attached to a resolution log.
///
/// # Invariants
/// - Not part of the state fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Milliseconds since the unix epoch, for hosts with a wall clock.
    UnixMillis(i64),
    /// Tick from a logical counter, for tests and replays.
    Logical(u64),
}
