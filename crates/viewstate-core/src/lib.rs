// crates/viewstate-core/src/lib.rs
// ============================================================================
// Module: Viewstate Core Library
// Description: Public API surface for the view-based state resolution engine.
// Purpose: Expose core types, interfaces, runtime stages, and built-in schemas.
// Dependencies: crate::{core, interfaces, runtime, schemas}
// ============================================================================

//! ## Overview
//! Viewstate resolves application state from compact external key/value
//! input. A [`Schema`] declares fields, mutually exclusive views, and
//! priority-ordered constraints; a [`StateResolver`] turns raw input or a
//! single change into a deterministic [`ResolvedState`] with a UI map and an
//! audit log, and serializes it back to the minimal external form.
//!
//! The engine is synchronous and free of I/O. Time and logging are supplied
//! through the [`Clock`] and [`ResolutionSink`] interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;
pub mod schemas;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::ResolutionEvent;
pub use interfaces::ResolutionSink;
pub use runtime::ConstraintError;
pub use runtime::FileResolutionSink;
pub use runtime::FixedClock;
pub use runtime::FixedPointMode;
pub use runtime::FixedPointReport;
pub use runtime::LogicalClock;
pub use runtime::MemoryResolutionSink;
pub use runtime::NoopResolutionSink;
pub use runtime::ResolveError;
pub use runtime::ResolverConfig;
pub use runtime::StateResolver;
pub use runtime::StderrResolutionSink;
pub use schemas::BUILTIN_SCHEMAS;
pub use schemas::builtin_schema;
pub use schemas::is_builtin_schema;
