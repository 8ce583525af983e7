// crates/viewstate-core/src/runtime/mod.rs
// ============================================================================
// Module: Viewstate Runtime
// Description: Resolution pipeline stages and the resolver orchestrating them.
// Purpose: Sequence detection, decoding, constraints, UI, and serialization.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Each pipeline stage is a pure function in its own module. The
//! [`StateResolver`] sequences them, stamps the log, and emits events.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod constraints;
pub mod decode;
pub mod detect;
pub mod resolver;
pub mod serialize;
pub mod sinks;
pub mod ui;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::FixedClock;
pub use clock::LogicalClock;
pub use constraints::ConstraintError;
pub use constraints::ConstraintPass;
pub use constraints::apply_constraints;
pub use constraints::ordered_constraints;
pub use decode::DecodedFields;
pub use decode::decode_fields;
pub use detect::Detection;
pub use detect::detect_view;
pub use resolver::FixedPointMode;
pub use resolver::FixedPointReport;
pub use resolver::ResolveError;
pub use resolver::ResolverConfig;
pub use resolver::StateResolver;
pub use resolver::VIEW_FALLBACK_PRIORITY;
pub use serialize::serialize_state;
pub use sinks::FileResolutionSink;
pub use sinks::MemoryResolutionSink;
pub use sinks::NoopResolutionSink;
pub use sinks::StderrResolutionSink;
pub use ui::compute_ui_state;
pub use ui::element_state;
