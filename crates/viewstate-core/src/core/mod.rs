// crates/viewstate-core/src/core/mod.rs
// ============================================================================
// Module: Viewstate Core Types
// Description: Declarations and state structures for view-based resolution.
// Purpose: Provide stable, serializable types shared by the runtime and hosts.
// Dependencies: serde, serde_json, serde_jcs, sha2, smallvec, url
// ============================================================================

//! ## Overview
//! Core types describe what a feature declares (fields, views, constraints,
//! schemas) and what a resolution produces (resolved state, UI map, log).
//! They carry no behavior beyond pure evaluation and validation; sequencing
//! lives in [`crate::runtime`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod condition;
pub mod constraint;
pub mod field;
pub mod hashing;
pub mod identifiers;
pub mod raw;
pub mod schema;
pub mod state;
pub mod time;
pub mod view;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::Condition;
pub use constraint::Constraint;
pub use constraint::ConstraintPredicate;
pub use constraint::DEFAULT_CONSTRAINT_PRIORITY;
pub use constraint::PredicateError;
pub use constraint::SharedPredicate;
pub use constraint::StatePredicate;
pub use field::DecodeError;
pub use field::Field;
pub use field::FieldCodec;
pub use field::FieldTransform;
pub use field::SharedTransform;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::ConstraintId;
pub use identifiers::FieldName;
pub use identifiers::SchemaId;
pub use identifiers::UiElementId;
pub use identifiers::ViewId;
pub use raw::InputLimits;
pub use raw::RawInput;
pub use raw::RawOutput;
pub use schema::MAX_CONDITION_DEPTH;
pub use schema::Schema;
pub use schema::SchemaError;
pub use state::ChangePriority;
pub use state::ChangeRecord;
pub use state::ChangeSource;
pub use state::FieldChange;
pub use state::FieldMap;
pub use state::ResolutionLog;
pub use state::ResolutionTrigger;
pub use state::ResolutionWarning;
pub use state::ResolvedState;
pub use state::UiElementState;
pub use state::UiStateMap;
pub use state::UserOverrides;
pub use time::Timestamp;
pub use view::CompatibilityRule;
pub use view::View;
pub use view::ViewDetection;
pub use view::VisibilityRule;
