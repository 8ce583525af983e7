// crates/viewstate-config/src/lib.rs
// ============================================================================
// Module: Viewstate Config Library
// Description: Canonical configuration model for the viewstate resolver host.
// Purpose: Provide strict, fail-closed loading of viewstate.toml.
// Dependencies: viewstate-core, serde, serde_json, toml
// ============================================================================

//! ## Overview
//! This crate owns the `viewstate.toml` model. It selects the schema a host
//! resolves against, the fixed-point verification mode, raw input limits, and
//! where resolution events are written. Hosts call [`ViewstateConfig::load`]
//! and then build a resolver from the validated sections.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
