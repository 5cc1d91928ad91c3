// crates/hos-config/src/lib.rs
// ============================================================================
// Module: HOS Config Library
// Description: Canonical config model and validation for the HOS engine.
// Purpose: Single source of truth for hos-engine.toml semantics.
// Dependencies: hos-core, hos-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `hos-config` defines the configuration model for the HOS engine: engine
//! policy, store backend selection, and audit sink selection. Validation is
//! strict and fail-closed; validated sections build the runtime collaborators
//! they describe.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
