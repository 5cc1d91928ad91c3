// crates/hos-core/src/runtime/mod.rs
// ============================================================================
// Module: HOS Runtime
// Description: Interval arithmetic, rule evaluators, engine, stores, and audit.
// Purpose: Evaluate HOS compliance against supplied duty intervals.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the four rule evaluators, the compliance
//! aggregator, interval boundary validation, an in-memory store, and the audit
//! sinks. Every surface (CLI, services, tests) must call into the same engine
//! logic to preserve determinism.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod engine;
pub mod intervals;
pub mod rules;
pub mod store;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::ComplianceAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use engine::ComplianceEngine;
pub use engine::EVALUATION_LOOKBACK_MS;
pub use engine::EngineConfig;
pub use engine::EngineError;
pub use engine::IntervalPolicy;
pub use engine::aggregate_report;
pub use intervals::Accumulation;
pub use intervals::IntervalError;
pub use intervals::accumulate;
pub use intervals::active_within;
pub use intervals::effective_duration_ms;
pub use intervals::filter_since;
pub use rules::check_11_hour;
pub use rules::check_14_hour;
pub use rules::check_30_min_break;
pub use rules::check_70_hour_8day;
pub use store::InMemoryHosStore;
pub use store::SharedHosStore;
pub use validation::validate_intervals;
