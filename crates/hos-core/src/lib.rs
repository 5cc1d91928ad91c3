// crates/hos-core/src/lib.rs
// ============================================================================
// Module: HOS Core Library
// Description: Public API surface for the Hours-of-Service compliance core.
// Purpose: Expose duty types, collaborator interfaces, and the rule engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! HOS core evaluates commercial driver duty-status intervals against the
//! FMCSA Hours-of-Service rules (14-hour window, 11-hour driving limit,
//! 30-minute break, 70-hour/8-day cycle). Evaluation is deterministic: the
//! evaluation instant is always an explicit parameter and the core never reads
//! wall-clock time. Persistence and logging integrate through explicit
//! interfaces rather than being embedded in the rule logic.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::DriverProfileStore;
pub use interfaces::DutyLogStore;
pub use interfaces::HosStore;
pub use interfaces::IntervalSupplier;
pub use interfaces::StoreError;
pub use interfaces::ViolationRecorder;
pub use runtime::AuditEvent;
pub use runtime::ComplianceAuditSink;
pub use runtime::ComplianceEngine;
pub use runtime::EngineConfig;
pub use runtime::EngineError;
pub use runtime::FileAuditSink;
pub use runtime::InMemoryHosStore;
pub use runtime::IntervalPolicy;
pub use runtime::NoopAuditSink;
pub use runtime::SharedHosStore;
pub use runtime::StderrAuditSink;
pub use runtime::aggregate_report;
pub use runtime::check_11_hour;
pub use runtime::check_14_hour;
pub use runtime::check_30_min_break;
pub use runtime::check_70_hour_8day;
pub use runtime::validate_intervals;
