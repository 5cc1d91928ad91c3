// crates/hos-core/src/core/mod.rs
// ============================================================================
// Module: HOS Core Types
// Description: Canonical duty-status, result, and report structures.
// Purpose: Provide stable, serializable types for HOS evaluation and records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! HOS core types define duty intervals, per-rule check results, aggregate
//! compliance reports, and the persisted violation and driver profile records.
//! These types are the canonical source of truth for any serialized surface
//! (CLI output, reporting layers, storage backends).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod duty;
pub mod identifiers;
pub mod report;
pub mod result;
pub mod time;
pub mod violation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use duty::DutyInterval;
pub use duty::DutyStatus;
pub use duty::DutyStatusParseError;
pub use duty::RolloverRecord;
pub use duty::StatusChange;
pub use identifiers::DriverId;
pub use identifiers::ViolationId;
pub use report::ComplianceReport;
pub use report::EvaluationIssue;
pub use report::RemainingTimes;
pub use report::RuleOutcome;
pub use result::Allowance;
pub use result::ComplianceCheckResult;
pub use result::HosRule;
pub use result::HosRuleParseError;
pub use result::ResultKind;
pub use time::MILLIS_PER_DAY;
pub use time::MILLIS_PER_HOUR;
pub use time::MILLIS_PER_MINUTE;
pub use time::MILLIS_PER_SECOND;
pub use time::Timestamp;
pub use time::TimestampError;
pub use time::millis_to_hours;
pub use violation::CycleUpdate;
pub use violation::DriverProfile;
pub use violation::HosViolation;
