// crates/hos-core/src/core/violation.rs
// ============================================================================
// Module: HOS Persisted Records
// Description: Violation records and driver profile state.
// Purpose: Define the durable records written by store collaborators.
// Dependencies: crate::core::{identifiers, result, time}, serde
// ============================================================================

//! ## Overview
//! [`HosViolation`] is the audit record of a detected violation. It is created
//! by a violation recorder, mutated only by an explicit resolve action, and
//! never deleted by the engine. [`DriverProfile`] carries auxiliary driver data,
//! including the last computed cycle-used figure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DriverId;
use crate::core::identifiers::ViolationId;
use crate::core::result::Allowance;
use crate::core::result::ComplianceCheckResult;
use crate::core::result::HosRule;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Durable record of a detected violation.
///
/// # Invariants
/// - At most one record per `(driver_id, rule, violation_time)`.
/// - `resolved_at` is present iff `is_resolved` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HosViolation {
    /// Store-assigned identifier.
    pub violation_id: ViolationId,
    /// Driver the violation belongs to.
    pub driver_id: DriverId,
    /// Violated rule.
    pub rule: HosRule,
    /// Evaluation instant at which the violation was detected.
    pub violation_time: Timestamp,
    /// Human-readable summary.
    pub description: String,
    /// Hours the rule accumulated.
    pub used_hours: f64,
    /// Rule-specific remaining figure.
    #[serde(flatten)]
    pub allowance: Allowance,
    /// Whether the violation has been resolved.
    pub is_resolved: bool,
    /// Resolution instant.
    pub resolved_at: Option<Timestamp>,
    /// Instant the record was created.
    pub created_at: Timestamp,
}

impl HosViolation {
    /// Builds an unresolved record from a violation result.
    #[must_use]
    pub fn from_result(
        violation_id: ViolationId,
        driver_id: DriverId,
        result: &ComplianceCheckResult,
        created_at: Timestamp,
    ) -> Self {
        Self {
            violation_id,
            driver_id,
            rule: result.rule,
            violation_time: result.at,
            description: result.description.clone(),
            used_hours: result.used_hours,
            allowance: result.allowance,
            is_resolved: false,
            resolved_at: None,
            created_at,
        }
    }

    /// Marks the record resolved. Already-resolved records keep their first resolution time.
    pub fn resolve(&mut self, resolved_at: Timestamp) {
        if !self.is_resolved {
            self.is_resolved = true;
            self.resolved_at = Some(resolved_at);
        }
    }
}

// ============================================================================
// SECTION: Driver Profiles
// ============================================================================

/// Auxiliary driver data attached to a driver identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    /// Driver identity.
    pub driver_id: DriverId,
    /// Optional home terminal address.
    #[serde(default)]
    pub home_terminal: Option<String>,
    /// Hours used in the current 70-hour cycle at the last evaluation.
    #[serde(default)]
    pub current_cycle_used: f64,
    /// Evaluation instant of the last cycle-used update.
    #[serde(default)]
    pub cycle_updated_at: Option<Timestamp>,
}

impl DriverProfile {
    /// Creates a profile with zero cycle usage.
    #[must_use]
    pub const fn new(driver_id: DriverId) -> Self {
        Self {
            driver_id,
            home_terminal: None,
            current_cycle_used: 0.0,
            cycle_updated_at: None,
        }
    }
}

/// Outcome of writing the cycle-used figure to a driver profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleUpdate {
    /// The profile was updated.
    Updated,
    /// No profile exists; the write was skipped.
    ProfileMissing,
}
