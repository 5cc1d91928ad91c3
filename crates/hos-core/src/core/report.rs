// crates/hos-core/src/core/report.rs
// ============================================================================
// Module: HOS Compliance Report
// Description: Aggregate report produced by one engine evaluation.
// Purpose: Merge per-rule results into a flat, serializable report.
// Dependencies: crate::core::{duty, identifiers, result, time}, serde
// ============================================================================

//! ## Overview
//! A [`ComplianceReport`] is created fresh for every evaluation and has no
//! persisted identity. Rules that did not run are absent from both
//! `violations` and `compliance_status`; [`ComplianceReport::rule_outcome`]
//! reports them as [`RuleOutcome::NotEvaluated`] so downstream consumers never
//! mistake silence for success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::duty::DutyStatus;
use crate::core::identifiers::DriverId;
use crate::core::result::ComplianceCheckResult;
use crate::core::result::HosRule;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Remaining Times
// ============================================================================

/// Unified remaining-time figures copied from compliance results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RemainingTimes {
    /// Driving hours left under the 11-hour limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving: Option<f64>,
    /// Hours left in the 70-hour cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<f64>,
    /// Hours left in the 14-hour window.
    #[serde(rename = "14_hour_window", default, skip_serializing_if = "Option::is_none")]
    pub fourteen_hour_window: Option<f64>,
}

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Non-fatal problem surfaced alongside an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationIssue {
    /// Closed interval whose end precedes its start; excluded from accumulation.
    InvertedInterval {
        /// Interval status.
        status: DutyStatus,
        /// Interval start.
        start: Timestamp,
        /// Interval end.
        end: Timestamp,
    },
    /// Open interval that starts after the evaluation instant; excluded.
    OpenIntervalAfterEvaluation {
        /// Interval status.
        status: DutyStatus,
        /// Interval start.
        start: Timestamp,
    },
    /// Closed interval that starts after the evaluation instant; excluded.
    ClosedIntervalAfterEvaluation {
        /// Interval status.
        status: DutyStatus,
        /// Interval start.
        start: Timestamp,
        /// Interval end.
        end: Timestamp,
    },
    /// Two intervals overlap in time.
    OverlappingIntervals {
        /// Start of the earlier interval.
        earlier_start: Timestamp,
        /// Start of the later interval.
        later_start: Timestamp,
    },
    /// More than one interval is open.
    MultipleOpenIntervals {
        /// Number of open intervals.
        count: usize,
    },
    /// No driver profile exists to receive the cycle-used figure.
    DriverProfileMissing,
    /// Writing the cycle-used figure failed.
    CycleUpdateFailed {
        /// Store error message.
        message: String,
    },
    /// Recording violations failed.
    ViolationRecordFailed {
        /// Store error message.
        message: String,
    },
}

impl EvaluationIssue {
    /// Returns true for issues that break the non-overlap / single-open invariant.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::OverlappingIntervals { .. } | Self::MultipleOpenIntervals { .. })
    }

    /// Returns a stable label for the issue kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InvertedInterval { .. } => "inverted_interval",
            Self::OpenIntervalAfterEvaluation { .. } => "open_interval_after_evaluation",
            Self::ClosedIntervalAfterEvaluation { .. } => "closed_interval_after_evaluation",
            Self::OverlappingIntervals { .. } => "overlapping_intervals",
            Self::MultipleOpenIntervals { .. } => "multiple_open_intervals",
            Self::DriverProfileMissing => "driver_profile_missing",
            Self::CycleUpdateFailed { .. } => "cycle_update_failed",
            Self::ViolationRecordFailed { .. } => "violation_record_failed",
        }
    }
}

// ============================================================================
// SECTION: Rule Outcome
// ============================================================================

/// Per-rule outcome derived from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The rule produced no result for this evaluation.
    NotEvaluated,
    /// The rule produced a compliance result.
    Compliant,
    /// The rule produced a violation result.
    Violated,
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Aggregate compliance report for one driver at one instant.
///
/// # Invariants
/// - `is_compliant` is true iff `violations` is empty.
/// - `violations` follow the fixed rule order (14-hour, 11-hour, break, 70-hour).
/// - `compliance_status` holds only compliance-kind results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Evaluated driver.
    pub driver_id: DriverId,
    /// Evaluation instant.
    pub calculation_time: Timestamp,
    /// True when no rule produced a violation.
    pub is_compliant: bool,
    /// Violation results in rule order.
    pub violations: Vec<ComplianceCheckResult>,
    /// Compliance results keyed by rule.
    pub compliance_status: BTreeMap<HosRule, ComplianceCheckResult>,
    /// Results that are neither violation nor compliance.
    pub warnings: Vec<ComplianceCheckResult>,
    /// Unified remaining-time figures.
    pub remaining_times: RemainingTimes,
    /// Non-fatal data quality and collaborator issues.
    #[serde(default)]
    pub issues: Vec<EvaluationIssue>,
}

impl ComplianceReport {
    /// Creates an empty, compliant report.
    #[must_use]
    pub const fn new(driver_id: DriverId, calculation_time: Timestamp) -> Self {
        Self {
            driver_id,
            calculation_time,
            is_compliant: true,
            violations: Vec::new(),
            compliance_status: BTreeMap::new(),
            warnings: Vec::new(),
            remaining_times: RemainingTimes {
                driving: None,
                cycle: None,
                fourteen_hour_window: None,
            },
            issues: Vec::new(),
        }
    }

    /// Returns whether the rule was evaluated and, if so, how it resolved.
    #[must_use]
    pub fn rule_outcome(&self, rule: HosRule) -> RuleOutcome {
        if self.violations.iter().any(|result| result.rule == rule) {
            RuleOutcome::Violated
        } else if self.compliance_status.contains_key(&rule) {
            RuleOutcome::Compliant
        } else {
            RuleOutcome::NotEvaluated
        }
    }

    /// Returns true only when the rule was evaluated and found compliant.
    #[must_use]
    pub fn is_compliant_for(&self, rule: HosRule) -> bool {
        self.rule_outcome(rule) == RuleOutcome::Compliant
    }

    /// Returns the result recorded for a rule, if any.
    #[must_use]
    pub fn result_for(&self, rule: HosRule) -> Option<&ComplianceCheckResult> {
        self.violations
            .iter()
            .find(|result| result.rule == rule)
            .or_else(|| self.compliance_status.get(&rule))
    }
}
