// crates/hos-core/src/runtime/engine.rs
// ============================================================================
// Module: HOS Compliance Engine
// Description: Aggregates rule evaluations into a compliance report.
// Purpose: Run all HOS rules for one driver at one instant and apply writes.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`aggregate_report`] is the pure core: it runs the four rule evaluators in
//! the fixed order (14-hour, 11-hour, break, 70-hour) and merges their results.
//! [`ComplianceEngine`] wraps it with the collaborator calls: it fetches
//! intervals, validates them against the configured [`IntervalPolicy`], writes
//! the cycle-used figure back through [`DriverProfileStore`], records
//! violations, and emits audit events.
//!
//! Security posture: interval data comes from storage that does not enforce
//! non-overlap, so the engine validates at the boundary before trusting any
//! duration arithmetic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Allowance;
use crate::core::ComplianceCheckResult;
use crate::core::ComplianceReport;
use crate::core::CycleUpdate;
use crate::core::DriverId;
use crate::core::DutyInterval;
use crate::core::EvaluationIssue;
use crate::core::HosRule;
use crate::core::HosViolation;
use crate::core::MILLIS_PER_DAY;
use crate::core::ResultKind;
use crate::core::RolloverRecord;
use crate::core::StatusChange;
use crate::core::Timestamp;
use crate::core::ViolationId;
use crate::interfaces::DriverProfileStore;
use crate::interfaces::DutyLogStore;
use crate::interfaces::IntervalSupplier;
use crate::interfaces::StoreError;
use crate::interfaces::ViolationRecorder;
use crate::runtime::audit::AuditEvent;
use crate::runtime::audit::ComplianceAuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::rules::check_11_hour;
use crate::runtime::rules::check_14_hour;
use crate::runtime::rules::check_30_min_break;
use crate::runtime::rules::check_70_hour_8day;
use crate::runtime::validation::validate_intervals;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Lookback used when fetching intervals; the widest rule window (8 days).
pub const EVALUATION_LOOKBACK_MS: i64 = 8 * MILLIS_PER_DAY;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Handling of structurally invalid interval sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalPolicy {
    /// Report issues on the report and evaluate anyway.
    #[default]
    Flag,
    /// Fail the evaluation on overlapping or multiply-open intervals.
    Reject,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Handling of structurally invalid interval sets.
    #[serde(default)]
    pub interval_policy: IntervalPolicy,
    /// Whether violation results are written to the violation recorder.
    #[serde(default = "default_record_violations")]
    pub record_violations: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_policy: IntervalPolicy::Flag,
            record_violations: true,
        }
    }
}

/// Default for [`EngineConfig::record_violations`].
const fn default_record_violations() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Compliance engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Interval supplier or duty log failed.
    #[error("hos engine store failure: {0}")]
    Supplier(#[from] StoreError),
    /// Interval set rejected under [`IntervalPolicy::Reject`].
    #[error("hos engine rejected interval set: {} structural issue(s)", .0.len())]
    InvalidIntervals(Vec<EvaluationIssue>),
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Runs all four rules and merges their results into a report.
///
/// Pure: no collaborator is called and no clock is read. Interval validation
/// issues are attached to the report.
#[must_use]
pub fn aggregate_report(
    driver_id: &DriverId,
    intervals: &[DutyInterval],
    as_of: Timestamp,
) -> ComplianceReport {
    let mut report = ComplianceReport::new(driver_id.clone(), as_of);
    report.issues = validate_intervals(intervals, as_of);
    let results = [
        check_14_hour(intervals, as_of),
        Some(check_11_hour(intervals, as_of)),
        check_30_min_break(intervals, as_of),
        Some(check_70_hour_8day(intervals, as_of)),
    ];
    for result in results.into_iter().flatten() {
        merge_result(&mut report, result);
    }
    report
}

/// Merges one rule result into the report.
fn merge_result(report: &mut ComplianceReport, result: ComplianceCheckResult) {
    match result.kind {
        ResultKind::Violation => {
            report.is_compliant = false;
            report.violations.push(result);
        }
        ResultKind::Compliance => {
            match result.allowance {
                Allowance::RemainingDriving(hours) => report.remaining_times.driving = Some(hours),
                Allowance::RemainingHours(hours) => report.remaining_times.cycle = Some(hours),
                Allowance::RemainingTime(hours) => {
                    report.remaining_times.fourteen_hour_window = Some(hours);
                }
                Allowance::BreakRequired(_) => {}
            }
            report.compliance_status.insert(result.rule, result);
        }
        ResultKind::Warning => report.warnings.push(result),
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Compliance engine bound to its collaborators.
pub struct ComplianceEngine<S, P, V> {
    /// Interval supplier (duty log).
    supplier: S,
    /// Driver profile store receiving cycle-used writes.
    profiles: P,
    /// Violation recorder.
    violations: V,
    /// Audit sink.
    audit: Arc<dyn ComplianceAuditSink>,
    /// Engine configuration.
    config: EngineConfig,
}

impl<S, P, V> ComplianceEngine<S, P, V>
where
    S: IntervalSupplier,
    P: DriverProfileStore,
    V: ViolationRecorder,
{
    /// Creates a new engine with a no-op audit sink.
    #[must_use]
    pub fn new(supplier: S, profiles: P, violations: V, config: EngineConfig) -> Self {
        Self {
            supplier,
            profiles,
            violations,
            audit: Arc::new(NoopAuditSink),
            config,
        }
    }

    /// Returns the engine with the provided audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn ComplianceAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluates compliance for one driver at `as_of`.
    ///
    /// Collaborator write failures are attached to the report as issues; only
    /// a failed interval fetch or a rejected interval set fails the call.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Supplier`] when intervals cannot be fetched, or
    /// [`EngineError::InvalidIntervals`] under [`IntervalPolicy::Reject`].
    pub fn evaluate(
        &self,
        driver_id: &DriverId,
        as_of: Timestamp,
    ) -> Result<ComplianceReport, EngineError> {
        let since = as_of.saturating_sub_millis(EVALUATION_LOOKBACK_MS);
        let intervals = self.supplier.fetch_intervals(driver_id, since)?;

        if self.config.interval_policy == IntervalPolicy::Reject {
            let structural: Vec<EvaluationIssue> = validate_intervals(&intervals, as_of)
                .into_iter()
                .filter(EvaluationIssue::is_structural)
                .collect();
            if !structural.is_empty() {
                for issue in &structural {
                    self.audit_issue(driver_id, as_of, issue);
                }
                return Err(EngineError::InvalidIntervals(structural));
            }
        }

        let mut report = aggregate_report(driver_id, &intervals, as_of);

        let cycle_used = report
            .compliance_status
            .get(&HosRule::SeventyHourEightDay)
            .map(|result| result.used_hours);
        if let Some(hours) = cycle_used {
            self.persist_cycle_used(&mut report, hours);
        }

        if self.config.record_violations && !report.violations.is_empty() {
            match self.violations.record_violations(driver_id, &report.violations, as_of) {
                Ok(created) if !created.is_empty() => {
                    self.audit.record(&AuditEvent::ViolationsRecorded {
                        driver_id: driver_id.clone(),
                        calculation_time: as_of,
                        count: created.len(),
                    });
                }
                Ok(_) => {}
                Err(err) => report.issues.push(EvaluationIssue::ViolationRecordFailed {
                    message: err.to_string(),
                }),
            }
        }

        for issue in &report.issues {
            self.audit_issue(driver_id, as_of, issue);
        }
        self.audit.record(&AuditEvent::EvaluationCompleted {
            driver_id: driver_id.clone(),
            calculation_time: as_of,
            is_compliant: report.is_compliant,
            violation_count: report.violations.len(),
            issue_count: report.issues.len(),
        });
        Ok(report)
    }

    /// Writes the cycle-used figure and records any failure on the report.
    fn persist_cycle_used(&self, report: &mut ComplianceReport, hours: f64) {
        let driver_id = &report.driver_id;
        let at = report.calculation_time;
        match self.profiles.persist_cycle_used(driver_id, hours, at) {
            Ok(CycleUpdate::Updated) => {
                self.audit.record(&AuditEvent::CycleUsedPersisted {
                    driver_id: driver_id.clone(),
                    calculation_time: at,
                    cycle_used_hours: hours,
                });
            }
            Ok(CycleUpdate::ProfileMissing) => {
                report.issues.push(EvaluationIssue::DriverProfileMissing);
            }
            Err(err) => report.issues.push(EvaluationIssue::CycleUpdateFailed {
                message: err.to_string(),
            }),
        }
    }

    /// Emits one issue event.
    fn audit_issue(&self, driver_id: &DriverId, as_of: Timestamp, issue: &EvaluationIssue) {
        self.audit.record(&AuditEvent::EvaluationIssue {
            driver_id: driver_id.clone(),
            calculation_time: as_of,
            issue: issue.clone(),
        });
    }

    /// Resolves a violation record and emits an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Supplier`] when the record is missing or the
    /// write fails.
    pub fn resolve_violation(
        &self,
        violation_id: ViolationId,
        resolved_at: Timestamp,
    ) -> Result<HosViolation, EngineError> {
        let violation = self.violations.resolve_violation(violation_id, resolved_at)?;
        self.audit.record(&AuditEvent::ViolationResolved {
            violation_id,
            resolved_at: violation.resolved_at.unwrap_or(resolved_at),
        });
        Ok(violation)
    }
}

impl<S, P, V> ComplianceEngine<S, P, V>
where
    S: DutyLogStore,
    P: DriverProfileStore,
    V: ViolationRecorder,
{
    /// Applies a duty status change through the duty log and emits an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Supplier`] when the duty log rejects the change.
    pub fn record_status_change(
        &self,
        driver_id: &DriverId,
        change: &StatusChange,
    ) -> Result<DutyInterval, EngineError> {
        let opened = self.supplier.record_status_change(driver_id, change)?;
        self.audit.record(&AuditEvent::StatusChanged {
            driver_id: driver_id.clone(),
            status: opened.status,
            at: opened.start,
        });
        Ok(opened)
    }

    /// Splits open intervals at a day boundary and emits an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Supplier`] when the duty log write fails.
    pub fn rollover_open_intervals(
        &self,
        at: Timestamp,
    ) -> Result<Vec<RolloverRecord>, EngineError> {
        let records = self.supplier.rollover_open_intervals(at)?;
        self.audit.record(&AuditEvent::DayRollover {
            at,
            count: records.len(),
        });
        Ok(records)
    }
}
