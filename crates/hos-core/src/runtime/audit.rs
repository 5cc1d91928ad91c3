// crates/hos-core/src/runtime/audit.rs
// ============================================================================
// Module: HOS Compliance Audit Logging
// Description: Structured audit events for evaluations and duty log writes.
// Purpose: Emit JSON-line audit records without a hard logging dependency.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events describe what the engine and duty log did: evaluations, data
//! quality issues, cycle-used write-backs, status changes, and violation
//! resolutions. Sinks serialize each event as one JSON line stamped with the
//! wall-clock time of emission, so deployments can route the stream to their
//! preferred logging pipeline. The evaluation instant inside each event is the
//! caller-supplied `as_of`, never the wall clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::DriverId;
use crate::core::DutyStatus;
use crate::core::EvaluationIssue;
use crate::core::Timestamp;
use crate::core::ViolationId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Compliance audit event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// One evaluation finished.
    EvaluationCompleted {
        /// Evaluated driver.
        driver_id: DriverId,
        /// Evaluation instant.
        calculation_time: Timestamp,
        /// Overall compliance.
        is_compliant: bool,
        /// Number of violation results.
        violation_count: usize,
        /// Number of issues attached to the report.
        issue_count: usize,
    },
    /// A data quality or collaborator issue surfaced during evaluation.
    EvaluationIssue {
        /// Evaluated driver.
        driver_id: DriverId,
        /// Evaluation instant.
        calculation_time: Timestamp,
        /// Issue detail.
        issue: EvaluationIssue,
    },
    /// The cycle-used figure was written to the driver profile.
    CycleUsedPersisted {
        /// Evaluated driver.
        driver_id: DriverId,
        /// Evaluation instant.
        calculation_time: Timestamp,
        /// Persisted cycle-used hours.
        cycle_used_hours: f64,
    },
    /// New violation records were written.
    ViolationsRecorded {
        /// Evaluated driver.
        driver_id: DriverId,
        /// Evaluation instant.
        calculation_time: Timestamp,
        /// Number of newly created records.
        count: usize,
    },
    /// A driver changed duty status.
    StatusChanged {
        /// Driver identity.
        driver_id: DriverId,
        /// New duty status.
        status: DutyStatus,
        /// Instant the change took effect.
        at: Timestamp,
    },
    /// A violation record was resolved.
    ViolationResolved {
        /// Resolved record.
        violation_id: ViolationId,
        /// Resolution instant.
        resolved_at: Timestamp,
    },
    /// Open intervals were split at a day boundary.
    DayRollover {
        /// Boundary instant.
        at: Timestamp,
        /// Number of intervals split.
        count: usize,
    },
}

impl AuditEvent {
    /// Returns the event label written to the `event` field.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EvaluationCompleted { .. } => "evaluation_completed",
            Self::EvaluationIssue { .. } => "evaluation_issue",
            Self::CycleUsedPersisted { .. } => "cycle_used_persisted",
            Self::ViolationsRecorded { .. } => "violations_recorded",
            Self::StatusChanged { .. } => "status_changed",
            Self::ViolationResolved { .. } => "violation_resolved",
            Self::DayRollover { .. } => "day_rollover",
        }
    }
}

/// Audit line written by the built-in sinks.
#[derive(Debug, Serialize)]
struct AuditLine<'a> {
    /// Emission timestamp (milliseconds since epoch).
    timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// Serializes an event into one JSON line payload.
fn render(event: &AuditEvent) -> Option<String> {
    let timestamp_ms =
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    serde_json::to_string(&AuditLine {
        timestamp_ms,
        event,
    })
    .ok()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for compliance events.
pub trait ComplianceAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AuditEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ComplianceAuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Some(payload) = render(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ComplianceAuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Some(payload) = render(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl ComplianceAuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
