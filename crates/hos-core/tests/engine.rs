// crates/hos-core/tests/engine.rs
// ============================================================================
// Module: HOS Compliance Engine Tests
// Description: Aggregation, collaborator writes, and interval policy coverage.
// Purpose: Validate report merging and the engine's side-effect boundaries.
// ============================================================================

//! Compliance engine integration tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use hos_core::AuditEvent;
use hos_core::ComplianceAuditSink;
use hos_core::ComplianceEngine;
use hos_core::DriverId;
use hos_core::DriverProfile;
use hos_core::DriverProfileStore;
use hos_core::DutyInterval;
use hos_core::DutyLogStore;
use hos_core::DutyStatus;
use hos_core::EngineConfig;
use hos_core::EngineError;
use hos_core::EvaluationIssue;
use hos_core::HosRule;
use hos_core::InMemoryHosStore;
use hos_core::IntervalPolicy;
use hos_core::IntervalSupplier;
use hos_core::MILLIS_PER_DAY;
use hos_core::MILLIS_PER_HOUR;
use hos_core::MILLIS_PER_MINUTE;
use hos_core::RuleOutcome;
use hos_core::StatusChange;
use hos_core::Timestamp;
use hos_core::ViolationRecorder;
use hos_core::aggregate_report;

const BASE_MS: i64 = 1_700_000_000_000;

fn ts(offset_ms: i64) -> Timestamp {
    Timestamp::from_unix_millis(BASE_MS + offset_ms)
}

fn driver() -> DriverId {
    DriverId::new("driver-7")
}

/// Audit sink collecting events in memory.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    fn labels(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(AuditEvent::label).collect()
    }
}

impl ComplianceAuditSink for RecordingSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

type MemoryEngine = ComplianceEngine<InMemoryHosStore, InMemoryHosStore, InMemoryHosStore>;

fn engine(store: &InMemoryHosStore, config: EngineConfig) -> (MemoryEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let engine = ComplianceEngine::new(store.clone(), store.clone(), store.clone(), config)
        .with_audit(sink.clone());
    (engine, sink)
}

/// Twelve hours of driving around a 25-minute gap; violates 11-hour and break.
fn long_day(store: &InMemoryHosStore) -> Timestamp {
    let driver = driver();
    let first_end = 6 * MILLIS_PER_HOUR;
    let gap_end = first_end + 25 * MILLIS_PER_MINUTE;
    let second_end = gap_end + 6 * MILLIS_PER_HOUR;
    for interval in [
        DutyInterval::closed(DutyStatus::Driving, ts(0), ts(first_end)),
        DutyInterval::closed(DutyStatus::OffDuty, ts(first_end), ts(gap_end)),
        DutyInterval::closed(DutyStatus::Driving, ts(gap_end), ts(second_end)),
    ] {
        store.append_interval(&driver, &interval).unwrap();
    }
    ts(second_end)
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

#[test]
fn aggregate_report_orders_violations_and_keeps_remaining_times() {
    let store = InMemoryHosStore::new();
    let as_of = long_day(&store);
    let intervals = all_intervals(&store, as_of);
    let report = aggregate_report(&driver(), &intervals, as_of);

    assert!(!report.is_compliant);
    let rules: Vec<HosRule> = report.violations.iter().map(|result| result.rule).collect();
    assert_eq!(rules, vec![HosRule::ElevenHourDriving, HosRule::ThirtyMinuteBreak]);
    assert_eq!(report.rule_outcome(HosRule::FourteenHourWindow), RuleOutcome::Compliant);
    assert_eq!(report.rule_outcome(HosRule::SeventyHourEightDay), RuleOutcome::Compliant);
    assert!(report.is_compliant_for(HosRule::SeventyHourEightDay));
    assert!(!report.is_compliant_for(HosRule::ElevenHourDriving));
    assert_eq!(report.remaining_times.cycle, Some(58.0));
    assert_eq!(report.remaining_times.fourteen_hour_window, Some(2.0));
    assert_eq!(report.remaining_times.driving, None);
    assert!(report.issues.is_empty());
}

#[test]
fn rules_without_a_result_are_not_evaluated_rather_than_compliant() {
    let report = aggregate_report(&driver(), &[], ts(0));
    assert!(report.is_compliant);
    assert_eq!(report.rule_outcome(HosRule::FourteenHourWindow), RuleOutcome::NotEvaluated);
    assert_eq!(report.rule_outcome(HosRule::ThirtyMinuteBreak), RuleOutcome::NotEvaluated);
    assert!(!report.is_compliant_for(HosRule::FourteenHourWindow));
    assert_eq!(report.compliance_status.len(), 2);
    assert_eq!(report.remaining_times.driving, Some(11.0));
    assert_eq!(report.remaining_times.fourteen_hour_window, None);
}

#[test]
fn aggregate_report_is_deterministic() {
    let store = InMemoryHosStore::new();
    let as_of = long_day(&store);
    let intervals = all_intervals(&store, as_of);
    let first = aggregate_report(&driver(), &intervals, as_of);
    let second = aggregate_report(&driver(), &intervals, as_of);
    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
}

#[test]
fn report_serializes_remaining_times_with_wire_labels() {
    let intervals = vec![DutyInterval::closed(
        DutyStatus::Driving,
        ts(0),
        ts(2 * MILLIS_PER_HOUR),
    )];
    let report = aggregate_report(&driver(), &intervals, ts(2 * MILLIS_PER_HOUR));
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["remaining_times"]["14_hour_window"], 12.0);
    assert_eq!(value["remaining_times"]["driving"], 9.0);
    assert_eq!(value["remaining_times"]["cycle"], 68.0);
    assert_eq!(value["compliance_status"]["11_hour"]["remaining_driving"], 9.0);
}

// ============================================================================
// SECTION: Engine Writes
// ============================================================================

#[test]
fn missing_profile_is_reported_without_failing_evaluation() {
    let store = InMemoryHosStore::new();
    let as_of = long_day(&store);
    let (engine, sink) = engine(&store, EngineConfig::default());

    let report = engine.evaluate(&driver(), as_of).unwrap();
    assert_eq!(report.issues, vec![EvaluationIssue::DriverProfileMissing]);
    assert!(sink.labels().contains(&"evaluation_issue"));
    assert_eq!(sink.labels().last(), Some(&"evaluation_completed"));
}

#[test]
fn compliant_cycle_is_written_back_to_the_profile() {
    let store = InMemoryHosStore::new();
    store.register_profile(&DriverProfile::new(driver())).unwrap();
    let as_of = long_day(&store);
    let (engine, sink) = engine(&store, EngineConfig::default());

    let report = engine.evaluate(&driver(), as_of).unwrap();
    assert!(report.issues.is_empty());
    let profile = store.load_profile(&driver()).unwrap().unwrap();
    assert_eq!(profile.current_cycle_used, 12.0);
    assert_eq!(profile.cycle_updated_at, Some(as_of));
    assert!(sink.labels().contains(&"cycle_used_persisted"));
}

#[test]
fn cycle_violation_leaves_profile_untouched() {
    let store = InMemoryHosStore::new();
    store.register_profile(&DriverProfile::new(driver())).unwrap();
    for day in 0 .. 8 {
        let start = day * MILLIS_PER_DAY;
        let interval =
            DutyInterval::closed(DutyStatus::OnDuty, ts(start), ts(start + 9 * MILLIS_PER_HOUR));
        store.append_interval(&driver(), &interval).unwrap();
    }
    let (engine, _sink) = engine(&store, EngineConfig::default());

    let report = engine.evaluate(&driver(), ts(7 * MILLIS_PER_DAY + 9 * MILLIS_PER_HOUR)).unwrap();
    assert_eq!(report.rule_outcome(HosRule::SeventyHourEightDay), RuleOutcome::Violated);
    let profile = store.load_profile(&driver()).unwrap().unwrap();
    assert_eq!(profile.current_cycle_used, 0.0);
    assert_eq!(profile.cycle_updated_at, None);
}

#[test]
fn violations_are_recorded_once_per_rule_and_instant() {
    let store = InMemoryHosStore::new();
    let as_of = long_day(&store);
    let (engine, _sink) = engine(&store, EngineConfig::default());

    engine.evaluate(&driver(), as_of).unwrap();
    engine.evaluate(&driver(), as_of).unwrap();
    let recorded = store.list_violations(&driver(), true).unwrap();
    assert_eq!(recorded.len(), 2);
    assert!(recorded.iter().all(|violation| violation.violation_time == as_of));

    let resolved = engine.resolve_violation(recorded[0].violation_id, as_of).unwrap();
    assert!(resolved.is_resolved);
    assert_eq!(store.list_violations(&driver(), true).unwrap().len(), 1);
    assert_eq!(store.list_violations(&driver(), false).unwrap().len(), 2);
}

#[test]
fn violation_recording_can_be_disabled() {
    let store = InMemoryHosStore::new();
    let as_of = long_day(&store);
    let config = EngineConfig {
        record_violations: false,
        ..EngineConfig::default()
    };
    let (engine, _sink) = engine(&store, config);

    let report = engine.evaluate(&driver(), as_of).unwrap();
    assert!(!report.is_compliant);
    assert!(store.list_violations(&driver(), false).unwrap().is_empty());
}

// ============================================================================
// SECTION: Interval Policy
// ============================================================================

fn overlapping(store: &InMemoryHosStore) {
    let driver = driver();
    store
        .append_interval(
            &driver,
            &DutyInterval::closed(DutyStatus::Driving, ts(0), ts(3 * MILLIS_PER_HOUR)),
        )
        .unwrap();
    store
        .append_interval(
            &driver,
            &DutyInterval::closed(
                DutyStatus::OnDuty,
                ts(2 * MILLIS_PER_HOUR),
                ts(4 * MILLIS_PER_HOUR),
            ),
        )
        .unwrap();
}

#[test]
fn flag_policy_reports_overlaps_and_still_evaluates() {
    let store = InMemoryHosStore::new();
    store.register_profile(&DriverProfile::new(driver())).unwrap();
    overlapping(&store);
    let (engine, _sink) = engine(&store, EngineConfig::default());

    let report = engine.evaluate(&driver(), ts(4 * MILLIS_PER_HOUR)).unwrap();
    assert_eq!(
        report.issues,
        vec![EvaluationIssue::OverlappingIntervals {
            earlier_start: ts(0),
            later_start: ts(2 * MILLIS_PER_HOUR),
        }]
    );
    assert_eq!(report.rule_outcome(HosRule::ElevenHourDriving), RuleOutcome::Compliant);
}

#[test]
fn reject_policy_fails_on_structural_issues() {
    let store = InMemoryHosStore::new();
    overlapping(&store);
    let config = EngineConfig {
        interval_policy: IntervalPolicy::Reject,
        ..EngineConfig::default()
    };
    let (engine, sink) = engine(&store, config);

    let err = engine.evaluate(&driver(), ts(4 * MILLIS_PER_HOUR)).unwrap_err();
    match err {
        EngineError::InvalidIntervals(issues) => assert_eq!(issues.len(), 1),
        EngineError::Supplier(err) => panic!("unexpected store error: {err}"),
    }
    assert_eq!(sink.labels(), vec!["evaluation_issue"]);
}

#[test]
fn inverted_records_are_isolated_under_reject_policy() {
    let store = InMemoryHosStore::new();
    store
        .append_interval(
            &driver(),
            &DutyInterval::closed(DutyStatus::Driving, ts(2 * MILLIS_PER_HOUR), ts(MILLIS_PER_HOUR)),
        )
        .unwrap();
    let config = EngineConfig {
        interval_policy: IntervalPolicy::Reject,
        ..EngineConfig::default()
    };
    let (engine, _sink) = engine(&store, config);

    let report = engine.evaluate(&driver(), ts(3 * MILLIS_PER_HOUR)).unwrap();
    assert!(report.issues.iter().any(|issue| issue.label() == "inverted_interval"));
    assert_eq!(report.remaining_times.driving, Some(11.0));
}

// ============================================================================
// SECTION: Duty Log Operations
// ============================================================================

#[test]
fn status_changes_through_the_engine_are_audited_and_evaluated() {
    let store = InMemoryHosStore::new();
    let (engine, sink) = engine(&store, EngineConfig::default());
    engine.record_status_change(&driver(), &StatusChange::new(DutyStatus::OnDuty, ts(0))).unwrap();
    engine
        .record_status_change(&driver(), &StatusChange::new(DutyStatus::Driving, ts(MILLIS_PER_HOUR)))
        .unwrap();

    let report = engine.evaluate(&driver(), ts(4 * MILLIS_PER_HOUR)).unwrap();
    assert_eq!(report.remaining_times.driving, Some(8.0));
    assert_eq!(report.remaining_times.fourteen_hour_window, Some(10.0));
    let labels = sink.labels();
    assert_eq!(&labels[.. 2], &["status_changed", "status_changed"]);

    let records = engine.rollover_open_intervals(ts(5 * MILLIS_PER_HOUR)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(sink.labels().last(), Some(&"day_rollover"));
}

fn all_intervals(store: &InMemoryHosStore, as_of: Timestamp) -> Vec<DutyInterval> {
    store.fetch_intervals(&driver(), as_of.saturating_sub_millis(8 * MILLIS_PER_DAY)).unwrap()
}
