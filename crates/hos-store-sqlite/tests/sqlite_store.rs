// crates/hos-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite HOS Store Tests
// Description: Persistence, transitions, rollover, and violation records.
// Purpose: Ensure the SQLite store honors the HOS collaborator contracts.
// Dependencies: hos-store-sqlite, hos-core
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed HOS store. Exercises reopen
//! durability, status-change serialization across threads, day rollover,
//! violation dedup, and fail-closed schema handling.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::thread;

use hos_core::Allowance;
use hos_core::ComplianceCheckResult;
use hos_core::ComplianceEngine;
use hos_core::CycleUpdate;
use hos_core::DriverId;
use hos_core::DriverProfile;
use hos_core::DriverProfileStore;
use hos_core::DutyInterval;
use hos_core::DutyLogStore;
use hos_core::DutyStatus;
use hos_core::EngineConfig;
use hos_core::HosRule;
use hos_core::IntervalSupplier;
use hos_core::MILLIS_PER_HOUR;
use hos_core::StatusChange;
use hos_core::StoreError;
use hos_core::Timestamp;
use hos_core::ViolationId;
use hos_core::ViolationRecorder;
use hos_store_sqlite::SqliteHosStore;
use hos_store_sqlite::SqliteStoreConfig;
use hos_store_sqlite::SqliteStoreError;
use hos_store_sqlite::SqliteStoreMode;
use hos_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

struct SqliteFixture {
    _dir: TempDir,
    path: PathBuf,
    store: SqliteHosStore,
}

fn config_for(path: &Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

fn sqlite_fixture() -> SqliteFixture {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("hos.db");
    let store = SqliteHosStore::new(&config_for(&path)).expect("open store");
    SqliteFixture {
        _dir: dir,
        path,
        store,
    }
}

fn at(hours: i64) -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000 + hours * MILLIS_PER_HOUR)
}

fn driver() -> DriverId {
    DriverId::new("driver-42")
}

// ============================================================================
// SECTION: Duty Log
// ============================================================================

#[test]
fn status_changes_persist_across_reopen() {
    let fixture = sqlite_fixture();
    let change = StatusChange {
        location: "Reno, NV".to_string(),
        notes: Some("pre-trip".to_string()),
        ..StatusChange::new(DutyStatus::OnDuty, at(0))
    };
    fixture.store.record_status_change(&driver(), &change).unwrap();
    fixture
        .store
        .record_status_change(&driver(), &StatusChange::new(DutyStatus::Driving, at(1)))
        .unwrap();
    drop(fixture.store);

    let reopened = SqliteHosStore::new(&config_for(&fixture.path)).unwrap();
    let intervals = reopened.fetch_intervals(&driver(), at(-1)).unwrap();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0].status, DutyStatus::OnDuty);
    assert_eq!(intervals[0].end, Some(at(1)));
    assert_eq!(intervals[0].location, "Reno, NV");
    assert_eq!(intervals[0].notes.as_deref(), Some("pre-trip"));
    assert!(intervals[1].is_open());
}

#[test]
fn fetch_filters_by_start_and_driver() {
    let fixture = sqlite_fixture();
    let other = DriverId::new("driver-43");
    for hour in [0, 5, 10] {
        let interval = DutyInterval::closed(DutyStatus::Driving, at(hour), at(hour + 1))
            .with_location(format!("mile {hour}"));
        fixture.store.append_interval(&driver(), &interval).unwrap();
        fixture.store.append_interval(&other, &interval).unwrap();
    }
    let intervals = fixture.store.fetch_intervals(&driver(), at(5)).unwrap();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0].start, at(5));
    assert_eq!(intervals[0].location, "mile 5");
}

#[test]
fn out_of_order_status_change_is_rejected() {
    let fixture = sqlite_fixture();
    fixture
        .store
        .record_status_change(&driver(), &StatusChange::new(DutyStatus::Driving, at(3)))
        .unwrap();
    let err = fixture
        .store
        .record_status_change(&driver(), &StatusChange::new(DutyStatus::OffDuty, at(2)))
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn concurrent_status_changes_leave_one_open_interval() {
    let fixture = sqlite_fixture();
    let handles: Vec<_> = (0 .. 8)
        .map(|hour| {
            let store = fixture.store.clone();
            thread::spawn(move || {
                let _ = store.record_status_change(
                    &driver(),
                    &StatusChange::new(DutyStatus::Driving, at(hour)),
                );
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let intervals = fixture.store.fetch_intervals(&driver(), at(-1)).unwrap();
    assert!(!intervals.is_empty());
    assert_eq!(intervals.iter().filter(|interval| interval.is_open()).count(), 1);
}

#[test]
fn rollover_closes_and_continues_open_intervals() {
    let fixture = sqlite_fixture();
    fixture
        .store
        .record_status_change(&driver(), &StatusChange::new(DutyStatus::SleeperBerth, at(20)))
        .unwrap();
    let records = fixture.store.rollover_open_intervals(at(24)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].opened.status, DutyStatus::SleeperBerth);

    let intervals = fixture.store.fetch_intervals(&driver(), at(0)).unwrap();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0].end, Some(at(24)));
    assert_eq!(intervals[1].start, at(24));
    assert!(intervals[1].is_open());
    assert!(fixture.store.rollover_open_intervals(at(24)).unwrap().is_empty());
}

// ============================================================================
// SECTION: Profiles
// ============================================================================

#[test]
fn cycle_used_updates_existing_profiles_only() {
    let fixture = sqlite_fixture();
    assert_eq!(
        fixture.store.persist_cycle_used(&driver(), 10.0, at(0)).unwrap(),
        CycleUpdate::ProfileMissing
    );
    fixture.store.register_profile(&DriverProfile::new(driver())).unwrap();
    assert_eq!(
        fixture.store.persist_cycle_used(&driver(), 10.0, at(1)).unwrap(),
        CycleUpdate::Updated
    );
    let profile = fixture.store.load_profile(&driver()).unwrap().unwrap();
    assert_eq!(profile.current_cycle_used, 10.0);
    assert_eq!(profile.cycle_updated_at, Some(at(1)));
}

// ============================================================================
// SECTION: Violations
// ============================================================================

#[test]
fn violations_are_deduplicated_listed_and_resolved() {
    let fixture = sqlite_fixture();
    let result = ComplianceCheckResult::violation(
        HosRule::ThirtyMinuteBreak,
        at(9),
        "30-minute break required after 8 hours of driving",
        8.5,
        Allowance::BreakRequired(30),
    );
    let created = fixture.store.record_violations(&driver(), &[result.clone()], at(9)).unwrap();
    assert_eq!(created.len(), 1);
    assert!(fixture.store.record_violations(&driver(), &[result], at(9)).unwrap().is_empty());

    let listed = fixture.store.list_violations(&driver(), true).unwrap();
    assert_eq!(listed, created);
    assert_eq!(listed[0].allowance, Allowance::BreakRequired(30));

    let resolved = fixture.store.resolve_violation(listed[0].violation_id, at(10)).unwrap();
    assert!(resolved.is_resolved);
    let again = fixture.store.resolve_violation(listed[0].violation_id, at(11)).unwrap();
    assert_eq!(again.resolved_at, Some(at(10)));
    assert!(fixture.store.list_violations(&driver(), true).unwrap().is_empty());

    let missing = fixture.store.resolve_violation(ViolationId::new(404), at(12)).unwrap_err();
    assert!(matches!(missing, StoreError::NotFound(_)));
}

#[test]
fn engine_runs_against_the_sqlite_store() {
    let fixture = sqlite_fixture();
    fixture.store.register_profile(&DriverProfile::new(driver())).unwrap();
    fixture
        .store
        .append_interval(
            &driver(),
            &DutyInterval::closed(DutyStatus::Driving, at(0), at(12)),
        )
        .unwrap();
    let engine = ComplianceEngine::new(
        fixture.store.clone(),
        fixture.store.clone(),
        fixture.store.clone(),
        EngineConfig::default(),
    );
    let report = engine.evaluate(&driver(), at(12)).unwrap();
    assert!(!report.is_compliant);
    let recorded = fixture.store.list_violations(&driver(), false).unwrap();
    assert_eq!(recorded.len(), report.violations.len());
    let profile = fixture.store.load_profile(&driver()).unwrap().unwrap();
    assert_eq!(profile.current_cycle_used, 12.0);
}

// ============================================================================
// SECTION: Schema
// ============================================================================

#[test]
fn unknown_schema_version_fails_closed() {
    let fixture = sqlite_fixture();
    drop(fixture.store);
    let connection = rusqlite::Connection::open(&fixture.path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    drop(connection);

    let Err(err) = SqliteHosStore::new(&config_for(&fixture.path)) else {
        panic!("expected version mismatch");
    };
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

#[test]
fn unknown_status_label_is_reported_as_corruption() {
    let fixture = sqlite_fixture();
    fixture
        .store
        .append_interval(&driver(), &DutyInterval::closed(DutyStatus::OnDuty, at(0), at(1)))
        .unwrap();
    let connection = rusqlite::Connection::open(&fixture.path).unwrap();
    connection.execute("UPDATE duty_intervals SET status = 'yard_move'", []).unwrap();
    drop(connection);

    let err = fixture.store.fetch_intervals(&driver(), at(-1)).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let Err(err) = SqliteHosStore::new(&SqliteStoreConfig::new(dir.path())) else {
        panic!("expected invalid path");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}
