//! Configuration loading and validation tests for hos-config.
// crates/hos-config/tests/config_validation.rs
// =============================================================================
// Module: HOS Config Validation Tests
// Description: Load limits, store and audit section constraints, builders.
// Purpose: Ensure configuration is fail-closed and builds working backends.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use hos_config::AuditConfig;
use hos_config::AuditSinkKind;
use hos_config::ConfigError;
use hos_config::HosConfig;
use hos_config::MAX_CONFIG_FILE_SIZE;
use hos_config::StoreConfig;
use hos_config::StoreType;
use hos_core::AuditEvent;
use hos_core::DriverId;
use hos_core::DriverProfile;
use hos_core::DriverProfileStore;
use hos_core::IntervalPolicy;
use hos_core::Timestamp;
use tempfile::TempDir;

type TestResult = Result<(), String>;

/// Assert that a result is an error containing a specific substring.
fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn write_config(dir: &TempDir, content: &[u8]) -> PathBuf {
    let path = dir.path().join("hos-engine.toml");
    fs::write(&path, content).expect("write config");
    path
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write_config(&dir, b"");
    let config = HosConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config != HosConfig::default() {
        return Err(format!("unexpected config: {config:?}"));
    }
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(HosConfig::load(Some(&path)), "config io error")
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let mut content = b"# padding\n".to_vec();
    content.resize(MAX_CONFIG_FILE_SIZE + 1, b'#');
    let path = write_config(&dir, &content);
    assert_invalid(HosConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write_config(&dir, &[0xff, 0xfe, 0x00]);
    assert_invalid(HosConfig::load(Some(&path)), "must be utf-8")
}

#[test]
fn unknown_fields_fail_to_parse() -> TestResult {
    assert_invalid(HosConfig::from_toml_str("[store]\nkind = \"memory\"\n"), "config parse error")
}

#[test]
fn engine_section_is_parsed() -> TestResult {
    let config = HosConfig::from_toml_str(
        "[engine]\ninterval_policy = \"reject\"\nrecord_violations = false\n",
    )
    .map_err(|err| err.to_string())?;
    if config.engine.interval_policy != IntervalPolicy::Reject || config.engine.record_violations {
        return Err(format!("unexpected engine config: {:?}", config.engine));
    }
    Ok(())
}

// ============================================================================
// SECTION: Store Section
// ============================================================================

#[test]
fn memory_store_rejects_path() -> TestResult {
    assert_invalid(
        HosConfig::from_toml_str("[store]\ntype = \"memory\"\npath = \"hos.db\"\n"),
        "memory store must not set path",
    )
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    assert_invalid(
        HosConfig::from_toml_str("[store]\ntype = \"sqlite\"\n"),
        "sqlite store requires path",
    )
}

#[test]
fn sqlite_store_rejects_blank_path() -> TestResult {
    assert_invalid(
        HosConfig::from_toml_str("[store]\ntype = \"sqlite\"\npath = \"  \"\n"),
        "store.path must be non-empty",
    )
}

#[test]
fn busy_timeout_must_be_positive() -> TestResult {
    assert_invalid(
        HosConfig::from_toml_str(
            "[store]\ntype = \"sqlite\"\npath = \"hos.db\"\nbusy_timeout_ms = 0\n",
        ),
        "busy_timeout_ms",
    )
}

#[test]
fn sqlite_store_builds_and_persists_profiles() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let store_config = StoreConfig {
        store_type: StoreType::Sqlite,
        path: Some(dir.path().join("nested").join("hos.db")),
        ..StoreConfig::default()
    };
    let driver = DriverId::new("driver-7");
    let store = store_config.build().map_err(|err| err.to_string())?;
    store.register_profile(&DriverProfile::new(driver.clone())).map_err(|err| err.to_string())?;
    drop(store);

    let reopened = store_config.build().map_err(|err| err.to_string())?;
    let profile = reopened.load_profile(&driver).map_err(|err| err.to_string())?;
    if profile.is_none() {
        return Err("profile did not survive reopen".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Audit Section
// ============================================================================

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        HosConfig::from_toml_str("[audit]\nsink = \"file\"\n"),
        "file audit sink requires path",
    )
}

#[test]
fn stderr_sink_rejects_path() -> TestResult {
    assert_invalid(
        HosConfig::from_toml_str("[audit]\nsink = \"stderr\"\npath = \"audit.log\"\n"),
        "only valid for the file sink",
    )
}

#[test]
fn file_sink_appends_json_lines() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let log_path = dir.path().join("audit.log");
    let audit = AuditConfig {
        sink: AuditSinkKind::File,
        path: Some(log_path.clone()),
    };
    let sink = audit.build_sink().map_err(|err| err.to_string())?;
    sink.record(&AuditEvent::EvaluationCompleted {
        driver_id: DriverId::new("driver-7"),
        calculation_time: Timestamp::from_unix_millis(1_700_000_000_000),
        is_compliant: true,
        violation_count: 0,
        issue_count: 0,
    });
    let content = fs::read_to_string(&log_path).map_err(|err| err.to_string())?;
    if !content.contains("\"event\":\"evaluation_completed\"") {
        return Err(format!("unexpected audit log: {content}"));
    }
    Ok(())
}

#[test]
fn full_config_file_round_trips_through_load() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let db_path = dir.path().join("hos.db");
    let log_path = dir.path().join("audit.log");
    let content = format!(
        "[engine]\ninterval_policy = \"flag\"\n\n[store]\ntype = \"sqlite\"\npath = \
         {db:?}\njournal_mode = \"delete\"\nsync_mode = \"normal\"\n\n[audit]\nsink = \
         \"file\"\npath = {log:?}\n",
        db = db_path.to_string_lossy(),
        log = log_path.to_string_lossy(),
    );
    let path = write_config(&dir, content.as_bytes());
    let config = HosConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.store.store_type != StoreType::Sqlite || config.audit.sink != AuditSinkKind::File {
        return Err(format!("unexpected config: {config:?}"));
    }
    config.store.build().map_err(|err| err.to_string())?;
    config.audit.build_sink().map_err(|err| err.to_string())?;
    if !db_path.exists() || !log_path.exists() {
        return Err("backends were not created".to_string());
    }
    Ok(())
}
