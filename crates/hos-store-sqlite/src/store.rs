// crates/hos-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite HOS Store
// Description: Durable duty log, profile store, and violation recorder.
// Purpose: Persist HOS records with transactional status transitions.
// Dependencies: hos-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements the HOS collaborator interfaces on one `SQLite`
//! connection. Duty intervals, driver profiles, and violation records live in
//! separate tables under a versioned schema. The status-change transition and
//! the day rollover run inside `IMMEDIATE` transactions, which take the write
//! lock up front and serialize concurrent writers. Violation records are unique
//! per `(driver_id, rule, violation_time)`, so re-evaluating the same instant
//! never duplicates them. Stored labels are parsed strictly; unknown values are
//! reported as corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use hos_core::Allowance;
use hos_core::ComplianceCheckResult;
use hos_core::CycleUpdate;
use hos_core::DriverId;
use hos_core::DriverProfile;
use hos_core::DriverProfileStore;
use hos_core::DutyInterval;
use hos_core::DutyLogStore;
use hos_core::DutyStatus;
use hos_core::HosRule;
use hos_core::HosViolation;
use hos_core::IntervalSupplier;
use hos_core::RolloverRecord;
use hos_core::StatusChange;
use hos_core::StoreError;
use hos_core::Timestamp;
use hos_core::ViolationId;
use hos_core::ViolationRecorder;
use hos_core::runtime::store::ROLLOVER_NOTES;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Column list shared by violation queries.
const VIOLATION_COLUMNS: &str = "violation_id, driver_id, rule, violation_time, description, \
                                 used_hours, allowance_kind, allowance_value, is_resolved, \
                                 resolved_at, created_at";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` HOS store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default timeouts and modes.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data fails to parse.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid request or store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Requested record does not exist.
    #[error("sqlite store record not found: {0}")]
    NotFound(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
        }
    }
}

/// Maps an engine error into [`SqliteStoreError::Db`].
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err adapter.")]
fn db_err(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed HOS store with WAL support.
#[derive(Clone)]
pub struct SqliteHosStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteHosStore {
    /// Opens an `SQLite`-backed HOS store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Loads intervals for a driver starting at or after `since`.
    fn load_intervals(
        &self,
        driver_id: &DriverId,
        since: Timestamp,
    ) -> Result<Vec<DutyInterval>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT status, start_ms, end_ms, location, notes FROM duty_intervals WHERE \
                 driver_id = ?1 AND start_ms >= ?2 ORDER BY start_ms, id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![driver_id.as_str(), since.as_unix_millis()], |row| {
                Ok(IntervalRow {
                    status: row.get(0)?,
                    start_ms: row.get(1)?,
                    end_ms: row.get(2)?,
                    location: row.get(3)?,
                    notes: row.get(4)?,
                })
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        drop(stmt);
        drop(guard);
        rows.into_iter().map(IntervalRow::into_interval).collect()
    }

    /// Closes the open interval and inserts the new one in one transaction.
    fn apply_status_change(
        &self,
        driver_id: &DriverId,
        change: &StatusChange,
    ) -> Result<DutyInterval, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx =
            guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
        let latest: Option<i64> = tx
            .query_row(
                "SELECT MAX(start_ms) FROM duty_intervals WHERE driver_id = ?1",
                params![driver_id.as_str()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if let Some(latest) = latest
            && change.at.as_unix_millis() < latest
        {
            return Err(SqliteStoreError::Invalid(format!(
                "status change at {} precedes latest interval start {}",
                change.at,
                Timestamp::from_unix_millis(latest)
            )));
        }
        tx.execute(
            "UPDATE duty_intervals SET end_ms = ?2 WHERE driver_id = ?1 AND end_ms IS NULL",
            params![driver_id.as_str(), change.at.as_unix_millis()],
        )
        .map_err(db_err)?;
        let opened = change.to_open_interval();
        insert_interval(&tx, driver_id.as_str(), &opened)?;
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(opened)
    }

    /// Appends one interval verbatim.
    fn insert_one(
        &self,
        driver_id: &DriverId,
        interval: &DutyInterval,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_err)?;
        insert_interval(&tx, driver_id.as_str(), interval)?;
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(())
    }

    /// Splits open intervals at `at` in one transaction.
    fn apply_rollover(&self, at: Timestamp) -> Result<Vec<RolloverRecord>, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx =
            guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
        let open_rows = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, driver_id, status, start_ms, location, notes FROM duty_intervals \
                     WHERE end_ms IS NULL AND start_ms < ?1 ORDER BY driver_id, start_ms, id",
                )
                .map_err(db_err)?;
            stmt.query_map(params![at.as_unix_millis()], |row| {
                let id: i64 = row.get(0)?;
                let driver: String = row.get(1)?;
                let interval = IntervalRow {
                    status: row.get(2)?,
                    start_ms: row.get(3)?,
                    end_ms: None,
                    location: row.get(4)?,
                    notes: row.get(5)?,
                };
                Ok((id, driver, interval))
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?
        };

        let mut records = Vec::with_capacity(open_rows.len());
        for (id, driver, row) in open_rows {
            let mut closed = row.into_interval()?;
            tx.execute(
                "UPDATE duty_intervals SET end_ms = ?2 WHERE id = ?1",
                params![id, at.as_unix_millis()],
            )
            .map_err(db_err)?;
            closed.end = Some(at);
            let opened = DutyInterval {
                status: closed.status,
                start: at,
                end: None,
                location: closed.location.clone(),
                notes: Some(ROLLOVER_NOTES.to_string()),
            };
            insert_interval(&tx, &driver, &opened)?;
            records.push(RolloverRecord {
                driver_id: DriverId::new(driver),
                closed,
                opened,
            });
        }
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(records)
    }

    /// Inserts or replaces a profile.
    fn upsert_profile(&self, profile: &DriverProfile) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO driver_profiles (driver_id, home_terminal, current_cycle_used, \
                 cycle_updated_at) VALUES (?1, ?2, ?3, ?4) ON CONFLICT(driver_id) DO UPDATE SET \
                 home_terminal = excluded.home_terminal, current_cycle_used = \
                 excluded.current_cycle_used, cycle_updated_at = excluded.cycle_updated_at",
                params![
                    profile.driver_id.as_str(),
                    profile.home_terminal,
                    profile.current_cycle_used,
                    profile.cycle_updated_at.map(Timestamp::as_unix_millis)
                ],
            )
            .map_err(db_err)?;
        drop(guard);
        Ok(())
    }

    /// Loads a profile.
    fn select_profile(
        &self,
        driver_id: &DriverId,
    ) -> Result<Option<DriverProfile>, SqliteStoreError> {
        let guard = self.lock()?;
        let profile = guard
            .query_row(
                "SELECT home_terminal, current_cycle_used, cycle_updated_at FROM driver_profiles \
                 WHERE driver_id = ?1",
                params![driver_id.as_str()],
                |row| {
                    let home_terminal: Option<String> = row.get(0)?;
                    let current_cycle_used: f64 = row.get(1)?;
                    let cycle_updated_at: Option<i64> = row.get(2)?;
                    Ok(DriverProfile {
                        driver_id: driver_id.clone(),
                        home_terminal,
                        current_cycle_used,
                        cycle_updated_at: cycle_updated_at.map(Timestamp::from_unix_millis),
                    })
                },
            )
            .optional()
            .map_err(db_err)?;
        drop(guard);
        Ok(profile)
    }

    /// Updates the cycle-used figure on an existing profile.
    fn update_cycle_used(
        &self,
        driver_id: &DriverId,
        hours: f64,
        at: Timestamp,
    ) -> Result<CycleUpdate, SqliteStoreError> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(SqliteStoreError::Invalid(format!("invalid cycle-used hours: {hours}")));
        }
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE driver_profiles SET current_cycle_used = ?2, cycle_updated_at = ?3 WHERE \
                 driver_id = ?1",
                params![driver_id.as_str(), hours, at.as_unix_millis()],
            )
            .map_err(db_err)?;
        drop(guard);
        Ok(if changed == 0 { CycleUpdate::ProfileMissing } else { CycleUpdate::Updated })
    }

    /// Inserts violation records, ignoring ones already present.
    fn insert_violations(
        &self,
        driver_id: &DriverId,
        results: &[ComplianceCheckResult],
        recorded_at: Timestamp,
    ) -> Result<Vec<HosViolation>, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_err)?;
        let mut created = Vec::new();
        for result in results.iter().filter(|result| result.is_violation()) {
            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO hos_violations (driver_id, rule, violation_time, \
                     description, used_hours, allowance_kind, allowance_value, is_resolved, \
                     resolved_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, NULL, ?8)",
                    params![
                        driver_id.as_str(),
                        result.rule.as_str(),
                        result.at.as_unix_millis(),
                        result.description,
                        result.used_hours,
                        result.allowance.label(),
                        result.allowance.value(),
                        recorded_at.as_unix_millis()
                    ],
                )
                .map_err(db_err)?;
            if inserted == 0 {
                continue;
            }
            let id = violation_id_from_row(tx.last_insert_rowid())?;
            created.push(HosViolation::from_result(id, driver_id.clone(), result, recorded_at));
        }
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(created)
    }

    /// Lists violation records, newest first.
    fn select_violations(
        &self,
        driver_id: &DriverId,
        unresolved_only: bool,
    ) -> Result<Vec<HosViolation>, SqliteStoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {VIOLATION_COLUMNS} FROM hos_violations WHERE driver_id = ?1 AND (?2 = 0 OR \
             is_resolved = 0) ORDER BY violation_time DESC, violation_id DESC"
        );
        let mut stmt = guard.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![driver_id.as_str(), unresolved_only], read_violation_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        drop(stmt);
        drop(guard);
        rows.into_iter().map(ViolationRow::into_violation).collect()
    }

    /// Marks a violation resolved, keeping the first resolution time.
    fn mark_resolved(
        &self,
        violation_id: ViolationId,
        resolved_at: Timestamp,
    ) -> Result<HosViolation, SqliteStoreError> {
        let raw_id = i64::try_from(violation_id.get())
            .map_err(|_| SqliteStoreError::NotFound(format!("violation {violation_id}")))?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_err)?;
        tx.execute(
            "UPDATE hos_violations SET is_resolved = 1, resolved_at = ?2 WHERE violation_id = ?1 \
             AND is_resolved = 0",
            params![raw_id, resolved_at.as_unix_millis()],
        )
        .map_err(db_err)?;
        let sql = format!("SELECT {VIOLATION_COLUMNS} FROM hos_violations WHERE violation_id = ?1");
        let row = tx.query_row(&sql, params![raw_id], read_violation_row).optional().map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        drop(guard);
        let Some(row) = row else {
            return Err(SqliteStoreError::NotFound(format!("violation {violation_id}")));
        };
        row.into_violation()
    }
}

impl IntervalSupplier for SqliteHosStore {
    fn fetch_intervals(
        &self,
        driver_id: &DriverId,
        since: Timestamp,
    ) -> Result<Vec<DutyInterval>, StoreError> {
        self.load_intervals(driver_id, since).map_err(StoreError::from)
    }
}

impl DutyLogStore for SqliteHosStore {
    fn record_status_change(
        &self,
        driver_id: &DriverId,
        change: &StatusChange,
    ) -> Result<DutyInterval, StoreError> {
        self.apply_status_change(driver_id, change).map_err(StoreError::from)
    }

    fn append_interval(
        &self,
        driver_id: &DriverId,
        interval: &DutyInterval,
    ) -> Result<(), StoreError> {
        self.insert_one(driver_id, interval).map_err(StoreError::from)
    }

    fn rollover_open_intervals(&self, at: Timestamp) -> Result<Vec<RolloverRecord>, StoreError> {
        self.apply_rollover(at).map_err(StoreError::from)
    }
}

impl DriverProfileStore for SqliteHosStore {
    fn register_profile(&self, profile: &DriverProfile) -> Result<(), StoreError> {
        self.upsert_profile(profile).map_err(StoreError::from)
    }

    fn load_profile(&self, driver_id: &DriverId) -> Result<Option<DriverProfile>, StoreError> {
        self.select_profile(driver_id).map_err(StoreError::from)
    }

    fn persist_cycle_used(
        &self,
        driver_id: &DriverId,
        hours: f64,
        at: Timestamp,
    ) -> Result<CycleUpdate, StoreError> {
        self.update_cycle_used(driver_id, hours, at).map_err(StoreError::from)
    }
}

impl ViolationRecorder for SqliteHosStore {
    fn record_violations(
        &self,
        driver_id: &DriverId,
        results: &[ComplianceCheckResult],
        recorded_at: Timestamp,
    ) -> Result<Vec<HosViolation>, StoreError> {
        self.insert_violations(driver_id, results, recorded_at).map_err(StoreError::from)
    }

    fn list_violations(
        &self,
        driver_id: &DriverId,
        unresolved_only: bool,
    ) -> Result<Vec<HosViolation>, StoreError> {
        self.select_violations(driver_id, unresolved_only).map_err(StoreError::from)
    }

    fn resolve_violation(
        &self,
        violation_id: ViolationId,
        resolved_at: Timestamp,
    ) -> Result<HosViolation, StoreError> {
        self.mark_resolved(violation_id, resolved_at).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw duty interval row.
struct IntervalRow {
    /// Stored status label.
    status: String,
    /// Start (ms since epoch).
    start_ms: i64,
    /// End (ms since epoch), null while open.
    end_ms: Option<i64>,
    /// Free-text location.
    location: String,
    /// Optional notes.
    notes: Option<String>,
}

impl IntervalRow {
    /// Parses the row into a duty interval.
    fn into_interval(self) -> Result<DutyInterval, SqliteStoreError> {
        let status: DutyStatus = self
            .status
            .parse()
            .map_err(|err| SqliteStoreError::Corrupt(format!("duty_intervals: {err}")))?;
        Ok(DutyInterval {
            status,
            start: Timestamp::from_unix_millis(self.start_ms),
            end: self.end_ms.map(Timestamp::from_unix_millis),
            location: self.location,
            notes: self.notes,
        })
    }
}

/// Raw violation row.
struct ViolationRow {
    /// Row identifier.
    violation_id: i64,
    /// Driver identifier.
    driver_id: String,
    /// Stored rule label.
    rule: String,
    /// Violation instant (ms since epoch).
    violation_time: i64,
    /// Description.
    description: String,
    /// Accumulated hours.
    used_hours: f64,
    /// Allowance label.
    allowance_kind: String,
    /// Allowance value.
    allowance_value: f64,
    /// Resolution flag.
    is_resolved: bool,
    /// Resolution instant (ms since epoch).
    resolved_at: Option<i64>,
    /// Creation instant (ms since epoch).
    created_at: i64,
}

impl ViolationRow {
    /// Parses the row into a violation record.
    fn into_violation(self) -> Result<HosViolation, SqliteStoreError> {
        let rule: HosRule = self
            .rule
            .parse()
            .map_err(|err| SqliteStoreError::Corrupt(format!("hos_violations: {err}")))?;
        let allowance =
            Allowance::from_parts(&self.allowance_kind, self.allowance_value).ok_or_else(|| {
                SqliteStoreError::Corrupt(format!(
                    "hos_violations: unknown allowance kind {}",
                    self.allowance_kind
                ))
            })?;
        Ok(HosViolation {
            violation_id: violation_id_from_row(self.violation_id)?,
            driver_id: DriverId::new(self.driver_id),
            rule,
            violation_time: Timestamp::from_unix_millis(self.violation_time),
            description: self.description,
            used_hours: self.used_hours,
            allowance,
            is_resolved: self.is_resolved,
            resolved_at: self.resolved_at.map(Timestamp::from_unix_millis),
            created_at: Timestamp::from_unix_millis(self.created_at),
        })
    }
}

/// Reads a violation row selected with [`VIOLATION_COLUMNS`].
fn read_violation_row(row: &Row<'_>) -> rusqlite::Result<ViolationRow> {
    Ok(ViolationRow {
        violation_id: row.get(0)?,
        driver_id: row.get(1)?,
        rule: row.get(2)?,
        violation_time: row.get(3)?,
        description: row.get(4)?,
        used_hours: row.get(5)?,
        allowance_kind: row.get(6)?,
        allowance_value: row.get(7)?,
        is_resolved: row.get(8)?,
        resolved_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Converts a row identifier into a violation identifier.
fn violation_id_from_row(raw: i64) -> Result<ViolationId, SqliteStoreError> {
    u64::try_from(raw)
        .map(ViolationId::new)
        .map_err(|_| SqliteStoreError::Corrupt(format!("negative violation id: {raw}")))
}

/// Inserts one interval row.
fn insert_interval(
    tx: &rusqlite::Transaction<'_>,
    driver_id: &str,
    interval: &DutyInterval,
) -> Result<(), SqliteStoreError> {
    tx.execute(
        "INSERT INTO duty_intervals (driver_id, status, start_ms, end_ms, location, notes) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            driver_id,
            interval.status.as_str(),
            interval.start.as_unix_millis(),
            interval.end.map(Timestamp::as_unix_millis),
            interval.location,
            interval.notes
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_err)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_err)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_err)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_err)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_err)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_err)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS duty_intervals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    driver_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    start_ms INTEGER NOT NULL,
                    end_ms INTEGER,
                    location TEXT NOT NULL DEFAULT '',
                    notes TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_duty_intervals_driver_start
                    ON duty_intervals (driver_id, start_ms);
                CREATE TABLE IF NOT EXISTS driver_profiles (
                    driver_id TEXT PRIMARY KEY,
                    home_terminal TEXT,
                    current_cycle_used REAL NOT NULL DEFAULT 0,
                    cycle_updated_at INTEGER
                );
                CREATE TABLE IF NOT EXISTS hos_violations (
                    violation_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    driver_id TEXT NOT NULL,
                    rule TEXT NOT NULL,
                    violation_time INTEGER NOT NULL,
                    description TEXT NOT NULL,
                    used_hours REAL NOT NULL,
                    allowance_kind TEXT NOT NULL,
                    allowance_value REAL NOT NULL,
                    is_resolved INTEGER NOT NULL DEFAULT 0,
                    resolved_at INTEGER,
                    created_at INTEGER NOT NULL,
                    UNIQUE (driver_id, rule, violation_time)
                );
                CREATE INDEX IF NOT EXISTS idx_hos_violations_driver_time
                    ON hos_violations (driver_id, violation_time);",
            )
            .map_err(db_err)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_err)?;
    Ok(())
}
