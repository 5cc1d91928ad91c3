// crates/hos-core/src/runtime/store.rs
// ============================================================================
// Module: HOS In-Memory Store
// Description: In-memory duty log, profile store, and violation recorder.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryHosStore`] implements every collaborator interface behind one
//! mutex, which also serves as the per-driver exclusion scope for status
//! changes. It is intended for tests and local runs; durable deployments use
//! the SQLite store. [`SharedHosStore`] wraps any store in a clonable handle so
//! one backend can fill all three engine collaborator slots.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::ComplianceCheckResult;
use crate::core::CycleUpdate;
use crate::core::DriverId;
use crate::core::DriverProfile;
use crate::core::DutyInterval;
use crate::core::HosViolation;
use crate::core::RolloverRecord;
use crate::core::StatusChange;
use crate::core::Timestamp;
use crate::core::ViolationId;
use crate::interfaces::DriverProfileStore;
use crate::interfaces::DutyLogStore;
use crate::interfaces::HosStore;
use crate::interfaces::IntervalSupplier;
use crate::interfaces::StoreError;
use crate::interfaces::ViolationRecorder;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Notes attached to continuation intervals opened by a day rollover.
pub const ROLLOVER_NOTES: &str = "day rollover continuation";

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable store state guarded by one mutex.
#[derive(Debug, Default)]
struct MemoryState {
    /// Duty intervals per driver, ordered by start.
    intervals: BTreeMap<String, Vec<DutyInterval>>,
    /// Driver profiles.
    profiles: BTreeMap<String, DriverProfile>,
    /// Violation records in creation order.
    violations: Vec<HosViolation>,
    /// Last assigned violation identifier.
    last_violation_id: u64,
}

/// In-memory HOS store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHosStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryHosStore {
    /// Creates a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("hos store mutex poisoned".to_string()))
    }
}

impl IntervalSupplier for InMemoryHosStore {
    fn fetch_intervals(
        &self,
        driver_id: &DriverId,
        since: Timestamp,
    ) -> Result<Vec<DutyInterval>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .intervals
            .get(driver_id.as_str())
            .map(|intervals| {
                intervals.iter().filter(|interval| interval.start >= since).cloned().collect()
            })
            .unwrap_or_default())
    }
}

impl DutyLogStore for InMemoryHosStore {
    fn record_status_change(
        &self,
        driver_id: &DriverId,
        change: &StatusChange,
    ) -> Result<DutyInterval, StoreError> {
        let mut guard = self.lock()?;
        let intervals = guard.intervals.entry(driver_id.as_str().to_string()).or_default();
        if let Some(latest) = intervals.iter().map(|interval| interval.start).max()
            && change.at < latest
        {
            return Err(StoreError::Invalid(format!(
                "status change at {} precedes latest interval start {latest}",
                change.at
            )));
        }
        for interval in intervals.iter_mut().filter(|interval| interval.is_open()) {
            interval.end = Some(change.at);
        }
        let opened = change.to_open_interval();
        intervals.push(opened.clone());
        intervals.sort_by_key(|interval| interval.start);
        drop(guard);
        Ok(opened)
    }

    fn append_interval(
        &self,
        driver_id: &DriverId,
        interval: &DutyInterval,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let intervals = guard.intervals.entry(driver_id.as_str().to_string()).or_default();
        intervals.push(interval.clone());
        intervals.sort_by_key(|interval| interval.start);
        drop(guard);
        Ok(())
    }

    fn rollover_open_intervals(&self, at: Timestamp) -> Result<Vec<RolloverRecord>, StoreError> {
        let mut guard = self.lock()?;
        let mut records = Vec::new();
        for (driver, intervals) in &mut guard.intervals {
            let mut continuations = Vec::new();
            for interval in intervals.iter_mut() {
                if !interval.is_open() || interval.start >= at {
                    continue;
                }
                interval.end = Some(at);
                let opened = DutyInterval {
                    status: interval.status,
                    start: at,
                    end: None,
                    location: interval.location.clone(),
                    notes: Some(ROLLOVER_NOTES.to_string()),
                };
                records.push(RolloverRecord {
                    driver_id: DriverId::new(driver.clone()),
                    closed: interval.clone(),
                    opened: opened.clone(),
                });
                continuations.push(opened);
            }
            intervals.extend(continuations);
            intervals.sort_by_key(|interval| interval.start);
        }
        drop(guard);
        Ok(records)
    }
}

impl DriverProfileStore for InMemoryHosStore {
    fn register_profile(&self, profile: &DriverProfile) -> Result<(), StoreError> {
        self.lock()?.profiles.insert(profile.driver_id.as_str().to_string(), profile.clone());
        Ok(())
    }

    fn load_profile(&self, driver_id: &DriverId) -> Result<Option<DriverProfile>, StoreError> {
        Ok(self.lock()?.profiles.get(driver_id.as_str()).cloned())
    }

    fn persist_cycle_used(
        &self,
        driver_id: &DriverId,
        hours: f64,
        at: Timestamp,
    ) -> Result<CycleUpdate, StoreError> {
        let mut guard = self.lock()?;
        let Some(profile) = guard.profiles.get_mut(driver_id.as_str()) else {
            return Ok(CycleUpdate::ProfileMissing);
        };
        profile.current_cycle_used = hours;
        profile.cycle_updated_at = Some(at);
        drop(guard);
        Ok(CycleUpdate::Updated)
    }
}

impl ViolationRecorder for InMemoryHosStore {
    fn record_violations(
        &self,
        driver_id: &DriverId,
        results: &[ComplianceCheckResult],
        recorded_at: Timestamp,
    ) -> Result<Vec<HosViolation>, StoreError> {
        let mut guard = self.lock()?;
        let mut created = Vec::new();
        for result in results.iter().filter(|result| result.is_violation()) {
            let exists = guard.violations.iter().any(|violation| {
                violation.driver_id == *driver_id
                    && violation.rule == result.rule
                    && violation.violation_time == result.at
            });
            if exists {
                continue;
            }
            guard.last_violation_id += 1;
            let violation = HosViolation::from_result(
                ViolationId::new(guard.last_violation_id),
                driver_id.clone(),
                result,
                recorded_at,
            );
            guard.violations.push(violation.clone());
            created.push(violation);
        }
        drop(guard);
        Ok(created)
    }

    fn list_violations(
        &self,
        driver_id: &DriverId,
        unresolved_only: bool,
    ) -> Result<Vec<HosViolation>, StoreError> {
        let mut violations: Vec<HosViolation> = {
            let guard = self.lock()?;
            guard
                .violations
                .iter()
                .filter(|violation| violation.driver_id == *driver_id)
                .filter(|violation| !unresolved_only || !violation.is_resolved)
                .cloned()
                .collect()
        };
        violations.sort_by(|a, b| {
            b.violation_time.cmp(&a.violation_time).then(b.violation_id.cmp(&a.violation_id))
        });
        Ok(violations)
    }

    fn resolve_violation(
        &self,
        violation_id: ViolationId,
        resolved_at: Timestamp,
    ) -> Result<HosViolation, StoreError> {
        let mut guard = self.lock()?;
        let violation = guard
            .violations
            .iter_mut()
            .find(|violation| violation.violation_id == violation_id)
            .ok_or_else(|| StoreError::NotFound(format!("violation {violation_id}")))?;
        violation.resolve(resolved_at);
        Ok(violation.clone())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared HOS store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedHosStore {
    /// Inner store implementation.
    inner: Arc<dyn HosStore + Send + Sync>,
}

impl SharedHosStore {
    /// Wraps a store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl HosStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn HosStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl IntervalSupplier for SharedHosStore {
    fn fetch_intervals(
        &self,
        driver_id: &DriverId,
        since: Timestamp,
    ) -> Result<Vec<DutyInterval>, StoreError> {
        self.inner.fetch_intervals(driver_id, since)
    }
}

impl DutyLogStore for SharedHosStore {
    fn record_status_change(
        &self,
        driver_id: &DriverId,
        change: &StatusChange,
    ) -> Result<DutyInterval, StoreError> {
        self.inner.record_status_change(driver_id, change)
    }

    fn append_interval(
        &self,
        driver_id: &DriverId,
        interval: &DutyInterval,
    ) -> Result<(), StoreError> {
        self.inner.append_interval(driver_id, interval)
    }

    fn rollover_open_intervals(&self, at: Timestamp) -> Result<Vec<RolloverRecord>, StoreError> {
        self.inner.rollover_open_intervals(at)
    }
}

impl DriverProfileStore for SharedHosStore {
    fn register_profile(&self, profile: &DriverProfile) -> Result<(), StoreError> {
        self.inner.register_profile(profile)
    }

    fn load_profile(&self, driver_id: &DriverId) -> Result<Option<DriverProfile>, StoreError> {
        self.inner.load_profile(driver_id)
    }

    fn persist_cycle_used(
        &self,
        driver_id: &DriverId,
        hours: f64,
        at: Timestamp,
    ) -> Result<CycleUpdate, StoreError> {
        self.inner.persist_cycle_used(driver_id, hours, at)
    }
}

impl ViolationRecorder for SharedHosStore {
    fn record_violations(
        &self,
        driver_id: &DriverId,
        results: &[ComplianceCheckResult],
        recorded_at: Timestamp,
    ) -> Result<Vec<HosViolation>, StoreError> {
        self.inner.record_violations(driver_id, results, recorded_at)
    }

    fn list_violations(
        &self,
        driver_id: &DriverId,
        unresolved_only: bool,
    ) -> Result<Vec<HosViolation>, StoreError> {
        self.inner.list_violations(driver_id, unresolved_only)
    }

    fn resolve_violation(
        &self,
        violation_id: ViolationId,
        resolved_at: Timestamp,
    ) -> Result<HosViolation, StoreError> {
        self.inner.resolve_violation(violation_id, resolved_at)
    }
}
