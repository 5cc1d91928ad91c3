// crates/hos-core/src/interfaces/mod.rs
// ============================================================================
// Module: HOS Interfaces
// Description: Backend-agnostic interfaces for duty logs, profiles, and violations.
// Purpose: Define the contract surfaces consumed and produced by the engine.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the HOS engine integrates with storage without
//! embedding backend-specific details. The engine consumes
//! [`IntervalSupplier`] and produces writes through [`DriverProfileStore`] and
//! [`ViolationRecorder`]. [`DutyLogStore`] adds the status-change transition,
//! which implementations must run under a per-driver mutual exclusion scope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

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

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Store errors shared by all collaborator interfaces.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("hos store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("hos store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("hos store version mismatch: {0}")]
    VersionMismatch(String),
    /// Request or stored data is invalid.
    #[error("hos store invalid data: {0}")]
    Invalid(String),
    /// Requested record does not exist.
    #[error("hos store record not found: {0}")]
    NotFound(String),
    /// Store reported an error.
    #[error("hos store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Duty Intervals
// ============================================================================

/// Supplies duty intervals to the engine.
pub trait IntervalSupplier {
    /// Returns the driver's intervals with `start >= since`, ordered by start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when intervals cannot be read.
    fn fetch_intervals(
        &self,
        driver_id: &DriverId,
        since: Timestamp,
    ) -> Result<Vec<DutyInterval>, StoreError>;
}

/// Duty log persistence including the status-change transition.
pub trait DutyLogStore: IntervalSupplier {
    /// Closes the driver's open interval at `change.at` and opens a new one.
    ///
    /// Implementations serialize this read-modify-write per driver so that two
    /// concurrent changes never both close the same open interval.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the change precedes the driver's
    /// latest interval start, or another [`StoreError`] when persistence fails.
    fn record_status_change(
        &self,
        driver_id: &DriverId,
        change: &StatusChange,
    ) -> Result<DutyInterval, StoreError>;

    /// Appends a historical interval verbatim, without transition semantics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails.
    fn append_interval(&self, driver_id: &DriverId, interval: &DutyInterval)
    -> Result<(), StoreError>;

    /// Splits every open interval that started before `at` at that boundary.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails.
    fn rollover_open_intervals(&self, at: Timestamp) -> Result<Vec<RolloverRecord>, StoreError>;
}

// ============================================================================
// SECTION: Driver Profiles
// ============================================================================

/// Driver profile persistence.
pub trait DriverProfileStore {
    /// Inserts or replaces a driver profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails.
    fn register_profile(&self, profile: &DriverProfile) -> Result<(), StoreError>;

    /// Loads a driver profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_profile(&self, driver_id: &DriverId) -> Result<Option<DriverProfile>, StoreError>;

    /// Writes the cycle-used figure; skipped when no profile exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails.
    fn persist_cycle_used(
        &self,
        driver_id: &DriverId,
        hours: f64,
        at: Timestamp,
    ) -> Result<CycleUpdate, StoreError>;
}

// ============================================================================
// SECTION: Violation Recorder
// ============================================================================

/// Durable violation storage.
pub trait ViolationRecorder {
    /// Records violation-kind results, skipping ones already recorded.
    ///
    /// Returns only the newly created records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails.
    fn record_violations(
        &self,
        driver_id: &DriverId,
        results: &[ComplianceCheckResult],
        recorded_at: Timestamp,
    ) -> Result<Vec<HosViolation>, StoreError>;

    /// Lists a driver's violations, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn list_violations(
        &self,
        driver_id: &DriverId,
        unresolved_only: bool,
    ) -> Result<Vec<HosViolation>, StoreError>;

    /// Marks a violation resolved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the violation does not exist.
    fn resolve_violation(
        &self,
        violation_id: ViolationId,
        resolved_at: Timestamp,
    ) -> Result<HosViolation, StoreError>;
}

// ============================================================================
// SECTION: Combined Store
// ============================================================================

/// Store implementing every collaborator interface.
pub trait HosStore: DutyLogStore + DriverProfileStore + ViolationRecorder {}

impl<T> HosStore for T where T: DutyLogStore + DriverProfileStore + ViolationRecorder {}
