// crates/hos-core/src/core/duty.rs
// ============================================================================
// Module: HOS Duty Intervals
// Description: Duty statuses, duty intervals, and status change requests.
// Purpose: Model the contiguous periods a driver spends in one duty state.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A [`DutyInterval`] is one contiguous period a driver spent in a single
//! [`DutyStatus`]. An interval with no `end` is the driver's current, open
//! interval and counts as running until the evaluation instant. Intervals are
//! immutable once closed; the only mutation is closing an open interval when
//! the driver changes status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::DriverId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Duty Status
// ============================================================================

/// Duty status recorded for a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    /// Off duty.
    OffDuty,
    /// Resting in the sleeper berth.
    SleeperBerth,
    /// Driving the vehicle.
    Driving,
    /// On duty, not driving.
    OnDuty,
}

impl DutyStatus {
    /// All duty statuses in canonical order.
    pub const ALL: [Self; 4] = [Self::OffDuty, Self::SleeperBerth, Self::Driving, Self::OnDuty];

    /// Returns the stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffDuty => "off_duty",
            Self::SleeperBerth => "sleeper_berth",
            Self::Driving => "driving",
            Self::OnDuty => "on_duty",
        }
    }

    /// Returns true for statuses that count toward on-duty limits.
    #[must_use]
    pub const fn is_on_duty(self) -> bool {
        matches!(self, Self::Driving | Self::OnDuty)
    }

    /// Returns true only for driving.
    #[must_use]
    pub const fn is_driving(self) -> bool {
        matches!(self, Self::Driving)
    }

    /// Returns true for statuses that can satisfy a rest break.
    #[must_use]
    pub const fn is_rest(self) -> bool {
        matches!(self, Self::OffDuty | Self::SleeperBerth)
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a duty status label is not recognized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown duty status: {0}")]
pub struct DutyStatusParseError(pub String);

impl FromStr for DutyStatus {
    type Err = DutyStatusParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| DutyStatusParseError(value.to_string()))
    }
}

// ============================================================================
// SECTION: Duty Interval
// ============================================================================

/// One contiguous period a driver spent in one duty state.
///
/// # Invariants
/// - `end = None` marks the open, current interval.
/// - `start <= end` when both are present; violations are reported as data
///   quality issues, never silently clamped.
/// - `location` and `notes` are free text and never read by rule logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyInterval {
    /// Duty status held during the interval.
    pub status: DutyStatus,
    /// Interval start.
    pub start: Timestamp,
    /// Interval end, absent while the interval is ongoing.
    #[serde(default)]
    pub end: Option<Timestamp>,
    /// Free-text location.
    #[serde(default)]
    pub location: String,
    /// Optional free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl DutyInterval {
    /// Creates an interval without location or notes.
    #[must_use]
    pub const fn new(status: DutyStatus, start: Timestamp, end: Option<Timestamp>) -> Self {
        Self {
            status,
            start,
            end,
            location: String::new(),
            notes: None,
        }
    }

    /// Creates a closed interval.
    #[must_use]
    pub const fn closed(status: DutyStatus, start: Timestamp, end: Timestamp) -> Self {
        Self::new(status, start, Some(end))
    }

    /// Creates an open interval.
    #[must_use]
    pub const fn open(status: DutyStatus, start: Timestamp) -> Self {
        Self::new(status, start, None)
    }

    /// Returns the interval with the provided location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Returns true when the interval has no end.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Returns `end` when present, otherwise the evaluation instant.
    #[must_use]
    pub fn effective_end(&self, as_of: Timestamp) -> Timestamp {
        self.end.unwrap_or(as_of)
    }
}

// ============================================================================
// SECTION: Status Changes
// ============================================================================

/// Request to move a driver into a new duty status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// New duty status.
    pub status: DutyStatus,
    /// Instant the change takes effect.
    pub at: Timestamp,
    /// Free-text location of the change.
    #[serde(default)]
    pub location: String,
    /// Optional free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl StatusChange {
    /// Creates a status change without location or notes.
    #[must_use]
    pub const fn new(status: DutyStatus, at: Timestamp) -> Self {
        Self {
            status,
            at,
            location: String::new(),
            notes: None,
        }
    }

    /// Builds the open interval this change starts.
    #[must_use]
    pub fn to_open_interval(&self) -> DutyInterval {
        DutyInterval {
            status: self.status,
            start: self.at,
            end: None,
            location: self.location.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Result of splitting one open interval at a day boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverRecord {
    /// Driver whose interval was split.
    pub driver_id: DriverId,
    /// Interval closed at the boundary.
    pub closed: DutyInterval,
    /// Continuation interval opened at the boundary.
    pub opened: DutyInterval,
}
