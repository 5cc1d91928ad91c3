// crates/hos-core/src/core/time.rs
// ============================================================================
// Module: HOS Time Model
// Description: Canonical timestamp representation for duty intervals.
// Purpose: Provide deterministic, replayable instants with exact arithmetic.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every instant the engine sees is an explicit [`Timestamp`] supplied by the
//! caller. The core never reads wall-clock time; hosts decide whether the
//! evaluation instant is "now" or a retrospective point. Arithmetic is done in
//! whole milliseconds so that limit comparisons (11.0 hours, 70.0 hours) are
//! exact; fractional hours are only produced for reporting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use ::time::OffsetDateTime;
use ::time::format_description::well_known::Rfc3339;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one second.
pub const MILLIS_PER_SECOND: i64 = 1_000;
/// Milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Nanoseconds in one millisecond.
const NANOS_PER_MILLI: i128 = 1_000_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp conversion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Input is not a valid RFC 3339 instant.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// Instant falls outside the representable range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Instant expressed as unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the instant `millis` earlier, saturating at the representable minimum.
    #[must_use]
    pub const fn saturating_sub_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_sub(millis))
    }

    /// Returns the instant `millis` later, saturating at the representable maximum.
    #[must_use]
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns the signed number of milliseconds from `earlier` to `self`.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Parses an RFC 3339 instant such as `2026-03-02T08:00:00Z`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the input is malformed or out of range.
    pub fn parse_rfc3339(value: &str) -> Result<Self, TimestampError> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimestampError::Parse(err.to_string()))?;
        let millis = parsed.unix_timestamp_nanos() / NANOS_PER_MILLI;
        i64::try_from(millis)
            .map(Self)
            .map_err(|_| TimestampError::OutOfRange(value.to_string()))
    }

    /// Formats the instant as an RFC 3339 string in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the instant cannot be represented.
    pub fn to_rfc3339(self) -> Result<String, TimestampError> {
        let nanos = i128::from(self.0) * NANOS_PER_MILLI;
        let instant = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|err| TimestampError::OutOfRange(err.to_string()))?;
        instant.format(&Rfc3339).map_err(|err| TimestampError::OutOfRange(err.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}

/// Converts a millisecond span into fractional hours for reporting.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Spans are far below 2^52 milliseconds.")]
pub fn millis_to_hours(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_HOUR as f64
}
