// crates/hos-core/src/runtime/intervals.rs
// ============================================================================
// Module: HOS Interval Arithmetic
// Description: Window filtering and duration accumulation over duty intervals.
// Purpose: Shared utilities for every rule evaluator.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Durations are computed in whole milliseconds. An open interval runs until
//! the evaluation instant, so an in-progress driving period counts toward
//! limits in real time. A closed interval that runs past the evaluation
//! instant is clamped to it, so evaluating at a past instant never sees later
//! history. An interval whose end precedes its start, or that starts after the
//! evaluation instant, never contributes: it is isolated as an
//! [`IntervalError`] and accumulation continues with the remaining intervals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::DutyInterval;
use crate::core::DutyStatus;
use crate::core::Timestamp;
use crate::core::millis_to_hours;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Data integrity errors raised by duration arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// Closed interval whose end precedes its start.
    #[error("interval ends before it starts: {start} > {end}")]
    Inverted {
        /// Interval start.
        start: Timestamp,
        /// Interval end.
        end: Timestamp,
    },
    /// Interval that starts after the evaluation instant.
    #[error("interval starts after evaluation instant: {start} > {as_of}")]
    StartsAfterEvaluation {
        /// Interval start.
        start: Timestamp,
        /// Evaluation instant.
        as_of: Timestamp,
    },
}

// ============================================================================
// SECTION: Filtering
// ============================================================================

/// Returns intervals with `lower_bound <= start <= as_of`.
#[must_use]
pub fn filter_since(
    intervals: &[DutyInterval],
    lower_bound: Timestamp,
    as_of: Timestamp,
) -> Vec<&DutyInterval> {
    intervals
        .iter()
        .filter(|interval| interval.start >= lower_bound && interval.start <= as_of)
        .collect()
}

/// Returns intervals active at any point in `[lower_bound, as_of]`.
///
/// Includes every interval [`filter_since`] returns plus intervals that began
/// earlier but whose effective end falls inside the window. Intervals that
/// start after `as_of` are never active.
#[must_use]
pub fn active_within(
    intervals: &[DutyInterval],
    lower_bound: Timestamp,
    as_of: Timestamp,
) -> Vec<&DutyInterval> {
    intervals
        .iter()
        .filter(|interval| {
            interval.start <= as_of
                && (interval.start >= lower_bound || interval.effective_end(as_of) > lower_bound)
        })
        .collect()
}

// ============================================================================
// SECTION: Durations
// ============================================================================

/// Returns the interval's effective duration in milliseconds, up to `as_of`.
///
/// # Errors
///
/// Returns [`IntervalError`] when the end precedes the start or the interval
/// starts after `as_of`.
pub fn effective_duration_ms(
    interval: &DutyInterval,
    as_of: Timestamp,
) -> Result<i64, IntervalError> {
    if let Some(end) = interval.end
        && end < interval.start
    {
        return Err(IntervalError::Inverted {
            start: interval.start,
            end,
        });
    }
    if as_of < interval.start {
        return Err(IntervalError::StartsAfterEvaluation {
            start: interval.start,
            as_of,
        });
    }
    let end = interval.end.map_or(as_of, |end| end.min(as_of));
    Ok(end.millis_since(interval.start))
}

/// Accumulated duration for a status subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulation {
    /// Total milliseconds across accepted intervals.
    pub total_ms: i64,
    /// Intervals rejected from the total.
    pub rejected: Vec<IntervalError>,
}

impl Accumulation {
    /// Returns the total in fractional hours.
    #[must_use]
    pub fn hours(&self) -> f64 {
        millis_to_hours(self.total_ms)
    }
}

/// Sums effective durations of intervals whose status matches `include`.
pub fn accumulate<'a, I, F>(intervals: I, as_of: Timestamp, include: F) -> Accumulation
where
    I: IntoIterator<Item = &'a DutyInterval>,
    F: Fn(DutyStatus) -> bool,
{
    let mut accumulation = Accumulation::default();
    for interval in intervals {
        if !include(interval.status) {
            continue;
        }
        match effective_duration_ms(interval, as_of) {
            Ok(millis) => {
                accumulation.total_ms = accumulation.total_ms.saturating_add(millis);
            }
            Err(err) => accumulation.rejected.push(err),
        }
    }
    accumulation
}

// ============================================================================
// SECTION: Tests
// ============================================================================
