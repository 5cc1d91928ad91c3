// crates/hos-core/src/runtime/rules.rs
// ============================================================================
// Module: HOS Rule Evaluators
// Description: Stateless evaluators for the four federal HOS rules.
// Purpose: Turn a duty interval slice and an instant into one rule result.
// Dependencies: crate::core, crate::runtime::intervals
// ============================================================================

//! ## Overview
//! Each evaluator is a pure function of the supplied intervals and the
//! evaluation instant. Windows are sized independently per rule: 14 hours,
//! 24 hours, 8 hours, and 8 days. The 14-hour and break evaluators return
//! `None` when they do not engage; the 11-hour and 70-hour evaluators always
//! return a result, even at zero accumulated time.
//!
//! Limit comparisons are made on whole milliseconds, so an accumulation of
//! exactly 11.0 or 70.0 hours is compliant with zero remaining.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Allowance;
use crate::core::ComplianceCheckResult;
use crate::core::DutyInterval;
use crate::core::DutyStatus;
use crate::core::HosRule;
use crate::core::MILLIS_PER_DAY;
use crate::core::MILLIS_PER_HOUR;
use crate::core::MILLIS_PER_MINUTE;
use crate::core::Timestamp;
use crate::core::millis_to_hours;
use crate::runtime::intervals::accumulate;
use crate::runtime::intervals::active_within;
use crate::runtime::intervals::effective_duration_ms;
use crate::runtime::intervals::filter_since;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Trailing window for the 14-hour rule.
pub const FOURTEEN_HOUR_WINDOW_MS: i64 = 14 * MILLIS_PER_HOUR;
/// On-duty limit inside the 14-hour window.
pub const FOURTEEN_HOUR_LIMIT_MS: i64 = 14 * MILLIS_PER_HOUR;
/// Trailing window for the 11-hour driving limit.
pub const DRIVING_WINDOW_MS: i64 = 24 * MILLIS_PER_HOUR;
/// Driving limit inside the 24-hour window.
pub const DRIVING_LIMIT_MS: i64 = 11 * MILLIS_PER_HOUR;
/// Trailing window for the break rule.
pub const BREAK_WINDOW_MS: i64 = 8 * MILLIS_PER_HOUR;
/// Driving time that engages the break rule.
pub const BREAK_DRIVING_THRESHOLD_MS: i64 = 8 * MILLIS_PER_HOUR;
/// Minimum length of one qualifying break.
pub const BREAK_MIN_MS: i64 = 30 * MILLIS_PER_MINUTE;
/// Break minutes owed when no qualifying break exists.
pub const BREAK_REQUIRED_MINUTES: u32 = 30;
/// Trailing window for the cycle rule.
pub const CYCLE_WINDOW_MS: i64 = 8 * MILLIS_PER_DAY;
/// On-duty limit inside the cycle window.
pub const CYCLE_LIMIT_MS: i64 = 70 * MILLIS_PER_HOUR;

// ============================================================================
// SECTION: 14-Hour Window
// ============================================================================

/// Evaluates the 14-hour window rule.
///
/// Returns `None` when no interval of any status starts inside the window.
#[must_use]
pub fn check_14_hour(
    intervals: &[DutyInterval],
    as_of: Timestamp,
) -> Option<ComplianceCheckResult> {
    let lower_bound = as_of.saturating_sub_millis(FOURTEEN_HOUR_WINDOW_MS);
    let window = filter_since(intervals, lower_bound, as_of);
    if window.is_empty() {
        return None;
    }
    let used = accumulate(window, as_of, DutyStatus::is_on_duty);
    let hours = used.hours();
    let rule = HosRule::FourteenHourWindow;
    if used.total_ms >= FOURTEEN_HOUR_LIMIT_MS {
        Some(ComplianceCheckResult::violation(
            rule,
            as_of,
            format!("14-hour window violation: {hours:.2} hours worked"),
            hours,
            Allowance::RemainingTime(0.0),
        ))
    } else {
        Some(ComplianceCheckResult::compliance(
            rule,
            as_of,
            format!("14-hour compliance: {hours:.2}/14 hours used"),
            hours,
            Allowance::RemainingTime(millis_to_hours(FOURTEEN_HOUR_LIMIT_MS - used.total_ms)),
        ))
    }
}

// ============================================================================
// SECTION: 11-Hour Driving Limit
// ============================================================================

/// Evaluates the 11-hour driving limit over the trailing 24 hours.
#[must_use]
pub fn check_11_hour(intervals: &[DutyInterval], as_of: Timestamp) -> ComplianceCheckResult {
    let window = filter_since(intervals, as_of.saturating_sub_millis(DRIVING_WINDOW_MS), as_of);
    let used = accumulate(window, as_of, DutyStatus::is_driving);
    let hours = used.hours();
    let rule = HosRule::ElevenHourDriving;
    if used.total_ms > DRIVING_LIMIT_MS {
        ComplianceCheckResult::violation(
            rule,
            as_of,
            format!("11-hour driving limit exceeded: {hours:.2} hours driven"),
            hours,
            Allowance::RemainingDriving(0.0),
        )
    } else {
        ComplianceCheckResult::compliance(
            rule,
            as_of,
            format!("11-hour compliance: {hours:.2}/11 hours used"),
            hours,
            Allowance::RemainingDriving(millis_to_hours(DRIVING_LIMIT_MS - used.total_ms)),
        )
    }
}

// ============================================================================
// SECTION: 30-Minute Break
// ============================================================================

/// Evaluates the 30-minute break requirement over the trailing 8 hours.
///
/// The window holds every interval active inside it, so a driving stint that
/// began before the window still counts toward the 8-hour threshold. Returns
/// `None` until that threshold is reached. Partial breaks never sum: one rest
/// interval must last at least 30 minutes on its own.
#[must_use]
pub fn check_30_min_break(
    intervals: &[DutyInterval],
    as_of: Timestamp,
) -> Option<ComplianceCheckResult> {
    let window = active_within(intervals, as_of.saturating_sub_millis(BREAK_WINDOW_MS), as_of);
    let driving = accumulate(window.iter().copied(), as_of, DutyStatus::is_driving);
    if driving.total_ms < BREAK_DRIVING_THRESHOLD_MS {
        return None;
    }
    let has_break = window.iter().any(|interval| {
        interval.status.is_rest()
            && effective_duration_ms(interval, as_of).is_ok_and(|millis| millis >= BREAK_MIN_MS)
    });
    let hours = driving.hours();
    let rule = HosRule::ThirtyMinuteBreak;
    if has_break {
        Some(ComplianceCheckResult::compliance(
            rule,
            as_of,
            "30-minute break requirement satisfied",
            hours,
            Allowance::BreakRequired(0),
        ))
    } else {
        Some(ComplianceCheckResult::violation(
            rule,
            as_of,
            "30-minute break required after 8 hours of driving",
            hours,
            Allowance::BreakRequired(BREAK_REQUIRED_MINUTES),
        ))
    }
}

// ============================================================================
// SECTION: 70-Hour / 8-Day Cycle
// ============================================================================

/// Evaluates the 70-hour limit over the trailing 8 days.
///
/// Pure: the cycle-used write-back is issued separately by the engine.
#[must_use]
pub fn check_70_hour_8day(intervals: &[DutyInterval], as_of: Timestamp) -> ComplianceCheckResult {
    let window = filter_since(intervals, as_of.saturating_sub_millis(CYCLE_WINDOW_MS), as_of);
    let used = accumulate(window, as_of, DutyStatus::is_on_duty);
    let hours = used.hours();
    let rule = HosRule::SeventyHourEightDay;
    if used.total_ms > CYCLE_LIMIT_MS {
        ComplianceCheckResult::violation(
            rule,
            as_of,
            format!("70-hour/8-day limit exceeded: {hours:.2} hours worked"),
            hours,
            Allowance::RemainingHours(0.0),
        )
    } else {
        ComplianceCheckResult::compliance(
            rule,
            as_of,
            format!("70-hour compliance: {hours:.2}/70 hours used"),
            hours,
            Allowance::RemainingHours(millis_to_hours(CYCLE_LIMIT_MS - used.total_ms)),
        )
    }
}
