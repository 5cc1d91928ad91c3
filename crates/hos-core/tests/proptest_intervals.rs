// crates/hos-core/tests/proptest_intervals.rs
// ============================================================================
// Module: Interval Accumulation Property-Based Tests
// Description: Property tests for duration accumulation and rule stability.
// Purpose: Detect negative totals, regressions over time, and panics.
// ============================================================================

//! Property-based tests for interval accumulation invariants.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use hos_core::DriverId;
use hos_core::DutyInterval;
use hos_core::DutyStatus;
use hos_core::MILLIS_PER_MINUTE;
use hos_core::Timestamp;
use hos_core::aggregate_report;
use hos_core::runtime::accumulate;
use proptest::prelude::*;

const BASE_MS: i64 = 1_700_000_000_000;

/// Builds a contiguous, well-formed sequence; the last interval may be open.
fn sequence(segments: &[(usize, i64)], last_open: bool) -> (Vec<DutyInterval>, Timestamp) {
    let mut cursor = BASE_MS;
    let mut intervals = Vec::with_capacity(segments.len());
    for (index, (status_index, minutes)) in segments.iter().enumerate() {
        let status = DutyStatus::ALL[status_index % DutyStatus::ALL.len()];
        let start = Timestamp::from_unix_millis(cursor);
        cursor += minutes * MILLIS_PER_MINUTE;
        if last_open && index + 1 == segments.len() {
            intervals.push(DutyInterval::open(status, start));
        } else {
            intervals.push(DutyInterval::closed(status, start, Timestamp::from_unix_millis(cursor)));
        }
    }
    (intervals, Timestamp::from_unix_millis(cursor))
}

fn segments_strategy() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0usize .. 4, 1i64 .. 600), 0 .. 24)
}

proptest! {
    #[test]
    fn accumulation_is_non_negative_and_monotonic(
        segments in segments_strategy(),
        last_open in any::<bool>(),
        first_extra in 0i64 .. 600,
        second_extra in 0i64 .. 600,
    ) {
        let (intervals, end) = sequence(&segments, last_open);
        let earlier = end.saturating_add_millis(first_extra * MILLIS_PER_MINUTE);
        let later = earlier.saturating_add_millis(second_extra * MILLIS_PER_MINUTE);
        for include in [DutyStatus::is_on_duty, DutyStatus::is_driving, DutyStatus::is_rest] {
            let before = accumulate(&intervals, earlier, include);
            let after = accumulate(&intervals, later, include);
            prop_assert!(before.total_ms >= 0);
            prop_assert!(after.total_ms >= before.total_ms);
            prop_assert!(before.rejected.is_empty());
        }
    }

    #[test]
    fn aggregate_report_is_pure(
        segments in segments_strategy(),
        last_open in any::<bool>(),
    ) {
        let (intervals, end) = sequence(&segments, last_open);
        let driver = DriverId::new("prop-driver");
        let first = aggregate_report(&driver, &intervals, end);
        let second = aggregate_report(&driver, &intervals, end);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.is_compliant, first.violations.is_empty());
        prop_assert!(first.issues.is_empty());
    }
}
