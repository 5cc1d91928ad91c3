// crates/hos-core/src/runtime/validation.rs
// ============================================================================
// Module: HOS Interval Validation
// Description: Boundary checks on interval sets supplied to the engine.
// Purpose: Flag malformed, future, overlapping, and multiply-open intervals.
// Dependencies: crate::core, crate::runtime::intervals
// ============================================================================

//! ## Overview
//! Duration math assumes intervals are well formed, non-overlapping, that at
//! most one interval is open, and that nothing starts after the evaluation
//! instant. Storage does not enforce this, so the engine
//! checks it where intervals enter evaluation and reports every problem as an
//! [`EvaluationIssue`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::DutyInterval;
use crate::core::EvaluationIssue;
use crate::core::Timestamp;
use crate::runtime::intervals::IntervalError;
use crate::runtime::intervals::effective_duration_ms;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Returns every boundary issue found in the interval set.
///
/// Issue order: per-interval integrity issues in input order, then the
/// open-interval count, then overlaps in start order.
#[must_use]
pub fn validate_intervals(intervals: &[DutyInterval], as_of: Timestamp) -> Vec<EvaluationIssue> {
    let mut issues = Vec::new();
    let mut well_formed: Vec<&DutyInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match effective_duration_ms(interval, as_of) {
            Ok(_) => well_formed.push(interval),
            Err(IntervalError::Inverted {
                start,
                end,
            }) => issues.push(EvaluationIssue::InvertedInterval {
                status: interval.status,
                start,
                end,
            }),
            Err(IntervalError::StartsAfterEvaluation {
                start, ..
            }) => issues.push(match interval.end {
                Some(end) => EvaluationIssue::ClosedIntervalAfterEvaluation {
                    status: interval.status,
                    start,
                    end,
                },
                None => EvaluationIssue::OpenIntervalAfterEvaluation {
                    status: interval.status,
                    start,
                },
            }),
        }
    }

    let open_count = intervals.iter().filter(|interval| interval.is_open()).count();
    if open_count > 1 {
        issues.push(EvaluationIssue::MultipleOpenIntervals {
            count: open_count,
        });
    }

    well_formed.sort_by_key(|interval| interval.start);
    // Furthest-reaching interval seen so far, as (start, effective end).
    let mut reach: Option<(Timestamp, Timestamp)> = None;
    for interval in well_formed {
        let end = interval.effective_end(as_of);
        if let Some((earlier_start, furthest_end)) = reach {
            if furthest_end > interval.start {
                issues.push(EvaluationIssue::OverlappingIntervals {
                    earlier_start,
                    later_start: interval.start,
                });
            }
            if end > furthest_end {
                reach = Some((interval.start, end));
            }
        } else {
            reach = Some((interval.start, end));
        }
    }
    issues
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DutyStatus;
    use crate::core::MILLIS_PER_HOUR;

    fn at(hours: i64) -> Timestamp {
        Timestamp::from_unix_millis(hours * MILLIS_PER_HOUR)
    }

    #[test]
    fn clean_sequence_has_no_issues() {
        let intervals = vec![
            DutyInterval::closed(DutyStatus::OffDuty, at(0), at(2)),
            DutyInterval::closed(DutyStatus::Driving, at(2), at(5)),
            DutyInterval::open(DutyStatus::OnDuty, at(5)),
        ];
        assert!(validate_intervals(&intervals, at(6)).is_empty());
    }

    #[test]
    fn overlap_and_second_open_interval_are_flagged() {
        let intervals = vec![
            DutyInterval::closed(DutyStatus::Driving, at(0), at(3)),
            DutyInterval::open(DutyStatus::OnDuty, at(2)),
            DutyInterval::open(DutyStatus::Driving, at(4)),
        ];
        let issues = validate_intervals(&intervals, at(6));
        assert!(issues.contains(&EvaluationIssue::MultipleOpenIntervals {
            count: 2
        }));
        assert!(issues.contains(&EvaluationIssue::OverlappingIntervals {
            earlier_start: at(0),
            later_start: at(2),
        }));
        assert!(issues.iter().all(EvaluationIssue::is_structural));
    }

    #[test]
    fn inverted_and_future_open_intervals_are_reported() {
        let intervals = vec![
            DutyInterval::closed(DutyStatus::Driving, at(3), at(1)),
            DutyInterval::open(DutyStatus::Driving, at(9)),
        ];
        let issues = validate_intervals(&intervals, at(6));
        assert_eq!(
            issues,
            vec![
                EvaluationIssue::InvertedInterval {
                    status: DutyStatus::Driving,
                    start: at(3),
                    end: at(1),
                },
                EvaluationIssue::OpenIntervalAfterEvaluation {
                    status: DutyStatus::Driving,
                    start: at(9),
                },
            ]
        );
    }

    #[test]
    fn closed_interval_after_evaluation_is_reported() {
        let intervals = vec![
            DutyInterval::closed(DutyStatus::OnDuty, at(0), at(2)),
            DutyInterval::closed(DutyStatus::Driving, at(7), at(9)),
        ];
        let issues = validate_intervals(&intervals, at(6));
        assert_eq!(
            issues,
            vec![EvaluationIssue::ClosedIntervalAfterEvaluation {
                status: DutyStatus::Driving,
                start: at(7),
                end: at(9),
            }]
        );
        assert!(!issues[0].is_structural());
    }

    #[test]
    fn long_interval_overlapping_several_later_ones_is_reported_per_pair() {
        let intervals = vec![
            DutyInterval::closed(DutyStatus::Driving, at(0), at(10)),
            DutyInterval::closed(DutyStatus::OnDuty, at(1), at(2)),
            DutyInterval::closed(DutyStatus::OnDuty, at(3), at(4)),
            DutyInterval::closed(DutyStatus::OffDuty, at(10), at(11)),
        ];
        let issues = validate_intervals(&intervals, at(11));
        assert_eq!(
            issues,
            vec![
                EvaluationIssue::OverlappingIntervals {
                    earlier_start: at(0),
                    later_start: at(1),
                },
                EvaluationIssue::OverlappingIntervals {
                    earlier_start: at(0),
                    later_start: at(3),
                },
            ]
        );
    }
}
