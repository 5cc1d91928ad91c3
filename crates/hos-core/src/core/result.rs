// crates/hos-core/src/core/result.rs
// ============================================================================
// Module: HOS Rule Results
// Description: Rule identifiers and the per-rule compliance check result.
// Purpose: Give every rule evaluator one tagged, serializable output shape.
// Dependencies: crate::core::time, serde
// ============================================================================

//! ## Overview
//! Each rule evaluator yields at most one [`ComplianceCheckResult`] per call,
//! tagged either as a violation or as compliance. The rule-specific remaining
//! figure is carried by [`Allowance`] and serializes flat next to the common
//! fields (`remaining_time`, `remaining_driving`, `break_required`,
//! `remaining_hours`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Federal Hours-of-Service rules evaluated by the engine.
///
/// # Invariants
/// - Declaration order is the fixed evaluation and reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HosRule {
    /// 14-hour on-duty window.
    #[serde(rename = "14_hour")]
    FourteenHourWindow,
    /// 11-hour driving limit.
    #[serde(rename = "11_hour")]
    ElevenHourDriving,
    /// 30-minute break after 8 hours of driving.
    #[serde(rename = "break")]
    ThirtyMinuteBreak,
    /// 70-hour limit over a rolling 8-day cycle.
    #[serde(rename = "70_hour")]
    SeventyHourEightDay,
}

impl HosRule {
    /// All rules in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::FourteenHourWindow,
        Self::ElevenHourDriving,
        Self::ThirtyMinuteBreak,
        Self::SeventyHourEightDay,
    ];

    /// Returns the stable rule label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FourteenHourWindow => "14_hour",
            Self::ElevenHourDriving => "11_hour",
            Self::ThirtyMinuteBreak => "break",
            Self::SeventyHourEightDay => "70_hour",
        }
    }
}

impl fmt::Display for HosRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a rule label is not recognized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown hos rule: {0}")]
pub struct HosRuleParseError(pub String);

impl FromStr for HosRule {
    type Err = HosRuleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.as_str() == value)
            .ok_or_else(|| HosRuleParseError(value.to_string()))
    }
}

// ============================================================================
// SECTION: Result Shape
// ============================================================================

/// Classification of a rule result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// The rule is violated.
    Violation,
    /// The rule is satisfied.
    Compliance,
    /// Advisory result. Reserved; none of the four rules produce it.
    Warning,
}

/// Rule-specific remaining figure carried by a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allowance {
    /// Hours left in the 14-hour window.
    RemainingTime(f64),
    /// Driving hours left under the 11-hour limit.
    RemainingDriving(f64),
    /// Break minutes still required.
    BreakRequired(u32),
    /// Hours left in the 70-hour cycle.
    RemainingHours(f64),
}

impl Allowance {
    /// Returns the serialized field label for the allowance.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RemainingTime(_) => "remaining_time",
            Self::RemainingDriving(_) => "remaining_driving",
            Self::BreakRequired(_) => "break_required",
            Self::RemainingHours(_) => "remaining_hours",
        }
    }

    /// Returns the allowance value as a float.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::RemainingTime(value)
            | Self::RemainingDriving(value)
            | Self::RemainingHours(value) => value,
            Self::BreakRequired(minutes) => f64::from(minutes),
        }
    }

    /// Rebuilds an allowance from its label and value.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Break minutes are clamped to the u32 range before conversion."
    )]
    pub fn from_parts(label: &str, value: f64) -> Option<Self> {
        match label {
            "remaining_time" => Some(Self::RemainingTime(value)),
            "remaining_driving" => Some(Self::RemainingDriving(value)),
            "remaining_hours" => Some(Self::RemainingHours(value)),
            "break_required" => {
                let minutes = value.round().clamp(0.0, f64::from(u32::MAX));
                Some(Self::BreakRequired(minutes as u32))
            }
            _ => None,
        }
    }
}

/// Output of one rule evaluator.
///
/// # Invariants
/// - Exactly one kind per rule invocation: never both violation and compliance.
/// - Violations carry a zero allowance for hour limits and `break_required = 30`
///   for the break rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheckResult {
    /// Result classification.
    pub kind: ResultKind,
    /// Rule that produced the result.
    pub rule: HosRule,
    /// Evaluation instant.
    pub at: Timestamp,
    /// Human-readable summary.
    pub description: String,
    /// Hours the rule accumulated inside its window.
    pub used_hours: f64,
    /// Rule-specific remaining figure.
    #[serde(flatten)]
    pub allowance: Allowance,
}

impl ComplianceCheckResult {
    /// Creates a violation result.
    #[must_use]
    pub fn violation(
        rule: HosRule,
        at: Timestamp,
        description: impl Into<String>,
        used_hours: f64,
        allowance: Allowance,
    ) -> Self {
        Self {
            kind: ResultKind::Violation,
            rule,
            at,
            description: description.into(),
            used_hours,
            allowance,
        }
    }

    /// Creates a compliance result.
    #[must_use]
    pub fn compliance(
        rule: HosRule,
        at: Timestamp,
        description: impl Into<String>,
        used_hours: f64,
        allowance: Allowance,
    ) -> Self {
        Self {
            kind: ResultKind::Compliance,
            rule,
            at,
            description: description.into(),
            used_hours,
            allowance,
        }
    }

    /// Returns true for violation results.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        self.kind == ResultKind::Violation
    }

    /// Returns true for compliance results.
    #[must_use]
    pub fn is_compliance(&self) -> bool {
        self.kind == ResultKind::Compliance
    }
}
