// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::quantity::QuantityKind;
use rust_decimal::Decimal;

/// Errors that can occur while validating or evaluating bank rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Month is outside 1..=12.
    InvalidMonth {
        /// The rejected month value.
        month: u8,
    },
    /// Period text could not be parsed.
    InvalidPeriod(String),
    /// Quantity text could not be parsed.
    InvalidQuantity(String),
    /// Cycle length is outside 1..=12 months.
    InvalidCycleLength {
        /// The rejected cycle length.
        months: u8,
    },
    /// Rollover percentage is outside 0..=100.
    InvalidRolloverPercent {
        /// The rejected percentage.
        percent: Decimal,
    },
    /// Cycles-until-zeroing counter is below 1.
    InvalidCyclesUntilZeroing {
        /// The rejected count.
        count: u8,
    },
    /// Current cycle index is below 1 or beyond the zeroing count.
    InvalidCycleIndex {
        /// The rejected index.
        index: u8,
        /// The configured cycles-until-zeroing count.
        cycles_until_zeroing: u8,
    },
    /// A required contract parameter is absent.
    NotConfigured {
        /// The missing parameter.
        field: &'static str,
    },
    /// Adjustment note is shorter than the required minimum.
    NoteTooShort {
        /// The trimmed note length.
        length: usize,
        /// The minimum accepted length.
        minimum: usize,
    },
    /// Adjustment amount is empty, negative, or not covered by the contract.
    InvalidAdjustmentAmount {
        /// Description of the problem.
        reason: String,
    },
    /// The contract does not track the requested quantity kind.
    KindNotCovered {
        /// The kind the contract does not cover.
        kind: QuantityKind,
    },
    /// Adjustment has already been deactivated.
    AdjustmentAlreadyInactive {
        /// The adjustment identifier.
        adjustment_id: i64,
    },
    /// Allocation share is outside 0..=100.
    InvalidSharePercent {
        /// The allocation name.
        allocation: String,
        /// The rejected share.
        percent: Decimal,
    },
    /// Active allocation shares do not sum to exactly 100.
    PercentSumInvalid {
        /// The actual sum of active shares.
        sum: Decimal,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth { month } => {
                write!(f, "Invalid month: {month}. Must be between 1 and 12")
            }
            Self::InvalidPeriod(msg) => write!(f, "Invalid period: {msg}"),
            Self::InvalidQuantity(msg) => write!(f, "Invalid quantity: {msg}"),
            Self::InvalidCycleLength { months } => {
                write!(
                    f,
                    "Invalid cycle length: {months}. Must be between 1 and 12 months"
                )
            }
            Self::InvalidRolloverPercent { percent } => {
                write!(
                    f,
                    "Invalid rollover percentage: {percent}. Must be between 0 and 100"
                )
            }
            Self::InvalidCyclesUntilZeroing { count } => {
                write!(
                    f,
                    "Invalid cycles-until-zeroing count: {count}. Must be at least 1"
                )
            }
            Self::InvalidCycleIndex {
                index,
                cycles_until_zeroing,
            } => {
                write!(
                    f,
                    "Invalid cycle index: {index}. Must be between 1 and {cycles_until_zeroing}"
                )
            }
            Self::NotConfigured { field } => {
                write!(f, "Contract parameter '{field}' is not configured")
            }
            Self::NoteTooShort { length, minimum } => {
                write!(
                    f,
                    "Adjustment note is too short: {length} characters, at least {minimum} required"
                )
            }
            Self::InvalidAdjustmentAmount { reason } => {
                write!(f, "Invalid adjustment amount: {reason}")
            }
            Self::KindNotCovered { kind } => {
                write!(f, "Contract does not track {}", kind.unit())
            }
            Self::AdjustmentAlreadyInactive { adjustment_id } => {
                write!(f, "Adjustment {adjustment_id} is already inactive")
            }
            Self::InvalidSharePercent {
                allocation,
                percent,
            } => {
                write!(
                    f,
                    "Invalid share for allocation '{allocation}': {percent}. Must be between 0 and 100"
                )
            }
            Self::PercentSumInvalid { sum } => {
                write!(
                    f,
                    "Active allocation shares sum to {sum}, expected exactly 100"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
