// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Monthly rollover and period-end closure rules.
//!
//! This module provides pure, deterministic rules:
//! - How much of a month's balance carries into the next month
//! - Which months close a contractual period
//! - What happens to a balance when a period closes
//! - Which months a change must be cascaded through

use crate::contract::{validate_cycle_length, validate_percent};
use crate::error::DomainError;
use crate::period::{Period, elapsed_months};
use crate::quantity::Quantity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

/// Outcome of applying closure rules to a period-end balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureOutcome<Q> {
    /// Balance after closure (zeroed, carried, or the deficit itself).
    pub final_balance: Q,
    /// Whether the balance must be billed as overage.
    pub force_overage: bool,
    /// Amount carried into the first month of the next period.
    pub rollover_out: Q,
}

/// Computes the portion of a month's balance that rolls into the next month.
///
/// A non-negative balance is scaled by `percent` (minutes floor, tickets
/// round to two decimals and never exceed the balance). A negative balance is
/// returned unchanged: a deficit always propagates in full.
///
/// # Arguments
///
/// * `balance` - The month's closing balance
/// * `percent` - The contract's monthly rollover percentage
///
/// # Errors
///
/// Returns an error if `percent` is outside 0..=100.
pub fn monthly_rollover<Q: Quantity>(balance: Q, percent: Decimal) -> Result<Q, DomainError> {
    validate_percent(percent)?;

    if balance.is_negative() {
        return Ok(balance);
    }

    let scaled: Q = balance.scale(percent);
    if scaled > balance {
        return Ok(balance);
    }
    Ok(scaled)
}

/// Returns true if the month closes a contractual period.
///
/// Counting the contract's first month as 1, a month closes a period when
/// its count is a positive multiple of `cycle_length`.
///
/// # Arguments
///
/// * `month` - The month (1-12)
/// * `year` - The calendar year
/// * `contract_start` - The contract start date
/// * `cycle_length` - Months per period (1-12)
///
/// # Errors
///
/// Returns an error if the month or cycle length is out of range.
pub fn is_period_end(
    month: u8,
    year: i32,
    contract_start: Date,
    cycle_length: u8,
) -> Result<bool, DomainError> {
    Period::new(year, month)?;
    validate_cycle_length(cycle_length)?;

    let elapsed: i64 = elapsed_months(year, month, contract_start);
    Ok(elapsed > 0 && elapsed % i64::from(cycle_length) == 0)
}

/// Applies period-end closure rules to a balance.
///
/// - A negative balance is always billed: it stays as is, overage is
///   forced and nothing carries.
/// - Without special rollover a positive balance is zeroed.
/// - With special rollover a positive balance carries in full until the
///   zeroing cycle, where it is zeroed.
///
/// # Arguments
///
/// * `balance` - The period-end balance
/// * `has_special_rollover` - Whether the contract carries across closes
/// * `current_cycle_index` - The cycle index in effect (1-based)
/// * `cycles_until_zeroing` - Closes before a carried balance is zeroed
///
/// # Errors
///
/// Returns an error if either counter is below 1 or the index exceeds the
/// zeroing count.
pub fn apply_closure<Q: Quantity>(
    balance: Q,
    has_special_rollover: bool,
    current_cycle_index: u8,
    cycles_until_zeroing: u8,
) -> Result<ClosureOutcome<Q>, DomainError> {
    if cycles_until_zeroing < 1 {
        return Err(DomainError::InvalidCyclesUntilZeroing {
            count: cycles_until_zeroing,
        });
    }
    if current_cycle_index < 1 || current_cycle_index > cycles_until_zeroing {
        return Err(DomainError::InvalidCycleIndex {
            index: current_cycle_index,
            cycles_until_zeroing,
        });
    }

    if balance.is_negative() {
        return Ok(ClosureOutcome {
            final_balance: balance,
            force_overage: true,
            rollover_out: Q::zero(),
        });
    }

    let carry: bool = has_special_rollover && current_cycle_index < cycles_until_zeroing;
    if carry {
        Ok(ClosureOutcome {
            final_balance: balance,
            force_overage: false,
            rollover_out: balance,
        })
    } else {
        Ok(ClosureOutcome {
            final_balance: Q::zero(),
            force_overage: false,
            rollover_out: Q::zero(),
        })
    }
}

/// Lists the months a change in `from` must be cascaded through.
///
/// The list starts at `from` and ends at the next period end, inclusive,
/// in chronological order. A change made before the contract's first
/// month runs through the end of the first period.
///
/// # Arguments
///
/// * `from` - The month that changed
/// * `contract_start` - The contract start date
/// * `cycle_length` - Months per period (1-12)
///
/// # Errors
///
/// Returns an error if the cycle length is out of range.
pub fn cascade_periods(
    from: Period,
    contract_start: Date,
    cycle_length: u8,
) -> Result<Vec<Period>, DomainError> {
    validate_cycle_length(cycle_length)?;

    let cycle: i64 = i64::from(cycle_length);
    let elapsed: i64 = from.months_elapsed(contract_start);
    let remaining: i64 = if elapsed > 0 {
        (cycle - elapsed % cycle) % cycle
    } else {
        cycle - elapsed
    };

    let mut periods: Vec<Period> = Vec::new();
    let mut current: Period = from;
    for _ in 0..=remaining {
        periods.push(current);
        current = current.next();
    }
    Ok(periods)
}
