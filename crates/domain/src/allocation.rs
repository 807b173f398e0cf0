// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Proportional segmentation of a consolidated month across allocations.
//!
//! Segments are derived data: they are recomputed from a calculation and the
//! company's allocations and never stored as authoritative figures.
//! Minutes floor and money rounds, so segment totals may fall short of
//! the consolidated figure by at most one unit of tolerance per segment.

use crate::calculation::{BankLedger, MonthlyCalculation, Overage};
use crate::contract::CompanyId;
use crate::error::DomainError;
use crate::period::Period;
use crate::quantity::{Minutes, Quantity, Tickets, round_two};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named share of a company's bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Store-assigned identifier.
    pub id: Option<i64>,
    /// The company.
    pub company: CompanyId,
    /// Display name, e.g. a cost center.
    pub name: String,
    /// Share of the baseline in percent (0-100).
    pub baseline_share_percent: Decimal,
    /// Inactive allocations are ignored.
    pub active: bool,
}

/// A proportional slice of one calculation version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedCalculation {
    /// The allocation's name.
    pub allocation: String,
    /// The share applied.
    pub percent: Decimal,
    /// The company.
    pub company: CompanyId,
    /// The month.
    pub period: Period,
    /// The consolidated version this slice was derived from.
    pub version: u32,
    /// Scaled hours ledger.
    pub hours: Option<BankLedger<Minutes>>,
    /// Scaled tickets ledger.
    pub tickets: Option<BankLedger<Tickets>>,
    /// Scaled amount to bill.
    pub amount_to_bill: Decimal,
}

/// Validates that the active allocations' shares sum to exactly 100.
///
/// # Arguments
///
/// * `allocations` - The company's allocations (inactive ones are ignored)
///
/// # Errors
///
/// Returns an error if any active share is outside 0..=100 or the active
/// shares do not sum to exactly 100.
pub fn validate_sum(allocations: &[Allocation]) -> Result<(), DomainError> {
    let mut sum: Decimal = Decimal::ZERO;
    for allocation in allocations.iter().filter(|a| a.active) {
        let share: Decimal = allocation.baseline_share_percent;
        if share < Decimal::ZERO || share > Decimal::ONE_HUNDRED {
            return Err(DomainError::InvalidSharePercent {
                allocation: allocation.name.clone(),
                percent: share,
            });
        }
        sum += share;
    }

    if sum != Decimal::ONE_HUNDRED {
        return Err(DomainError::PercentSumInvalid { sum });
    }
    Ok(())
}

/// Splits a calculation across the active allocations.
///
/// Every figure is multiplied by `percent / 100`: minutes floor to whole
/// minutes, tickets and money round to two decimals.
///
/// # Arguments
///
/// * `calculation` - The consolidated calculation version
/// * `allocations` - The company's allocations
///
/// # Errors
///
/// Returns an error if the allocation set fails [`validate_sum`]. No partial
/// output is produced.
pub fn segment(
    calculation: &MonthlyCalculation,
    allocations: &[Allocation],
) -> Result<Vec<SegmentedCalculation>, DomainError> {
    validate_sum(allocations)?;

    Ok(allocations
        .iter()
        .filter(|a| a.active)
        .map(|allocation| {
            let percent: Decimal = allocation.baseline_share_percent;
            SegmentedCalculation {
                allocation: allocation.name.clone(),
                percent,
                company: calculation.company,
                period: calculation.period,
                version: calculation.version,
                hours: calculation.hours.map(|l| scale_ledger(&l, percent)),
                tickets: calculation.tickets.map(|l| scale_ledger(&l, percent)),
                amount_to_bill: scale_money(calculation.amount_to_bill, percent),
            }
        })
        .collect())
}

/// Checks that segments re-sum to the consolidated calculation.
///
/// The allowed drift is one minute (hours) or 0.01 (tickets, money) per
/// segment, since each segment rounds down on its own and N segments can
/// fall short of the total by up to N - 1 units. See "Segment tolerance"
/// in DESIGN.md. Intended as a property check, not a write gate.
#[must_use]
pub fn verify_segmented_sum(
    consolidated: &MonthlyCalculation,
    segmented: &[SegmentedCalculation],
) -> bool {
    let count: usize = segmented.len();

    let hours_ok: bool = match consolidated.hours {
        Some(ledger) => {
            let parts: Option<Vec<BankLedger<Minutes>>> =
                segmented.iter().map(|s| s.hours).collect();
            parts.is_some_and(|parts| ledger_sums_match(&ledger, &parts, count))
        }
        None => segmented.iter().all(|s| s.hours.is_none()),
    };

    let tickets_ok: bool = match consolidated.tickets {
        Some(ledger) => {
            let parts: Option<Vec<BankLedger<Tickets>>> =
                segmented.iter().map(|s| s.tickets).collect();
            parts.is_some_and(|parts| ledger_sums_match(&ledger, &parts, count))
        }
        None => segmented.iter().all(|s| s.tickets.is_none()),
    };

    let billed: Decimal = segmented.iter().map(|s| s.amount_to_bill).sum();
    let money_ok: bool = money_within(consolidated.amount_to_bill, billed, count);

    hours_ok && tickets_ok && money_ok
}

fn scale_money(value: Decimal, percent: Decimal) -> Decimal {
    round_two(value * percent / Decimal::ONE_HUNDRED)
}

fn scale_ledger<Q: Quantity>(ledger: &BankLedger<Q>, percent: Decimal) -> BankLedger<Q> {
    BankLedger {
        baseline: ledger.baseline.scale(percent),
        rollover_from_previous: ledger.rollover_from_previous.scale(percent),
        available_balance: ledger.available_balance.scale(percent),
        consumption: ledger.consumption.scale(percent),
        billed_requests: ledger.billed_requests.scale(percent),
        adjustments: ledger.adjustments.scale(percent),
        total_consumption: ledger.total_consumption.scale(percent),
        balance: ledger.balance.scale(percent),
        closing_balance: ledger.closing_balance.scale(percent),
        rollover_to_next: ledger.rollover_to_next.scale(percent),
        overage: ledger.overage.map(|o| Overage {
            amount: o.amount.scale(percent),
            value: scale_money(o.value, percent),
            rate: o.rate,
            rate_found: o.rate_found,
        }),
    }
}

/// Quantity fields of a ledger, in a fixed order.
fn ledger_fields<Q: Quantity>(ledger: &BankLedger<Q>) -> [Q; 11] {
    [
        ledger.baseline,
        ledger.rollover_from_previous,
        ledger.available_balance,
        ledger.consumption,
        ledger.billed_requests,
        ledger.adjustments,
        ledger.total_consumption,
        ledger.balance,
        ledger.closing_balance,
        ledger.rollover_to_next,
        ledger.overage.map_or_else(Q::zero, |o| o.amount),
    ]
}

fn ledger_sums_match<Q: Quantity>(
    consolidated: &BankLedger<Q>,
    parts: &[BankLedger<Q>],
    count: usize,
) -> bool {
    let expected: [Q; 11] = ledger_fields(consolidated);
    let mut totals: [Q; 11] = [Q::zero(); 11];
    for part in parts {
        for (total, value) in totals.iter_mut().zip(ledger_fields(part)) {
            *total = *total + value;
        }
    }

    let tolerance: Q = Q::tolerance(count);
    let quantities_ok: bool = expected
        .iter()
        .zip(totals.iter())
        .all(|(e, t)| e.within(*t, tolerance));

    let value: Decimal = parts.iter().map(BankLedger::overage_value).sum();
    quantities_ok && money_within(consolidated.overage_value(), value, count)
}

fn money_within(expected: Decimal, actual: Decimal, count: usize) -> bool {
    let segments: i64 = i64::try_from(count.max(1)).unwrap_or(i64::MAX);
    (expected - actual).abs() <= Decimal::new(segments, 2)
}
