// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The monthly bank ledger.
//!
//! [`evaluate_ledger`] turns one month's inputs into a ledger for a single
//! quantity kind. Pricing the overage needs a rate lookup and is done by the
//! caller, which attaches the result with [`BankLedger::with_overage`].

use crate::contract::{CompanyId, CycleState};
use crate::error::DomainError;
use crate::period::Period;
use crate::quantity::{Minutes, Quantity, QuantityKind, Tickets};
use crate::rollover::{ClosureOutcome, apply_closure, monthly_rollover};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Consumption figures reported for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Hours consumed.
    pub hours: Minutes,
    /// Tickets consumed.
    pub tickets: Tickets,
}

/// Signed sum of a month's active adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentTotals {
    /// Net hours adjustment (positive gives hours back).
    pub hours: Minutes,
    /// Net tickets adjustment (positive gives tickets back).
    pub tickets: Tickets,
}

/// A priced overage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overage<Q> {
    /// Magnitude of the deficit.
    pub amount: Q,
    /// Monetary value of the deficit (zero when no rate was found).
    pub value: Decimal,
    /// Rate per billable unit, when one was found.
    pub rate: Option<Decimal>,
    /// Whether a billing rate was found.
    pub rate_found: bool,
}

/// One month's ledger for a single quantity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankLedger<Q> {
    /// Contractual monthly allotment.
    pub baseline: Q,
    /// Carried in from the previous month.
    pub rollover_from_previous: Q,
    /// `baseline + rollover_from_previous`.
    pub available_balance: Q,
    /// Consumption reported by the usage provider.
    pub consumption: Q,
    /// Requests billed through the separate billing channel.
    pub billed_requests: Q,
    /// Net active adjustments.
    pub adjustments: Q,
    /// `consumption + billed_requests - adjustments`.
    pub total_consumption: Q,
    /// `available_balance - total_consumption`.
    pub balance: Q,
    /// Balance after closure rules (equals `balance` outside period ends).
    pub closing_balance: Q,
    /// Carried into the next month.
    pub rollover_to_next: Q,
    /// Priced overage, present only when closure forced one.
    pub overage: Option<Overage<Q>>,
}

impl<Q: Quantity> BankLedger<Q> {
    /// Returns the ledger with a priced overage attached.
    #[must_use]
    pub fn with_overage(mut self, overage: Overage<Q>) -> Self {
        self.overage = Some(overage);
        self
    }

    /// Returns the overage value, or zero.
    #[must_use]
    pub fn overage_value(&self) -> Decimal {
        self.overage.map_or(Decimal::ZERO, |o| o.value)
    }
}

/// Inputs for one month's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerInputs<Q> {
    /// Contractual monthly allotment.
    pub baseline: Q,
    /// Previous month's `rollover_to_next`, or zero.
    pub rollover_from_previous: Q,
    /// Reported consumption.
    pub consumption: Q,
    /// Reported billed requests.
    pub billed_requests: Q,
    /// Net active adjustments.
    pub adjustments: Q,
}

/// Contract rules that apply to one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRules {
    /// Whether the month closes a period.
    pub is_period_end: bool,
    /// Monthly rollover percentage.
    pub rollover_percent: Decimal,
    /// Whether the contract carries balances across period closes.
    pub has_special_rollover: bool,
    /// Cycle counter in effect for the month.
    pub cycle: CycleState,
}

/// An evaluated ledger plus whether an overage must be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOutcome<Q> {
    /// The ledger, without overage pricing.
    pub ledger: BankLedger<Q>,
    /// Whether closure forced an overage.
    pub force_overage: bool,
}

/// Evaluates one month's ledger for a single quantity kind.
///
/// # Arguments
///
/// * `inputs` - Baseline, carried-in balance, consumption and adjustments
/// * `rules` - The month's closure context
///
/// # Errors
///
/// Returns an error if the rollover percentage or cycle counters are invalid.
pub fn evaluate_ledger<Q: Quantity>(
    inputs: LedgerInputs<Q>,
    rules: &MonthRules,
) -> Result<LedgerOutcome<Q>, DomainError> {
    let available_balance: Q = inputs.baseline + inputs.rollover_from_previous;
    let total_consumption: Q = inputs.consumption + inputs.billed_requests - inputs.adjustments;
    let balance: Q = available_balance - total_consumption;

    let (closing_balance, rollover_to_next, force_overage): (Q, Q, bool) = if rules.is_period_end
    {
        let closure: ClosureOutcome<Q> = apply_closure(
            balance,
            rules.has_special_rollover,
            rules.cycle.index(),
            rules.cycle.cycles_until_zeroing(),
        )?;
        (
            closure.final_balance,
            closure.rollover_out,
            closure.force_overage,
        )
    } else {
        (
            balance,
            monthly_rollover(balance, rules.rollover_percent)?,
            false,
        )
    };

    Ok(LedgerOutcome {
        ledger: BankLedger {
            baseline: inputs.baseline,
            rollover_from_previous: inputs.rollover_from_previous,
            available_balance,
            consumption: inputs.consumption,
            billed_requests: inputs.billed_requests,
            adjustments: inputs.adjustments,
            total_consumption,
            balance,
            closing_balance,
            rollover_to_next,
            overage: None,
        },
        force_overage,
    })
}

/// Non-fatal conditions recorded on a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationWarning {
    /// An overage could not be priced; it needs manual follow-up.
    RateNotFound {
        /// The kind whose rate is missing.
        kind: QuantityKind,
    },
}

impl std::fmt::Display for CalculationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateNotFound { kind } => write!(
                f,
                "No billing rate found for {}; overage value pending manual review",
                kind.unit()
            ),
        }
    }
}

/// One immutable version of a company's monthly bank calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCalculation {
    /// Store-assigned identifier. `None` until persisted.
    pub id: Option<i64>,
    /// The company.
    pub company: CompanyId,
    /// The month.
    pub period: Period,
    /// Version number, starting at 1.
    pub version: u32,
    /// Whether the month closes a period.
    pub is_period_end: bool,
    /// Cycle counter in effect for the month.
    pub cycle: CycleState,
    /// Cycle counter the following month inherits.
    pub next_cycle: CycleState,
    /// Hours ledger, when the contract tracks hours.
    pub hours: Option<BankLedger<Minutes>>,
    /// Tickets ledger, when the contract tracks tickets.
    pub tickets: Option<BankLedger<Tickets>>,
    /// Sum of priced overage values.
    pub amount_to_bill: Decimal,
    /// Public note describing the overage, if any.
    pub overage_note: Option<String>,
    /// Non-fatal conditions for follow-up.
    pub warnings: Vec<CalculationWarning>,
    /// Who triggered the computation.
    pub computed_by: String,
    /// When the computation ran.
    #[serde(with = "time::serde::rfc3339")]
    pub computed_at: OffsetDateTime,
}

impl MonthlyCalculation {
    /// Returns the hours carried into the next month, or zero.
    #[must_use]
    pub fn hours_rollover(&self) -> Minutes {
        self.hours.map_or_else(Minutes::zero, |l| l.rollover_to_next)
    }

    /// Returns the tickets carried into the next month, or zero.
    #[must_use]
    pub fn tickets_rollover(&self) -> Tickets {
        self.tickets.map_or_else(Tickets::zero, |l| l.rollover_to_next)
    }

    /// Returns true if any overage was forced this month.
    #[must_use]
    pub fn has_overage(&self) -> bool {
        self.hours.is_some_and(|l| l.overage.is_some())
            || self.tickets.is_some_and(|l| l.overage.is_some())
    }
}
