// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::calculation::Overage;
use crate::contract::CompanyId;
use crate::period::Period;
use crate::quantity::{Quantity, QuantityKind, format_money, round_two};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A billing rate from the rate catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRate {
    /// Store-assigned identifier.
    pub id: Option<i64>,
    /// The company the rate applies to.
    pub company: CompanyId,
    /// The kind the rate prices.
    pub kind: QuantityKind,
    /// First month the rate applies to.
    pub effective_from: Period,
    /// Last month the rate was meant to apply to, if it has expired.
    ///
    /// An expired rate is still used when nothing newer exists.
    pub effective_until: Option<Period>,
    /// Price per hour or per ticket.
    pub value_per_unit: Decimal,
}

impl BillingRate {
    /// Returns true if the rate was past its end month at `period`.
    #[must_use]
    pub fn is_expired_at(&self, period: Period) -> bool {
        self.effective_until.is_some_and(|until| until < period)
    }
}

/// Result of valuing a closing balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverageValuation<Q> {
    /// Magnitude of the deficit (zero for a non-negative balance).
    pub overage_amount: Q,
    /// Monetary value, rounded to two decimals.
    pub monetary_value: Decimal,
    /// Rate used, if any.
    pub rate: Option<Decimal>,
    /// Whether a rate was found. A non-negative balance reports `true`
    /// because nothing needed pricing.
    pub rate_found: bool,
}

impl<Q: Quantity> OverageValuation<Q> {
    /// The valuation of a balance that owes nothing.
    #[must_use]
    pub fn nothing_owed() -> Self {
        Self {
            overage_amount: Q::zero(),
            monetary_value: Decimal::ZERO,
            rate: None,
            rate_found: true,
        }
    }

    /// Converts into the ledger's overage record.
    #[must_use]
    pub fn into_overage(self) -> Overage<Q> {
        Overage {
            amount: self.overage_amount,
            value: self.monetary_value,
            rate: self.rate,
            rate_found: self.rate_found,
        }
    }
}

/// Prices a closing balance against an optional billing rate.
///
/// Hours are priced per hour (minutes / 60), tickets per ticket. A missing
/// rate yields a zero value with `rate_found == false`.
///
/// # Arguments
///
/// * `balance` - The closing balance
/// * `rate` - The catalog rate, if one exists
#[must_use]
pub fn price_overage<Q: Quantity>(balance: Q, rate: Option<&BillingRate>) -> OverageValuation<Q> {
    if !balance.is_negative() {
        return OverageValuation::nothing_owed();
    }

    let overage_amount: Q = balance.abs();
    match rate {
        Some(rate) => OverageValuation {
            overage_amount,
            monetary_value: round_two(overage_amount.billable_units() * rate.value_per_unit),
            rate: Some(rate.value_per_unit),
            rate_found: true,
        },
        None => OverageValuation {
            overage_amount,
            monetary_value: Decimal::ZERO,
            rate: None,
            rate_found: false,
        },
    }
}

/// Produces the canonical public overage line.
///
/// `"Overage of <amount> <unit> for period <MM/YYYY> - Value: <value>"`
#[must_use]
pub fn describe<Q: Quantity>(amount: Q, period: Period, value: Decimal) -> String {
    format!(
        "Overage of {amount} {} for period {period} - Value: {}",
        Q::KIND.unit(),
        format_money(value)
    )
}
