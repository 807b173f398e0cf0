// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::{CoreError, ErrorContext, WithContext};
use crate::ports::RateCatalog;
use hourbank_domain::{
    BillingRate, CompanyId, OverageValuation, Period, Quantity, describe, price_overage,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prices negative closing balances against the rate catalog.
#[derive(Clone)]
pub struct OverageValuator {
    rates: Arc<dyn RateCatalog>,
}

impl OverageValuator {
    /// Creates a valuator over a rate catalog.
    #[must_use]
    pub fn new(rates: Arc<dyn RateCatalog>) -> Self {
        Self { rates }
    }

    /// Values a closing balance.
    ///
    /// A non-negative balance is valued at zero without touching the catalog.
    /// A missing rate is not an error: the result has `rate_found == false`
    /// and a zero value, and a warning is logged for manual follow-up.
    ///
    /// # Arguments
    ///
    /// * `company` - The company
    /// * `balance` - The closing balance
    /// * `period` - The reference month for rate selection
    ///
    /// # Errors
    ///
    /// Returns an error only if the rate catalog fails.
    pub async fn valuate<Q: Quantity + Send>(
        &self,
        company: CompanyId,
        balance: Q,
        period: Period,
    ) -> Result<OverageValuation<Q>, CoreError> {
        if !balance.is_negative() {
            return Ok(OverageValuation::nothing_owed());
        }

        let rate: Option<BillingRate> = self
            .rates
            .latest_rate(company, period, Q::KIND)
            .await
            .within(|| ErrorContext::new("valuate overage").company(company).period(period))?;

        match &rate {
            Some(found) if found.is_expired_at(period) => debug!(
                company = %company,
                period = %period,
                kind = %Q::KIND,
                "Using expired billing rate; no newer rate exists"
            ),
            Some(_) => {}
            None => warn!(
                company = %company,
                period = %period,
                kind = %Q::KIND,
                overage = %balance.abs(),
                "No billing rate found; overage left unpriced for manual review"
            ),
        }

        Ok(price_overage(balance, rate.as_ref()))
    }

    /// Produces the canonical public overage line.
    ///
    /// The company name is only recorded in the log; the line itself is the
    /// fixed customer-facing format.
    #[must_use]
    pub fn describe<Q: Quantity>(
        company_name: &str,
        amount: Q,
        period: Period,
        value: Decimal,
    ) -> String {
        let line: String = describe(amount, period, value);
        debug!(company_name, note = %line, "Generated overage note");
        line
    }
}

impl std::fmt::Debug for OverageValuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverageValuator").finish_non_exhaustive()
    }
}
