// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference data queries.
//!
//! Contracts, usage, billing rates and allocations are maintained outside
//! the bank; these queries only read them.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_domain::{
    Allocation, BillingRate, CompanyId, ContractSettings, Period, QuantityKind, Usage,
};
use tracing::debug;

use crate::data_models::{AllocationRow, ContractRow, RateRow, UsageRow, period_key};
use crate::diesel_schema::{allocations, billing_rates, contracts, usage_records};
use crate::error::PersistenceError;

/// Retrieves a company's contract settings.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is unreadable.
/// Returns `Ok(None)` if the company has no contract row.
pub fn get_contract(
    conn: &mut SqliteConnection,
    company: CompanyId,
) -> Result<Option<ContractSettings>, PersistenceError> {
    let row: Option<ContractRow> = contracts::table
        .find(company.value())
        .select(ContractRow::as_select())
        .first(conn)
        .optional()?;

    row.map(ContractRow::into_settings).transpose()
}

/// Retrieves the usage reported on one channel for a month.
///
/// A month with nothing reported reads as zero usage.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is unreadable.
pub fn get_usage(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
    channel: &str,
) -> Result<Usage, PersistenceError> {
    let row: Option<UsageRow> = usage_records::table
        .filter(usage_records::company_id.eq(company.value()))
        .filter(usage_records::period.eq(period_key(period)))
        .filter(usage_records::channel.eq(channel))
        .select(UsageRow::as_select())
        .first(conn)
        .optional()?;

    match row {
        Some(row) => row.into_usage(),
        None => {
            debug!(company = %company, period = %period, channel, "No usage reported");
            Ok(Usage::default())
        }
    }
}

/// Retrieves the rate with the latest effective start on or before `period`.
///
/// Expired rates are not filtered out; the caller decides what an expired
/// rate means. Ties on the start month go to the most recently stored rate.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is unreadable.
pub fn latest_rate(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
    kind: QuantityKind,
) -> Result<Option<BillingRate>, PersistenceError> {
    let row: Option<RateRow> = billing_rates::table
        .filter(billing_rates::company_id.eq(company.value()))
        .filter(billing_rates::quantity_kind.eq(kind.as_str()))
        .filter(billing_rates::effective_from.le(period_key(period)))
        .order((
            billing_rates::effective_from.desc(),
            billing_rates::rate_id.desc(),
        ))
        .select(RateRow::as_select())
        .first(conn)
        .optional()?;

    row.map(RateRow::into_rate).transpose()
}

/// Retrieves every allocation of a company, active or not, in creation order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is unreadable.
pub fn list_allocations(
    conn: &mut SqliteConnection,
    company: CompanyId,
) -> Result<Vec<Allocation>, PersistenceError> {
    let rows: Vec<AllocationRow> = allocations::table
        .filter(allocations::company_id.eq(company.value()))
        .order(allocations::allocation_id.asc())
        .select(AllocationRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AllocationRow::into_allocation).collect()
}
