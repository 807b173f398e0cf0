// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference data writes.
//!
//! Contracts, usage, rates and allocations belong to the systems around the
//! bank. The operator tool and the tests load them through these upserts.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_domain::{
    Allocation, BillingRate, CompanyId, ContractSettings, Minutes, Period, Usage,
};
use tracing::{debug, info};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{date_text, period_key, tickets_text};
use crate::diesel_schema::{allocations, billing_rates, contracts, usage_records};
use crate::error::PersistenceError;

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = contracts, primary_key(company_id), treat_none_as_null = true)]
struct ContractValues {
    company_id: i64,
    company_name: Option<String>,
    contract_kind: Option<&'static str>,
    cycle_length_months: Option<i32>,
    contract_start: Option<String>,
    hours_baseline_minutes: Option<i64>,
    tickets_baseline: Option<String>,
    has_special_rollover: Option<i32>,
    cycles_until_zeroing: Option<i32>,
    monthly_rollover_percent: Option<String>,
    current_cycle_index: Option<i32>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = usage_records)]
struct UsageValues<'a> {
    company_id: i64,
    period: String,
    channel: &'a str,
    hours_minutes: i64,
    tickets: String,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = allocations)]
struct AllocationValues<'a> {
    company_id: i64,
    name: &'a str,
    baseline_share_percent: String,
    is_active: i32,
}

/// Creates or replaces a company's contract settings.
///
/// Absent settings are stored as NULL so that a later computation reports
/// them as missing.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn put_contract(
    conn: &mut SqliteConnection,
    company: CompanyId,
    settings: &ContractSettings,
) -> Result<(), PersistenceError> {
    let values: ContractValues = ContractValues {
        company_id: company.value(),
        company_name: settings.company_name.clone(),
        contract_kind: settings.kind.map(|kind| kind.as_str()),
        cycle_length_months: settings.cycle_length_months.map(i32::from),
        contract_start: settings.contract_start.map(date_text).transpose()?,
        hours_baseline_minutes: settings.hours_baseline.map(Minutes::value),
        tickets_baseline: settings.tickets_baseline.map(tickets_text),
        has_special_rollover: settings.has_special_rollover.map(i32::from),
        cycles_until_zeroing: settings.cycles_until_zeroing.map(i32::from),
        monthly_rollover_percent: settings.monthly_rollover_percent.map(|p| p.to_string()),
        current_cycle_index: settings.current_cycle_index.map(i32::from),
    };

    diesel::insert_into(contracts::table)
        .values(&values)
        .on_conflict(contracts::company_id)
        .do_update()
        .set(&values)
        .execute(conn)?;

    info!(company = %company, "Stored contract settings");
    Ok(())
}

/// Creates or replaces the usage reported on one channel for a month.
///
/// # Errors
///
/// Returns an error if the upsert fails, including when the company has no
/// contract.
pub fn put_usage(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
    channel: &str,
    usage: Usage,
) -> Result<(), PersistenceError> {
    let values: UsageValues<'_> = UsageValues {
        company_id: company.value(),
        period: period_key(period),
        channel,
        hours_minutes: usage.hours.value(),
        tickets: tickets_text(usage.tickets),
    };

    diesel::insert_into(usage_records::table)
        .values(&values)
        .on_conflict((
            usage_records::company_id,
            usage_records::period,
            usage_records::channel,
        ))
        .do_update()
        .set(&values)
        .execute(conn)?;

    debug!(
        company = %company,
        period = %period,
        channel,
        hours = %usage.hours,
        tickets = %usage.tickets,
        "Stored usage"
    );
    Ok(())
}

/// Adds a billing rate and returns it with its generated id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn put_rate(
    conn: &mut SqliteConnection,
    rate: &BillingRate,
) -> Result<BillingRate, PersistenceError> {
    diesel::insert_into(billing_rates::table)
        .values((
            billing_rates::company_id.eq(rate.company.value()),
            billing_rates::quantity_kind.eq(rate.kind.as_str()),
            billing_rates::effective_from.eq(period_key(rate.effective_from)),
            billing_rates::effective_until.eq(rate.effective_until.map(period_key)),
            billing_rates::value_per_unit.eq(rate.value_per_unit.to_string()),
        ))
        .execute(conn)?;

    let rate_id: i64 = get_last_insert_rowid(conn)?;
    debug!(rate_id, company = %rate.company, kind = %rate.kind, "Stored billing rate");

    Ok(BillingRate {
        id: Some(rate_id),
        ..rate.clone()
    })
}

/// Creates or updates an allocation, keyed by company and name.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn put_allocation(
    conn: &mut SqliteConnection,
    allocation: &Allocation,
) -> Result<Allocation, PersistenceError> {
    let values: AllocationValues<'_> = AllocationValues {
        company_id: allocation.company.value(),
        name: &allocation.name,
        baseline_share_percent: allocation.baseline_share_percent.to_string(),
        is_active: i32::from(allocation.active),
    };

    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        diesel::insert_into(allocations::table)
            .values(&values)
            .on_conflict((allocations::company_id, allocations::name))
            .do_update()
            .set(&values)
            .execute(conn)?;

        let allocation_id: i64 = allocations::table
            .filter(allocations::company_id.eq(values.company_id))
            .filter(allocations::name.eq(values.name))
            .select(allocations::allocation_id)
            .first(conn)?;

        debug!(
            allocation_id,
            company = %allocation.company,
            name = %allocation.name,
            share = %allocation.baseline_share_percent,
            "Stored allocation"
        );
        Ok(Allocation {
            id: Some(allocation_id),
            ..allocation.clone()
        })
    })
}
