// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and the conversions between rows and domain values.
//!
//! Rows mirror the tables one to one. Money, ticket counts and percentages
//! are stored as decimal text, timestamps as RFC 3339 text, periods as
//! `YYYY-MM`, dates as `YYYY-MM-DD`, and ledgers and snapshots as JSON.

use diesel::prelude::*;
use hourbank_audit::{Actor, ChangeKind, Snapshot, VersionRecord};
use hourbank_domain::{
    Adjustment, AdjustmentAmount, Allocation, BankLedger, BillingRate, CalculationWarning,
    CompanyId, ContractKindCode, ContractSettings, CycleState, Direction, Minutes,
    MonthlyCalculation, Period, QuantityKind, Tickets, Usage,
};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::diesel_schema::{
    adjustments, allocations, billing_rates, calculations, contracts, usage_records,
    version_records,
};
use crate::error::PersistenceError;

/// Usage channel for consumption reported by the ticketing system.
pub const CHANNEL_CONSUMPTION: &str = "consumption";
/// Usage channel for requests billed separately.
pub const CHANNEL_BILLED: &str = "billed";

/// Formats a period as its storage key.
#[must_use]
pub fn period_key(period: Period) -> String {
    format!("{:04}-{:02}", period.year(), period.month())
}

fn reconstruction(what: &str, err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::InvalidRow(format!("{what}: {err}"))
}

pub fn parse_period(value: &str) -> Result<Period, PersistenceError> {
    Period::from_str(value).map_err(|e| reconstruction("period", e))
}

pub fn parse_decimal(what: &str, value: &str) -> Result<Decimal, PersistenceError> {
    Decimal::from_str(value).map_err(|e| reconstruction(what, e))
}

fn parse_tickets(value: &str) -> Result<Tickets, PersistenceError> {
    Tickets::from_str(value).map_err(|e| reconstruction("tickets", e))
}

/// Formats a ticket count as decimal text.
#[must_use]
pub fn tickets_text(tickets: Tickets) -> String {
    tickets.value().to_string()
}

/// Formats a timestamp as RFC 3339 text.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in RFC 3339.
pub fn timestamp_text(at: OffsetDateTime) -> Result<String, PersistenceError> {
    at.format(&Rfc3339)
        .map_err(|e| PersistenceError::Encoding(e.to_string()))
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| reconstruction("timestamp", e))
}

/// Formats a date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn date_text(date: Date) -> Result<String, PersistenceError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| PersistenceError::Encoding(e.to_string()))
}

fn parse_date(value: &str) -> Result<Date, PersistenceError> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|e| reconstruction("date", e))
}

fn small(what: &str, value: i32) -> Result<u8, PersistenceError> {
    value
        .to_u8()
        .ok_or_else(|| reconstruction(what, format!("{value} is out of range")))
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = contracts)]
pub struct ContractRow {
    pub company_id: i64,
    pub company_name: Option<String>,
    pub contract_kind: Option<String>,
    pub cycle_length_months: Option<i32>,
    pub contract_start: Option<String>,
    pub hours_baseline_minutes: Option<i64>,
    pub tickets_baseline: Option<String>,
    pub has_special_rollover: Option<i32>,
    pub cycles_until_zeroing: Option<i32>,
    pub monthly_rollover_percent: Option<String>,
    pub current_cycle_index: Option<i32>,
}

impl ContractRow {
    /// Converts the row to settings; absent columns stay absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a present column holds an unreadable value.
    pub fn into_settings(self) -> Result<ContractSettings, PersistenceError> {
        Ok(ContractSettings {
            company_name: self.company_name,
            kind: self
                .contract_kind
                .as_deref()
                .map(ContractKindCode::from_str)
                .transpose()
                .map_err(|e| reconstruction("contract kind", e))?,
            cycle_length_months: self
                .cycle_length_months
                .map(|v| small("cycle_length_months", v))
                .transpose()?,
            contract_start: self.contract_start.as_deref().map(parse_date).transpose()?,
            hours_baseline: self.hours_baseline_minutes.map(Minutes::new),
            tickets_baseline: self
                .tickets_baseline
                .as_deref()
                .map(parse_tickets)
                .transpose()?,
            has_special_rollover: self.has_special_rollover.map(|v| v != 0),
            cycles_until_zeroing: self
                .cycles_until_zeroing
                .map(|v| small("cycles_until_zeroing", v))
                .transpose()?,
            monthly_rollover_percent: self
                .monthly_rollover_percent
                .as_deref()
                .map(|v| parse_decimal("monthly_rollover_percent", v))
                .transpose()?,
            current_cycle_index: self
                .current_cycle_index
                .map(|v| small("current_cycle_index", v))
                .transpose()?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = usage_records)]
pub struct UsageRow {
    pub hours_minutes: i64,
    pub tickets: String,
}

impl UsageRow {
    pub fn into_usage(self) -> Result<Usage, PersistenceError> {
        Ok(Usage {
            hours: Minutes::new(self.hours_minutes),
            tickets: parse_tickets(&self.tickets)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = billing_rates)]
pub struct RateRow {
    pub rate_id: i64,
    pub company_id: i64,
    pub quantity_kind: String,
    pub effective_from: String,
    pub effective_until: Option<String>,
    pub value_per_unit: String,
}

impl RateRow {
    pub fn into_rate(self) -> Result<BillingRate, PersistenceError> {
        Ok(BillingRate {
            id: Some(self.rate_id),
            company: CompanyId::new(self.company_id),
            kind: QuantityKind::from_str(&self.quantity_kind)
                .map_err(|e| reconstruction("quantity kind", e))?,
            effective_from: parse_period(&self.effective_from)?,
            effective_until: self
                .effective_until
                .as_deref()
                .map(parse_period)
                .transpose()?,
            value_per_unit: parse_decimal("value_per_unit", &self.value_per_unit)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = calculations)]
pub struct CalculationRow {
    pub calculation_id: i64,
    pub company_id: i64,
    pub period: String,
    pub version: i32,
    pub is_period_end: i32,
    pub cycle_index: i32,
    pub next_cycle_index: i32,
    pub cycles_until_zeroing: i32,
    pub hours_ledger_json: Option<String>,
    pub tickets_ledger_json: Option<String>,
    pub amount_to_bill: String,
    pub overage_note: Option<String>,
    pub warnings_json: String,
    pub computed_by: String,
    pub computed_at: String,
}

impl CalculationRow {
    pub fn into_calculation(self) -> Result<MonthlyCalculation, PersistenceError> {
        let cycles_until_zeroing: u8 = small("cycles_until_zeroing", self.cycles_until_zeroing)?;
        let cycle: CycleState =
            CycleState::new(small("cycle_index", self.cycle_index)?, cycles_until_zeroing)
                .map_err(|e| reconstruction("cycle", e))?;
        let next_cycle: CycleState = CycleState::new(
            small("next_cycle_index", self.next_cycle_index)?,
            cycles_until_zeroing,
        )
        .map_err(|e| reconstruction("next cycle", e))?;

        let hours: Option<BankLedger<Minutes>> = self
            .hours_ledger_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let tickets: Option<BankLedger<Tickets>> = self
            .tickets_ledger_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let warnings: Vec<CalculationWarning> = serde_json::from_str(&self.warnings_json)?;

        Ok(MonthlyCalculation {
            id: Some(self.calculation_id),
            company: CompanyId::new(self.company_id),
            period: parse_period(&self.period)?,
            version: self
                .version
                .to_u32()
                .ok_or_else(|| reconstruction("version", self.version))?,
            is_period_end: self.is_period_end != 0,
            cycle,
            next_cycle,
            hours,
            tickets,
            amount_to_bill: parse_decimal("amount_to_bill", &self.amount_to_bill)?,
            overage_note: self.overage_note,
            warnings,
            computed_by: self.computed_by,
            computed_at: parse_timestamp(&self.computed_at)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = adjustments)]
pub struct AdjustmentRow {
    pub adjustment_id: i64,
    pub company_id: i64,
    pub period: String,
    pub hours_minutes: Option<i64>,
    pub tickets: Option<String>,
    pub direction: String,
    pub note: String,
    pub is_active: i32,
    pub author: String,
    pub created_at: String,
    pub deactivated_by: Option<String>,
    pub deactivated_at: Option<String>,
}

impl AdjustmentRow {
    pub fn into_adjustment(self) -> Result<Adjustment, PersistenceError> {
        Ok(Adjustment {
            id: Some(self.adjustment_id),
            company: CompanyId::new(self.company_id),
            period: parse_period(&self.period)?,
            amount: AdjustmentAmount {
                hours: self.hours_minutes.map(Minutes::new),
                tickets: self.tickets.as_deref().map(parse_tickets).transpose()?,
            },
            direction: Direction::from_str(&self.direction)
                .map_err(|e| reconstruction("direction", e))?,
            note: self.note,
            active: self.is_active != 0,
            author: self.author,
            created_at: parse_timestamp(&self.created_at)?,
            deactivated_by: self.deactivated_by,
            deactivated_at: self
                .deactivated_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = version_records)]
pub struct VersionRecordRow {
    pub record_id: i64,
    pub calculation_id: i64,
    pub company_id: i64,
    pub period: String,
    pub from_version: i32,
    pub to_version: i32,
    pub before_snapshot_json: String,
    pub after_snapshot_json: String,
    pub reason: String,
    pub change_kind: String,
    pub actor_json: String,
    pub created_at: String,
}

impl VersionRecordRow {
    pub fn into_record(self) -> Result<VersionRecord, PersistenceError> {
        let before: Snapshot = serde_json::from_str(&self.before_snapshot_json)?;
        let after: Snapshot = serde_json::from_str(&self.after_snapshot_json)?;
        let author: Actor = serde_json::from_str(&self.actor_json)?;

        Ok(VersionRecord {
            id: Some(self.record_id),
            calculation_id: self.calculation_id,
            company: CompanyId::new(self.company_id),
            period: parse_period(&self.period)?,
            from_version: self
                .from_version
                .to_u32()
                .ok_or_else(|| reconstruction("from_version", self.from_version))?,
            to_version: self
                .to_version
                .to_u32()
                .ok_or_else(|| reconstruction("to_version", self.to_version))?,
            before,
            after,
            reason: self.reason,
            change_kind: ChangeKind::from_str(&self.change_kind)
                .map_err(|e| reconstruction("change kind", e))?,
            author,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = allocations)]
pub struct AllocationRow {
    pub allocation_id: i64,
    pub company_id: i64,
    pub name: String,
    pub baseline_share_percent: String,
    pub is_active: i32,
}

impl AllocationRow {
    pub fn into_allocation(self) -> Result<Allocation, PersistenceError> {
        Ok(Allocation {
            id: Some(self.allocation_id),
            company: CompanyId::new(self.company_id),
            name: self.name,
            baseline_share_percent: parse_decimal(
                "baseline_share_percent",
                &self.baseline_share_percent,
            )?,
            active: self.is_active != 0,
        })
    }
}
