// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod store_tests;

use crate::SqliteStore;
use hourbank_audit::Actor;
use hourbank_domain::{
    BankLedger, CompanyId, ContractKindCode, ContractSettings, CycleState, Minutes,
    MonthlyCalculation, Period,
};
use rust_decimal::Decimal;
use time::macros::{date, datetime};

pub fn create_test_actor() -> Actor {
    Actor::user("analyst-1")
}

pub const fn company() -> CompanyId {
    CompanyId::new(1)
}

pub fn period(year: i32, month: u8) -> Period {
    Period::new(year, month).expect("valid test period")
}

/// Hours contract: 40:00 a month, quarterly cycle from January 2024, half
/// of a positive balance rolls over.
pub fn hours_settings() -> ContractSettings {
    ContractSettings {
        company_name: Some(String::from("Acme Ltda")),
        kind: Some(ContractKindCode::Hours),
        cycle_length_months: Some(3),
        contract_start: Some(date!(2024 - 01 - 01)),
        hours_baseline: Some(Minutes::hm(40, 0)),
        tickets_baseline: None,
        has_special_rollover: Some(false),
        cycles_until_zeroing: Some(1),
        monthly_rollover_percent: Some(Decimal::from(50)),
        current_cycle_index: Some(1),
    }
}

/// A fresh in-memory store with [`hours_settings`] stored for [`company`].
pub async fn create_test_store() -> SqliteStore {
    let store: SqliteStore = SqliteStore::new_in_memory().unwrap();
    store.put_contract(company(), &hours_settings()).await.unwrap();
    store
}

/// A January-style hours calculation: 30:00 used of 40:00, 5:00 rolled.
pub fn sample_calculation(period: Period, version: u32) -> MonthlyCalculation {
    let cycle: CycleState = CycleState::new(1, 1).unwrap();
    MonthlyCalculation {
        id: None,
        company: company(),
        period,
        version,
        is_period_end: false,
        cycle,
        next_cycle: cycle,
        hours: Some(BankLedger {
            baseline: Minutes::hm(40, 0),
            rollover_from_previous: Minutes::hm(0, 0),
            available_balance: Minutes::hm(40, 0),
            consumption: Minutes::hm(30, 0),
            billed_requests: Minutes::hm(0, 0),
            adjustments: Minutes::hm(0, 0),
            total_consumption: Minutes::hm(30, 0),
            balance: Minutes::hm(10, 0),
            closing_balance: Minutes::hm(10, 0),
            rollover_to_next: Minutes::hm(5, 0),
            overage: None,
        }),
        tickets: None,
        amount_to_bill: Decimal::ZERO,
        overage_note: None,
        warnings: Vec::new(),
        computed_by: String::from("analyst-1"),
        computed_at: datetime!(2024-02-01 08:00 UTC),
    }
}
