// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::ports::{
    AdjustmentStore, AllocationStore, CalculationStore, ConsumptionProvider, ParameterStore,
    PortError, RateCatalog, VersionStore,
};
use crate::{HourBank, Ports};
use async_trait::async_trait;
use hourbank_audit::{Actor, VersionRecord};
use hourbank_domain::{
    Adjustment, AdjustmentTotals, Allocation, BillingRate, CompanyId, ContractKindCode,
    ContractSettings, Minutes, MonthlyCalculation, Period, QuantityKind, Usage, active_totals,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::macros::date;

#[derive(Default)]
struct FakeState {
    settings: HashMap<CompanyId, ContractSettings>,
    usage: HashMap<(CompanyId, Period), Usage>,
    billed: HashMap<(CompanyId, Period), Usage>,
    rates: Vec<BillingRate>,
    calculations: Vec<MonthlyCalculation>,
    adjustments: Vec<Adjustment>,
    versions: Vec<VersionRecord>,
    allocations: Vec<Allocation>,
    unreachable_usage: Vec<Period>,
}

/// In-memory implementation of every port.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
    consumption_down: AtomicBool,
    versions_down: AtomicBool,
}

impl FakeStore {
    pub fn put_contract(&self, company: CompanyId, settings: ContractSettings) {
        self.state.lock().unwrap().settings.insert(company, settings);
    }

    pub fn put_usage(&self, company: CompanyId, period: Period, hours: Minutes) {
        self.state.lock().unwrap().usage.insert(
            (company, period),
            Usage {
                hours,
                ..Usage::default()
            },
        );
    }

    pub fn put_billed(&self, company: CompanyId, period: Period, usage: Usage) {
        self.state
            .lock()
            .unwrap()
            .billed
            .insert((company, period), usage);
    }

    pub fn put_rate(&self, company: CompanyId, kind: QuantityKind, from: Period, value: i64) {
        self.state.lock().unwrap().rates.push(BillingRate {
            id: None,
            company,
            kind,
            effective_from: from,
            effective_until: None,
            value_per_unit: Decimal::from(value),
        });
    }

    pub fn put_allocation(&self, company: CompanyId, name: &str, percent: i64, active: bool) {
        self.state.lock().unwrap().allocations.push(Allocation {
            id: None,
            company,
            name: name.to_string(),
            baseline_share_percent: Decimal::from(percent),
            active,
        });
    }

    pub fn set_consumption_down(&self, down: bool) {
        self.consumption_down.store(down, Ordering::SeqCst);
    }

    /// Fails consumption reads for one month only.
    pub fn set_consumption_down_for(&self, period: Period) {
        self.state.lock().unwrap().unreachable_usage.push(period);
    }

    /// Fails the version record half of every versioned insert.
    pub fn set_versions_down(&self, down: bool) {
        self.versions_down.store(down, Ordering::SeqCst);
    }

    /// Every stored version record, in insertion order.
    pub fn recorded(&self) -> Vec<VersionRecord> {
        self.state.lock().unwrap().versions.clone()
    }

    /// Every stored calculation, in insertion order.
    pub fn inserted(&self) -> Vec<MonthlyCalculation> {
        self.state.lock().unwrap().calculations.clone()
    }
}

#[async_trait]
impl ParameterStore for FakeStore {
    async fn get(&self, company: CompanyId) -> Result<Option<ContractSettings>, PortError> {
        Ok(self.state.lock().unwrap().settings.get(&company).cloned())
    }
}

#[async_trait]
impl ConsumptionProvider for FakeStore {
    async fn consumption(&self, company: CompanyId, period: Period) -> Result<Usage, PortError> {
        if self.consumption_down.load(Ordering::SeqCst) {
            return Err(PortError::unavailable("usage provider timed out"));
        }
        let state = self.state.lock().unwrap();
        if state.unreachable_usage.contains(&period) {
            return Err(PortError::unavailable(format!("no usage feed for {period}")));
        }
        Ok(state
            .usage
            .get(&(company, period))
            .copied()
            .unwrap_or_default())
    }

    async fn billed_requests(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Usage, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .billed
            .get(&(company, period))
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RateCatalog for FakeStore {
    async fn latest_rate(
        &self,
        company: CompanyId,
        period: Period,
        kind: QuantityKind,
    ) -> Result<Option<BillingRate>, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rates
            .iter()
            .filter(|r| r.company == company && r.kind == kind && r.effective_from <= period)
            .max_by_key(|r| r.effective_from)
            .cloned())
    }
}

#[async_trait]
impl CalculationStore for FakeStore {
    async fn latest(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Option<MonthlyCalculation>, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .calculations
            .iter()
            .filter(|c| c.company == company && c.period == period)
            .max_by_key(|c| c.version)
            .cloned())
    }

    async fn get_version(
        &self,
        company: CompanyId,
        period: Period,
        version: u32,
    ) -> Result<Option<MonthlyCalculation>, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .calculations
            .iter()
            .find(|c| c.company == company && c.period == period && c.version == version)
            .cloned())
    }

    async fn insert_versioned(
        &self,
        calculation: &MonthlyCalculation,
        record: &VersionRecord,
    ) -> Result<(MonthlyCalculation, VersionRecord), PortError> {
        let mut state = self.state.lock().unwrap();
        let latest: u32 = state
            .calculations
            .iter()
            .filter(|c| c.company == calculation.company && c.period == calculation.period)
            .map(|c| c.version)
            .max()
            .unwrap_or(0);
        if calculation.version != latest + 1 {
            return Err(PortError::conflict(format!(
                "expected version {}, got {}",
                latest + 1,
                calculation.version
            )));
        }
        if self.versions_down.load(Ordering::SeqCst) {
            return Err(PortError::unavailable("version log is read-only"));
        }
        let mut stored: MonthlyCalculation = calculation.clone();
        stored.id = Some(i64::try_from(state.calculations.len()).unwrap() + 1);
        let mut recorded: VersionRecord = record.clone();
        recorded.id = Some(i64::try_from(state.versions.len()).unwrap() + 1);
        recorded.calculation_id = stored.id.unwrap();
        state.calculations.push(stored.clone());
        state.versions.push(recorded.clone());
        Ok((stored, recorded))
    }
}

#[async_trait]
impl AdjustmentStore for FakeStore {
    async fn insert(&self, adjustment: &Adjustment) -> Result<Adjustment, PortError> {
        let mut state = self.state.lock().unwrap();
        let mut stored: Adjustment = adjustment.clone();
        stored.id = Some(i64::try_from(state.adjustments.len()).unwrap() + 1);
        state.adjustments.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, adjustment_id: i64) -> Result<Option<Adjustment>, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .adjustments
            .iter()
            .find(|a| a.id == Some(adjustment_id))
            .cloned())
    }

    async fn deactivate(
        &self,
        adjustment_id: i64,
        deactivated_by: &str,
        deactivated_at: OffsetDateTime,
    ) -> Result<Adjustment, PortError> {
        let mut state = self.state.lock().unwrap();
        let adjustment: &mut Adjustment = state
            .adjustments
            .iter_mut()
            .find(|a| a.id == Some(adjustment_id))
            .ok_or_else(|| PortError::not_found(format!("adjustment {adjustment_id}")))?;
        adjustment.active = false;
        adjustment.deactivated_by = Some(deactivated_by.to_string());
        adjustment.deactivated_at = Some(deactivated_at);
        Ok(adjustment.clone())
    }

    async fn list(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<Adjustment>, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .adjustments
            .iter()
            .filter(|a| a.company == company && a.period == period)
            .cloned()
            .collect())
    }

    async fn active_total(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<AdjustmentTotals, PortError> {
        let state = self.state.lock().unwrap();
        Ok(active_totals(
            state
                .adjustments
                .iter()
                .filter(|a| a.company == company && a.period == period),
        ))
    }
}

#[async_trait]
impl VersionStore for FakeStore {
    async fn history(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<VersionRecord>, PortError> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<VersionRecord> = state
            .versions
            .iter()
            .filter(|r| r.company == company && r.period == period)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }
}

#[async_trait]
impl AllocationStore for FakeStore {
    async fn list(&self, company: CompanyId) -> Result<Vec<Allocation>, PortError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .allocations
            .iter()
            .filter(|a| a.company == company)
            .cloned()
            .collect())
    }
}

pub fn create_test_actor() -> Actor {
    Actor::user("analyst-1")
}

pub fn company() -> CompanyId {
    CompanyId::new(1)
}

pub fn period(year: i32, month: u8) -> Period {
    Period::new(year, month).unwrap()
}

/// Hours contract starting January 2024 with a quarterly cycle, a 40:00
/// baseline and 50% monthly rollover.
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

/// A bank over a fresh fake store seeded with [`hours_settings`].
pub fn create_test_bank() -> (HourBank, Arc<FakeStore>) {
    let store: Arc<FakeStore> = Arc::new(FakeStore::default());
    store.put_contract(company(), hours_settings());
    let bank: HourBank = HourBank::new(Ports::from_store(&store));
    (bank, store)
}
