// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Port implementations for [`SqliteStore`].
//!
//! Each method takes the connection lock for one query or mutation and maps
//! [`crate::PersistenceError`] to [`PortError`] on the way out.

use async_trait::async_trait;
use hourbank::PortError;
use hourbank::ports::{
    AdjustmentStore, AllocationStore, CalculationStore, ConsumptionProvider, ParameterStore,
    RateCatalog, VersionStore,
};
use hourbank_audit::VersionRecord;
use hourbank_domain::{
    Adjustment, AdjustmentTotals, Allocation, BillingRate, CompanyId, ContractSettings,
    MonthlyCalculation, Period, QuantityKind, Usage, active_totals,
};
use num_traits::ToPrimitive;
use time::OffsetDateTime;

use crate::SqliteStore;
use crate::data_models::{CHANNEL_BILLED, CHANNEL_CONSUMPTION};
use crate::{mutations, queries};

#[async_trait]
impl ParameterStore for SqliteStore {
    async fn get(&self, company: CompanyId) -> Result<Option<ContractSettings>, PortError> {
        Ok(self
            .with_conn("get contract", |conn| queries::get_contract(conn, company))
            .await?)
    }
}

#[async_trait]
impl ConsumptionProvider for SqliteStore {
    async fn consumption(&self, company: CompanyId, period: Period) -> Result<Usage, PortError> {
        Ok(self
            .with_conn("consumption", |conn| {
                queries::get_usage(conn, company, period, CHANNEL_CONSUMPTION)
            })
            .await?)
    }

    async fn billed_requests(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Usage, PortError> {
        Ok(self
            .with_conn("billed requests", |conn| {
                queries::get_usage(conn, company, period, CHANNEL_BILLED)
            })
            .await?)
    }
}

#[async_trait]
impl RateCatalog for SqliteStore {
    async fn latest_rate(
        &self,
        company: CompanyId,
        period: Period,
        kind: QuantityKind,
    ) -> Result<Option<BillingRate>, PortError> {
        Ok(self
            .with_conn("latest rate", |conn| {
                queries::latest_rate(conn, company, period, kind)
            })
            .await?)
    }
}

#[async_trait]
impl CalculationStore for SqliteStore {
    async fn latest(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Option<MonthlyCalculation>, PortError> {
        Ok(self
            .with_conn("latest calculation", |conn| {
                queries::latest_calculation(conn, company, period)
            })
            .await?)
    }

    async fn get_version(
        &self,
        company: CompanyId,
        period: Period,
        version: u32,
    ) -> Result<Option<MonthlyCalculation>, PortError> {
        // No stored version can exceed the column range.
        let Some(version) = version.to_i32() else {
            return Ok(None);
        };
        Ok(self
            .with_conn("get calculation version", |conn| {
                queries::get_calculation_version(conn, company, period, version)
            })
            .await?)
    }

    async fn insert_versioned(
        &self,
        calculation: &MonthlyCalculation,
        record: &VersionRecord,
    ) -> Result<(MonthlyCalculation, VersionRecord), PortError> {
        Ok(self
            .with_conn("insert calculation", |conn| {
                mutations::insert_versioned_calculation(conn, calculation, record)
            })
            .await?)
    }
}

#[async_trait]
impl AdjustmentStore for SqliteStore {
    async fn insert(&self, adjustment: &Adjustment) -> Result<Adjustment, PortError> {
        Ok(self
            .with_conn("insert adjustment", |conn| {
                mutations::insert_adjustment(conn, adjustment)
            })
            .await?)
    }

    async fn get(&self, adjustment_id: i64) -> Result<Option<Adjustment>, PortError> {
        Ok(self
            .with_conn("get adjustment", |conn| {
                queries::get_adjustment(conn, adjustment_id)
            })
            .await?)
    }

    async fn deactivate(
        &self,
        adjustment_id: i64,
        deactivated_by: &str,
        deactivated_at: OffsetDateTime,
    ) -> Result<Adjustment, PortError> {
        Ok(self
            .with_conn("deactivate adjustment", |conn| {
                mutations::deactivate_adjustment(
                    conn,
                    adjustment_id,
                    deactivated_by,
                    deactivated_at,
                )
            })
            .await?)
    }

    async fn list(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<Adjustment>, PortError> {
        Ok(self
            .with_conn("list adjustments", |conn| {
                queries::list_adjustments(conn, company, period)
            })
            .await?)
    }

    async fn active_total(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<AdjustmentTotals, PortError> {
        let adjustments: Vec<Adjustment> = AdjustmentStore::list(self, company, period).await?;
        Ok(active_totals(&adjustments))
    }
}

#[async_trait]
impl VersionStore for SqliteStore {
    async fn history(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<VersionRecord>, PortError> {
        Ok(self
            .with_conn("version history", |conn| {
                queries::list_version_records(conn, company, period)
            })
            .await?)
    }
}

#[async_trait]
impl AllocationStore for SqliteStore {
    async fn list(&self, company: CompanyId) -> Result<Vec<Allocation>, PortError> {
        Ok(self
            .with_conn("list allocations", |conn| {
                queries::list_allocations(conn, company)
            })
            .await?)
    }
}
