// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Async seams to the stores and providers the bank depends on.
//!
//! Every port is object safe so the services can hold `Arc<dyn _>` handles;
//! a single backend may implement all of them (see [`Ports::from_store`]).

use async_trait::async_trait;
use hourbank_audit::VersionRecord;
use hourbank_domain::{
    Adjustment, AdjustmentTotals, Allocation, BillingRate, CompanyId, ContractSettings,
    MonthlyCalculation, Period, QuantityKind, Usage,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// Classification of a port failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortErrorKind {
    /// The backend could not be reached. Retrying may succeed.
    Unavailable,
    /// The backend refused the call.
    Rejected,
    /// A concurrent write won; the caller's view is stale.
    Conflict,
    /// The addressed record does not exist.
    NotFound,
}

impl std::fmt::Display for PortErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &str = match self {
            Self::Unavailable => "unavailable",
            Self::Rejected => "rejected",
            Self::Conflict => "conflict",
            Self::NotFound => "not found",
        };
        write!(f, "{name}")
    }
}

/// Failure reported by a port implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PortError {
    /// What went wrong.
    pub kind: PortErrorKind,
    /// Backend-specific detail.
    pub message: String,
}

impl PortError {
    /// Creates a port error.
    #[must_use]
    pub fn new(kind: PortErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an [`PortErrorKind::Unavailable`] error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(PortErrorKind::Unavailable, message)
    }

    /// Shorthand for a [`PortErrorKind::Rejected`] error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(PortErrorKind::Rejected, message)
    }

    /// Shorthand for a [`PortErrorKind::Conflict`] error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(PortErrorKind::Conflict, message)
    }

    /// Shorthand for a [`PortErrorKind::NotFound`] error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(PortErrorKind::NotFound, message)
    }

    /// Returns true if retrying the call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, PortErrorKind::Unavailable)
    }
}

/// Source of contract settings.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Returns the stored settings, or `None` for an unknown company.
    async fn get(&self, company: CompanyId) -> Result<Option<ContractSettings>, PortError>;
}

/// Source of monthly consumption figures.
#[async_trait]
pub trait ConsumptionProvider: Send + Sync {
    /// Returns the consumption recorded for the month.
    async fn consumption(&self, company: CompanyId, period: Period) -> Result<Usage, PortError>;

    /// Returns the requests billed through the separate billing channel.
    async fn billed_requests(&self, company: CompanyId, period: Period)
    -> Result<Usage, PortError>;
}

/// Billing rate catalog.
#[async_trait]
pub trait RateCatalog: Send + Sync {
    /// Returns the rate with the latest effective start on or before `period`.
    ///
    /// An expired rate is returned when nothing newer exists.
    async fn latest_rate(
        &self,
        company: CompanyId,
        period: Period,
        kind: QuantityKind,
    ) -> Result<Option<BillingRate>, PortError>;
}

/// Versioned monthly calculations.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    /// Returns the highest version stored for the month.
    async fn latest(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Option<MonthlyCalculation>, PortError>;

    /// Returns one specific version.
    async fn get_version(
        &self,
        company: CompanyId,
        period: Period,
        version: u32,
    ) -> Result<Option<MonthlyCalculation>, PortError>;

    /// Stores a new version together with the record of the transition
    /// that produced it, and returns both with their identifiers.
    ///
    /// Both writes land or neither does. The store sets the record's
    /// `calculation_id` to the new calculation's identifier.
    ///
    /// Implementations must reject, with [`PortErrorKind::Conflict`], any
    /// version other than the current latest plus one.
    async fn insert_versioned(
        &self,
        calculation: &MonthlyCalculation,
        record: &VersionRecord,
    ) -> Result<(MonthlyCalculation, VersionRecord), PortError>;
}

/// Manual adjustments.
#[async_trait]
pub trait AdjustmentStore: Send + Sync {
    /// Stores an adjustment and returns it with its identifier.
    async fn insert(&self, adjustment: &Adjustment) -> Result<Adjustment, PortError>;

    /// Returns one adjustment.
    async fn get(&self, adjustment_id: i64) -> Result<Option<Adjustment>, PortError>;

    /// Soft-deactivates an adjustment and returns its new state.
    async fn deactivate(
        &self,
        adjustment_id: i64,
        deactivated_by: &str,
        deactivated_at: OffsetDateTime,
    ) -> Result<Adjustment, PortError>;

    /// Returns every adjustment of the month, active or not.
    async fn list(&self, company: CompanyId, period: Period)
    -> Result<Vec<Adjustment>, PortError>;

    /// Returns the signed sum of the month's active adjustments.
    async fn active_total(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<AdjustmentTotals, PortError>;
}

/// Append-only audit trail. Records are written by
/// [`CalculationStore::insert_versioned`].
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Returns the month's records, newest first.
    async fn history(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<VersionRecord>, PortError>;
}

/// Company allocations for segmentation.
#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Returns every allocation of the company.
    async fn list(&self, company: CompanyId) -> Result<Vec<Allocation>, PortError>;
}

/// The full set of port handles the services share.
#[derive(Clone)]
pub struct Ports {
    /// Contract settings.
    pub parameters: Arc<dyn ParameterStore>,
    /// Consumption figures.
    pub consumption: Arc<dyn ConsumptionProvider>,
    /// Billing rates.
    pub rates: Arc<dyn RateCatalog>,
    /// Calculation versions.
    pub calculations: Arc<dyn CalculationStore>,
    /// Adjustments.
    pub adjustments: Arc<dyn AdjustmentStore>,
    /// Version records.
    pub versions: Arc<dyn VersionStore>,
    /// Allocations.
    pub allocations: Arc<dyn AllocationStore>,
}

impl Ports {
    /// Wires every port to one backend.
    #[must_use]
    pub fn from_store<S>(store: &Arc<S>) -> Self
    where
        S: ParameterStore
            + ConsumptionProvider
            + RateCatalog
            + CalculationStore
            + AdjustmentStore
            + VersionStore
            + AllocationStore
            + 'static,
    {
        Self {
            parameters: store.clone(),
            consumption: store.clone(),
            rates: store.clone(),
            calculations: store.clone(),
            adjustments: store.clone(),
            versions: store.clone(),
            allocations: store.clone(),
        }
    }
}

impl std::fmt::Debug for Ports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}
