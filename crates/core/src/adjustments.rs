// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::{CoreError, ErrorContext, WithContext};
use crate::ledger::ChangeContext;
use crate::locks::CompanyLocks;
use crate::orchestrator::CalculationOrchestrator;
use crate::ports::AdjustmentStore;
use hourbank_audit::Actor;
use hourbank_domain::{
    Adjustment, AdjustmentAmount, CompanyId, ContractParameters, Direction, DomainError,
    MonthlyCalculation, Period, cascade_periods, validate_note,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Result of creating or deactivating an adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentOutcome {
    /// The adjustment as stored after the operation.
    pub adjustment: Adjustment,
    /// How many months were recomputed by the cascade.
    pub recalculated_months: usize,
}

/// Records manual corrections and cascades their effect.
#[derive(Clone)]
pub struct AdjustmentManager {
    store: Arc<dyn AdjustmentStore>,
    orchestrator: CalculationOrchestrator,
    locks: CompanyLocks,
}

impl AdjustmentManager {
    /// Creates a manager.
    ///
    /// `locks` must be the registry the orchestrator was built with.
    #[must_use]
    pub fn new(
        store: Arc<dyn AdjustmentStore>,
        orchestrator: CalculationOrchestrator,
        locks: CompanyLocks,
    ) -> Self {
        Self {
            store,
            orchestrator,
            locks,
        }
    }

    /// Records an adjustment and recomputes through the next period end.
    ///
    /// # Arguments
    ///
    /// * `company` - The company
    /// * `period` - The month being corrected
    /// * `amount` - Non-negative magnitudes
    /// * `direction` - `Entry` gives balance back, `Exit` takes it away
    /// * `note` - Mandatory justification
    /// * `author` - Who records the adjustment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The note or amount is invalid
    /// - The month has never been computed
    /// - A store fails or a month of the cascade fails to compute
    pub async fn create(
        &self,
        company: CompanyId,
        period: Period,
        amount: AdjustmentAmount,
        direction: Direction,
        note: &str,
        author: &Actor,
    ) -> Result<AdjustmentOutcome, CoreError> {
        let context = || {
            ErrorContext::new("create adjustment")
                .company(company)
                .period(period)
        };

        validate_note(note).within(|| context().field("note"))?;

        let _guard = self.locks.acquire(company).await;
        let params: ContractParameters = self.orchestrator.resolver().resolve(company).await?;
        amount
            .validate(&params.kind)
            .within(|| context().field("amount"))?;

        self.require_calculation(company, period, context).await?;

        let draft: Adjustment = Adjustment {
            id: None,
            company,
            period,
            amount,
            direction,
            note: note.trim().to_string(),
            active: true,
            author: author.id.clone(),
            created_at: OffsetDateTime::now_utc(),
            deactivated_by: None,
            deactivated_at: None,
        };
        let adjustment: Adjustment = self.store.insert(&draft).await.within(context)?;
        info!(
            company = %company,
            period = %period,
            adjustment_id = ?adjustment.id,
            direction = %direction,
            "Recorded adjustment"
        );

        let change: ChangeContext = ChangeContext::adjustment(author.clone(), &adjustment.note);
        let recalculated_months: usize = self.cascade(&params, period, change).await?;

        Ok(AdjustmentOutcome {
            adjustment,
            recalculated_months,
        })
    }

    /// Soft-deactivates an adjustment and recomputes through the next period
    /// end.
    ///
    /// # Errors
    ///
    /// Returns an error if the adjustment does not exist or is already
    /// inactive, or if the cascade fails.
    pub async fn deactivate(
        &self,
        adjustment_id: i64,
        author: &Actor,
    ) -> Result<AdjustmentOutcome, CoreError> {
        let context = || ErrorContext::new("deactivate adjustment");

        let company: CompanyId = self.find(adjustment_id, context).await?.company;

        let _guard = self.locks.acquire(company).await;
        // Re-read under the lock; a concurrent deactivation may have won.
        let current: Adjustment = self.find(adjustment_id, context).await?;
        let context = || context().company(company).period(current.period);
        if !current.active {
            return Err(CoreError::from_domain(
                context(),
                DomainError::AdjustmentAlreadyInactive { adjustment_id },
            ));
        }

        let params: ContractParameters = self.orchestrator.resolver().resolve(company).await?;
        let adjustment: Adjustment = self
            .store
            .deactivate(adjustment_id, &author.id, OffsetDateTime::now_utc())
            .await
            .within(context)?;
        info!(
            company = %company,
            period = %adjustment.period,
            adjustment_id,
            "Deactivated adjustment"
        );

        let change: ChangeContext = ChangeContext::adjustment(
            author.clone(),
            format!("Deactivated adjustment {adjustment_id}: {}", adjustment.note),
        );
        let recalculated_months: usize = self.cascade(&params, adjustment.period, change).await?;

        Ok(AdjustmentOutcome {
            adjustment,
            recalculated_months,
        })
    }

    /// Returns every adjustment of the month, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the adjustment store fails.
    pub async fn list(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<Adjustment>, CoreError> {
        self.store.list(company, period).await.within(|| {
            ErrorContext::new("list adjustments")
                .company(company)
                .period(period)
        })
    }

    async fn find(
        &self,
        adjustment_id: i64,
        context: impl Fn() -> ErrorContext + Send + Sync,
    ) -> Result<Adjustment, CoreError> {
        self.store
            .get(adjustment_id)
            .await
            .within(&context)?
            .ok_or_else(|| CoreError::NotFound {
                context: context().field("adjustment_id"),
                resource: format!("adjustment {adjustment_id}"),
            })
    }

    async fn require_calculation(
        &self,
        company: CompanyId,
        period: Period,
        context: impl Fn() -> ErrorContext + Send + Sync,
    ) -> Result<MonthlyCalculation, CoreError> {
        self.orchestrator
            .latest(company, period)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                context: context(),
                resource: format!("calculation for {period}"),
            })
    }

    /// Recomputes `from` through the next period end, in order.
    ///
    /// The first month is recorded with `first_change`; later months are
    /// plain recomputes. Stops at the first failing month, leaving earlier
    /// months committed.
    async fn cascade(
        &self,
        params: &ContractParameters,
        from: Period,
        first_change: ChangeContext,
    ) -> Result<usize, CoreError> {
        let periods: Vec<Period> =
            cascade_periods(from, params.contract_start, params.cycle_length_months).within(
                || {
                    ErrorContext::new("cascade")
                        .company(params.company)
                        .period(from)
                },
            )?;
        let follow_up: ChangeContext = ChangeContext::recompute(
            first_change.author.clone(),
            format!("Cascade from adjustment in {from}"),
        );

        let mut recalculated: usize = 0;
        for period in &periods {
            let change: &ChangeContext = if *period == from {
                &first_change
            } else {
                &follow_up
            };
            let calculation: MonthlyCalculation = self
                .orchestrator
                .compute_with(params, *period, change)
                .await?;
            recalculated += 1;
            debug!(
                company = %params.company,
                period = %period,
                version = calculation.version,
                step = recalculated,
                total = periods.len(),
                "Cascade step complete"
            );
        }

        info!(
            company = %params.company,
            from = %from,
            months = recalculated,
            "Cascade complete"
        );
        Ok(recalculated)
    }
}

impl std::fmt::Debug for AdjustmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdjustmentManager")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}
