// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Monthly calculation orchestration.
//!
//! The orchestrator turns a company's contract, the previous month's
//! calculation, reported usage and active adjustments into a new calculation
//! version. Every computation writes a new version and a matching version
//! record; existing versions are never modified.

use crate::error::{CoreError, ErrorContext, WithContext};
use crate::ledger::{ChangeContext, VersionLedger};
use crate::locks::CompanyLocks;
use crate::ports::Ports;
use crate::resolver::ParameterResolver;
use crate::valuator::OverageValuator;
use hourbank_audit::{Actor, VersionRecord};
use hourbank_domain::{
    AdjustmentTotals, BankLedger, CalculationWarning, CompanyId, ContractParameters, CycleState,
    LedgerInputs, LedgerOutcome, Minutes, MonthRules, MonthlyCalculation, OverageValuation,
    Period, Quantity, Tickets, Usage, evaluate_ledger, is_period_end,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Figures carried in from the previous month.
struct Carry {
    hours: Minutes,
    tickets: Tickets,
    cycle: CycleState,
}

/// Findings collected while evaluating a month's ledgers.
#[derive(Default)]
struct Findings {
    warnings: Vec<CalculationWarning>,
    notes: Vec<String>,
    amount_to_bill: Decimal,
}

/// Computes and versions monthly bank calculations.
#[derive(Debug, Clone)]
pub struct CalculationOrchestrator {
    ports: Ports,
    locks: CompanyLocks,
    resolver: ParameterResolver,
    valuator: OverageValuator,
    ledger: VersionLedger,
}

impl CalculationOrchestrator {
    /// Creates an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `ports` - The stores and providers
    /// * `locks` - The per-company lock registry shared with other services
    #[must_use]
    pub fn new(ports: Ports, locks: CompanyLocks) -> Self {
        Self {
            resolver: ParameterResolver::new(ports.parameters.clone()),
            valuator: OverageValuator::new(ports.rates.clone()),
            ledger: VersionLedger::new(ports.versions.clone(), ports.calculations.clone()),
            ports,
            locks,
        }
    }

    /// Returns the parameter resolver.
    #[must_use]
    pub const fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    /// Returns the version ledger.
    #[must_use]
    pub const fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Computes the month and stores it as a new version.
    ///
    /// # Arguments
    ///
    /// * `company` - The company
    /// * `period` - The month
    /// * `change` - Who asked for the computation and why
    ///
    /// # Errors
    ///
    /// Returns an error if parameters are missing or invalid, a store or
    /// provider fails, or a concurrent write claimed the version first.
    pub async fn compute(
        &self,
        company: CompanyId,
        period: Period,
        change: &ChangeContext,
    ) -> Result<MonthlyCalculation, CoreError> {
        let _guard = self.locks.acquire(company).await;
        let params: ContractParameters = self.resolver.resolve(company).await?;
        self.compute_with(&params, period, change).await
    }

    /// Returns the latest version of the month, computing it if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the computation fails.
    pub async fn get_or_compute(
        &self,
        company: CompanyId,
        period: Period,
        author: &Actor,
    ) -> Result<MonthlyCalculation, CoreError> {
        let _guard = self.locks.acquire(company).await;
        if let Some(existing) = self.latest_unlocked(company, period).await? {
            return Ok(existing);
        }

        let params: ContractParameters = self.resolver.resolve(company).await?;
        let change: ChangeContext =
            ChangeContext::recompute(author.clone(), "Initial monthly computation");
        self.compute_with(&params, period, &change).await
    }

    /// Returns the latest stored version of the month, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the calculation store fails.
    pub async fn latest(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Option<MonthlyCalculation>, CoreError> {
        self.latest_unlocked(company, period).await
    }

    /// Recomputes a month as a manual correction.
    ///
    /// # Errors
    ///
    /// Returns an error if the computation fails.
    pub async fn recompute(
        &self,
        company: CompanyId,
        period: Period,
        author: &Actor,
        reason: &str,
    ) -> Result<MonthlyCalculation, CoreError> {
        let change: ChangeContext = ChangeContext::correction(author.clone(), reason);
        self.compute(company, period, &change).await
    }

    async fn latest_unlocked(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Option<MonthlyCalculation>, CoreError> {
        self.ports
            .calculations
            .latest(company, period)
            .await
            .within(|| ErrorContext::new("latest").company(company).period(period))
    }

    /// Computes one month without taking the company lock.
    ///
    /// Callers must already hold the company's lock.
    pub(crate) async fn compute_with(
        &self,
        params: &ContractParameters,
        period: Period,
        change: &ChangeContext,
    ) -> Result<MonthlyCalculation, CoreError> {
        let company: CompanyId = params.company;
        let context = || ErrorContext::new("compute").company(company).period(period);

        let carry: Carry = self.carry_in(params, period).await?;

        let consumption: Usage = self
            .ports
            .consumption
            .consumption(company, period)
            .await
            .within(context)?;
        let billed: Usage = self
            .ports
            .consumption
            .billed_requests(company, period)
            .await
            .within(context)?;
        let adjustments: AdjustmentTotals = self
            .ports
            .adjustments
            .active_total(company, period)
            .await
            .within(context)?;

        let period_end: bool = is_period_end(
            period.month(),
            period.year(),
            params.contract_start,
            params.cycle_length_months,
        )
        .within(context)?;

        let rules: MonthRules = MonthRules {
            is_period_end: period_end,
            rollover_percent: params.monthly_rollover_percent,
            has_special_rollover: params.has_special_rollover,
            cycle: carry.cycle,
        };

        let mut findings: Findings = Findings::default();

        let hours: Option<BankLedger<Minutes>> = match params.kind.hours_baseline() {
            Some(baseline) => Some(
                self.evaluate(
                    params,
                    period,
                    LedgerInputs {
                        baseline,
                        rollover_from_previous: carry.hours,
                        consumption: consumption.hours,
                        billed_requests: billed.hours,
                        adjustments: adjustments.hours,
                    },
                    &rules,
                    &mut findings,
                )
                .await?,
            ),
            None => None,
        };

        let tickets: Option<BankLedger<Tickets>> = match params.kind.tickets_baseline() {
            Some(baseline) => Some(
                self.evaluate(
                    params,
                    period,
                    LedgerInputs {
                        baseline,
                        rollover_from_previous: carry.tickets,
                        consumption: consumption.tickets,
                        billed_requests: billed.tickets,
                        adjustments: adjustments.tickets,
                    },
                    &rules,
                    &mut findings,
                )
                .await?,
            ),
            None => None,
        };

        let next_cycle: CycleState = if period_end {
            carry.cycle.advance()
        } else {
            carry.cycle
        };

        let previous_version: Option<MonthlyCalculation> =
            self.latest_unlocked(company, period).await?;
        let version: u32 = previous_version.as_ref().map_or(1, |p| p.version + 1);

        let calculation: MonthlyCalculation = MonthlyCalculation {
            id: None,
            company,
            period,
            version,
            is_period_end: period_end,
            cycle: carry.cycle,
            next_cycle,
            hours,
            tickets,
            amount_to_bill: findings.amount_to_bill,
            overage_note: if findings.notes.is_empty() {
                None
            } else {
                Some(findings.notes.join("\n"))
            },
            warnings: findings.warnings,
            computed_by: change.author.id.clone(),
            computed_at: OffsetDateTime::now_utc(),
        };

        let (stored, _record): (MonthlyCalculation, VersionRecord) = self
            .ledger
            .commit(previous_version.as_ref(), &calculation, change)
            .await?;

        info!(
            company = %company,
            period = %period,
            version = stored.version,
            period_end = stored.is_period_end,
            amount_to_bill = %stored.amount_to_bill,
            kind = %change.kind,
            "Computed monthly calculation"
        );
        Ok(stored)
    }

    /// Loads the previous month's carried balances and cycle counter.
    async fn carry_in(
        &self,
        params: &ContractParameters,
        period: Period,
    ) -> Result<Carry, CoreError> {
        let previous: Option<MonthlyCalculation> = self
            .latest_unlocked(params.company, period.previous())
            .await?;

        Ok(match previous {
            Some(prev) => {
                debug!(
                    company = %params.company,
                    period = %period,
                    previous_version = prev.version,
                    "Carrying in previous month"
                );
                Carry {
                    hours: prev.hours_rollover(),
                    tickets: prev.tickets_rollover(),
                    cycle: prev.next_cycle,
                }
            }
            None => Carry {
                hours: Minutes::zero(),
                tickets: Tickets::zero(),
                cycle: params.cycle,
            },
        })
    }

    /// Evaluates one kind's ledger and prices a forced overage.
    async fn evaluate<Q: Quantity + Send + Sync>(
        &self,
        params: &ContractParameters,
        period: Period,
        inputs: LedgerInputs<Q>,
        rules: &MonthRules,
        findings: &mut Findings,
    ) -> Result<BankLedger<Q>, CoreError> {
        let outcome: LedgerOutcome<Q> = evaluate_ledger(inputs, rules).within(|| {
            ErrorContext::new("compute")
                .company(params.company)
                .period(period)
                .field(Q::KIND.as_str())
        })?;

        if !outcome.force_overage {
            return Ok(outcome.ledger);
        }

        let valuation: OverageValuation<Q> = self
            .valuator
            .valuate(params.company, outcome.ledger.closing_balance, period)
            .await?;

        if !valuation.rate_found {
            findings
                .warnings
                .push(CalculationWarning::RateNotFound { kind: Q::KIND });
        }
        findings.amount_to_bill += valuation.monetary_value;
        findings.notes.push(OverageValuator::describe(
            &params.company_name,
            valuation.overage_amount,
            period,
            valuation.monetary_value,
        ));

        Ok(outcome.ledger.with_overage(valuation.into_overage()))
    }
}
