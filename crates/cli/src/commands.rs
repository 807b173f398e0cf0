// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Subcommands and their execution against a wired [`HourBank`].

use clap::{Args as ClapArgs, Subcommand};
use color_eyre::Result;
use hourbank::{AdjustmentOutcome, ChangeContext, HourBank};
use hourbank_audit::{Actor, SnapshotDiff, VersionRecord};
use hourbank_domain::{
    Adjustment, AdjustmentAmount, Allocation, BillingRate, CompanyId, ContractKindCode,
    ContractSettings, Direction, Minutes, MonthlyCalculation, Period, Quantity, QuantityKind,
    SegmentedCalculation, Tickets, Usage,
};
use hourbank_persistence::SqliteStore;
use rust_decimal::Decimal;
use serde_json::Value;
use time::Date;
use time::macros::format_description;
use tracing::info;

/// A company and one of its months.
#[derive(Clone, Debug, ClapArgs)]
pub struct MonthArgs {
    /// Company identifier
    #[arg(long)]
    pub company: i64,

    /// Month as `YYYY-MM` or `MM/YYYY`
    #[arg(long)]
    pub period: Period,
}

impl MonthArgs {
    const fn company(&self) -> CompanyId {
        CompanyId::new(self.company)
    }
}

/// Reported quantities for a month. Omitted values count as zero.
#[derive(Clone, Debug, ClapArgs)]
pub struct UsageArgs {
    #[command(flatten)]
    pub month: MonthArgs,

    /// Hours as `H:MM`
    #[arg(long)]
    pub hours: Option<Minutes>,

    /// Ticket count
    #[arg(long)]
    pub tickets: Option<Tickets>,
}

impl UsageArgs {
    fn usage(&self) -> Usage {
        Usage {
            hours: self.hours.unwrap_or_else(Minutes::zero),
            tickets: self.tickets.unwrap_or_else(Tickets::zero),
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Compute a month and store it as a new version
    Compute {
        #[command(flatten)]
        month: MonthArgs,

        /// Reason recorded in the version history
        #[arg(long, default_value = "Monthly close")]
        reason: String,
    },

    /// Recompute a month as a manual correction
    Recompute {
        #[command(flatten)]
        month: MonthArgs,

        /// Why the month is being corrected
        #[arg(long)]
        reason: String,
    },

    /// Show the latest version of a month, computing it if none exists
    Show {
        #[command(flatten)]
        month: MonthArgs,
    },

    /// List a month's version records, newest first
    History {
        #[command(flatten)]
        month: MonthArgs,
    },

    /// Compare two versions of a month
    Diff {
        #[command(flatten)]
        month: MonthArgs,

        /// Earlier version
        #[arg(long)]
        from: u32,

        /// Later version
        #[arg(long)]
        to: u32,
    },

    /// Split the latest version of a month across the company's allocations
    Segment {
        #[command(flatten)]
        month: MonthArgs,
    },

    /// Record a manual adjustment and recompute the affected months
    Adjust {
        #[command(flatten)]
        month: MonthArgs,

        /// Hours as `H:MM`
        #[arg(long)]
        hours: Option<Minutes>,

        /// Ticket count
        #[arg(long)]
        tickets: Option<Tickets>,

        /// `Entry` credits the bank, `Exit` debits it
        #[arg(long)]
        direction: Direction,

        /// Justification for the adjustment
        #[arg(long)]
        note: String,
    },

    /// Deactivate an adjustment and recompute the affected months
    Deactivate {
        /// Adjustment identifier
        #[arg(long)]
        id: i64,
    },

    /// List a month's adjustments, including inactive ones
    Adjustments {
        #[command(flatten)]
        month: MonthArgs,
    },

    /// Load reference data into the store
    #[command(subcommand)]
    Seed(SeedCommand),
}

#[derive(Clone, Debug, Subcommand)]
pub enum SeedCommand {
    /// Create or replace a company's contract settings
    Contract {
        /// Company identifier
        #[arg(long)]
        company: i64,

        /// Display name used in overage notes
        #[arg(long)]
        name: Option<String>,

        /// `Hours`, `Tickets` or `Both`
        #[arg(long)]
        kind: Option<ContractKindCode>,

        /// Months per closure period
        #[arg(long)]
        cycle_length: Option<u8>,

        /// Contract start as `YYYY-MM-DD`
        #[arg(long, value_parser = parse_date)]
        start: Option<Date>,

        /// Monthly hours allotment as `H:MM`
        #[arg(long)]
        hours_baseline: Option<Minutes>,

        /// Monthly ticket allotment
        #[arg(long)]
        tickets_baseline: Option<Tickets>,

        /// Carry positive balances across period closes
        #[arg(long)]
        special_rollover: Option<bool>,

        /// Period closes before a carried balance is zeroed
        #[arg(long)]
        cycles_until_zeroing: Option<u8>,

        /// Share of a positive monthly balance carried forward
        #[arg(long)]
        rollover_percent: Option<Decimal>,

        /// Cycle index at the start of the bank chain
        #[arg(long)]
        cycle_index: Option<u8>,
    },

    /// Record the consumption reported for a month
    Usage(UsageArgs),

    /// Record the requests billed separately for a month
    Billed(UsageArgs),

    /// Add a billing rate
    Rate {
        /// Company identifier
        #[arg(long)]
        company: i64,

        /// `Hours` or `Tickets`
        #[arg(long)]
        kind: QuantityKind,

        /// First month the rate applies to
        #[arg(long)]
        from: Period,

        /// Last month the rate was meant to apply to
        #[arg(long)]
        until: Option<Period>,

        /// Price per hour or per ticket
        #[arg(long)]
        value: Decimal,
    },

    /// Create or update an allocation
    Allocation {
        /// Company identifier
        #[arg(long)]
        company: i64,

        /// Allocation name
        #[arg(long)]
        name: String,

        /// Share of the baseline in percent
        #[arg(long)]
        percent: Decimal,

        /// Store the allocation as inactive
        #[arg(long)]
        inactive: bool,
    },
}

fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
}

impl Command {
    /// Runs the command and returns its result as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails or its result cannot be
    /// serialized.
    pub async fn run(self, bank: &HourBank, store: &SqliteStore, author: &Actor) -> Result<Value> {
        match self {
            Self::Compute { month, reason } => {
                info!(company = month.company, period = %month.period, "Computing month");
                let change: ChangeContext = ChangeContext::recompute(author.clone(), reason);
                let calculation: MonthlyCalculation = bank
                    .calculations()
                    .compute(month.company(), month.period, &change)
                    .await?;
                Ok(serde_json::to_value(calculation)?)
            }
            Self::Recompute { month, reason } => {
                let calculation: MonthlyCalculation = bank
                    .calculations()
                    .recompute(month.company(), month.period, author, &reason)
                    .await?;
                Ok(serde_json::to_value(calculation)?)
            }
            Self::Show { month } => {
                let calculation: MonthlyCalculation = bank
                    .calculations()
                    .get_or_compute(month.company(), month.period, author)
                    .await?;
                Ok(serde_json::to_value(calculation)?)
            }
            Self::History { month } => {
                let records: Vec<VersionRecord> = bank
                    .ledger()
                    .history(month.company(), month.period)
                    .await?;
                Ok(serde_json::to_value(records)?)
            }
            Self::Diff { month, from, to } => {
                let diff: SnapshotDiff = bank
                    .ledger()
                    .diff_versions(month.company(), month.period, from, to)
                    .await?;
                Ok(serde_json::to_value(diff)?)
            }
            Self::Segment { month } => {
                let segments: Vec<SegmentedCalculation> = bank
                    .segmenter()
                    .segment_latest(month.company(), month.period)
                    .await?;
                Ok(serde_json::to_value(segments)?)
            }
            Self::Adjust {
                month,
                hours,
                tickets,
                direction,
                note,
            } => {
                let outcome: AdjustmentOutcome = bank
                    .adjustments()
                    .create(
                        month.company(),
                        month.period,
                        AdjustmentAmount { hours, tickets },
                        direction,
                        &note,
                        author,
                    )
                    .await?;
                Ok(outcome_json(&outcome))
            }
            Self::Deactivate { id } => {
                let outcome: AdjustmentOutcome = bank.adjustments().deactivate(id, author).await?;
                Ok(outcome_json(&outcome))
            }
            Self::Adjustments { month } => {
                let adjustments: Vec<Adjustment> = bank
                    .adjustments()
                    .list(month.company(), month.period)
                    .await?;
                Ok(serde_json::to_value(adjustments)?)
            }
            Self::Seed(seed) => seed.run(store).await,
        }
    }
}

fn outcome_json(outcome: &AdjustmentOutcome) -> Value {
    serde_json::json!({
        "adjustment": outcome.adjustment,
        "recalculated_months": outcome.recalculated_months,
    })
}

impl SeedCommand {
    async fn run(self, store: &SqliteStore) -> Result<Value> {
        match self {
            Self::Contract {
                company,
                name,
                kind,
                cycle_length,
                start,
                hours_baseline,
                tickets_baseline,
                special_rollover,
                cycles_until_zeroing,
                rollover_percent,
                cycle_index,
            } => {
                let settings: ContractSettings = ContractSettings {
                    company_name: name,
                    kind,
                    cycle_length_months: cycle_length,
                    contract_start: start,
                    hours_baseline,
                    tickets_baseline,
                    has_special_rollover: special_rollover,
                    cycles_until_zeroing,
                    monthly_rollover_percent: rollover_percent,
                    current_cycle_index: cycle_index,
                };
                store
                    .put_contract(CompanyId::new(company), &settings)
                    .await?;
                info!(company, "Contract stored");
                Ok(serde_json::to_value(settings)?)
            }
            Self::Usage(args) => {
                let usage: Usage = args.usage();
                store
                    .put_usage(args.month.company(), args.month.period, usage)
                    .await?;
                Ok(serde_json::to_value(usage)?)
            }
            Self::Billed(args) => {
                let billed: Usage = args.usage();
                store
                    .put_billed(args.month.company(), args.month.period, billed)
                    .await?;
                Ok(serde_json::to_value(billed)?)
            }
            Self::Rate {
                company,
                kind,
                from,
                until,
                value,
            } => {
                let rate: BillingRate = store
                    .put_rate(&BillingRate {
                        id: None,
                        company: CompanyId::new(company),
                        kind,
                        effective_from: from,
                        effective_until: until,
                        value_per_unit: value,
                    })
                    .await?;
                Ok(serde_json::to_value(rate)?)
            }
            Self::Allocation {
                company,
                name,
                percent,
                inactive,
            } => {
                let allocation: Allocation = store
                    .put_allocation(&Allocation {
                        id: None,
                        company: CompanyId::new(company),
                        name,
                        baseline_share_percent: percent,
                        active: !inactive,
                    })
                    .await?;
                Ok(serde_json::to_value(allocation)?)
            }
        }
    }
}
