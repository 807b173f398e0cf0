// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::quantity::{Minutes, QuantityKind, Tickets};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

/// Identifies a client company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(i64);

impl CompanyId {
    /// Creates a company identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stored shape of a contract, without baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKindCode {
    /// Hours only.
    Hours,
    /// Tickets only.
    Tickets,
    /// Hours and tickets.
    Both,
}

impl ContractKindCode {
    /// Returns the stable string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "Hours",
            Self::Tickets => "Tickets",
            Self::Both => "Both",
        }
    }
}

impl FromStr for ContractKindCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hours" => Ok(Self::Hours),
            "Tickets" => Ok(Self::Tickets),
            "Both" => Ok(Self::Both),
            _ => Err(DomainError::InvalidQuantity(format!(
                "unknown contract kind '{s}'"
            ))),
        }
    }
}

impl std::fmt::Display for ContractKindCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a contract tracks, with the monthly baseline for each tracked kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ContractKind {
    /// Hours bank.
    Hours {
        /// Monthly hours allotment.
        baseline: Minutes,
    },
    /// Ticket bank.
    Tickets {
        /// Monthly ticket allotment.
        baseline: Tickets,
    },
    /// Combined hours and ticket bank.
    Both {
        /// Monthly hours allotment.
        hours: Minutes,
        /// Monthly ticket allotment.
        tickets: Tickets,
    },
}

impl ContractKind {
    /// Returns the hours baseline when the contract tracks hours.
    #[must_use]
    pub const fn hours_baseline(&self) -> Option<Minutes> {
        match self {
            Self::Hours { baseline } => Some(*baseline),
            Self::Both { hours, .. } => Some(*hours),
            Self::Tickets { .. } => None,
        }
    }

    /// Returns the ticket baseline when the contract tracks tickets.
    #[must_use]
    pub const fn tickets_baseline(&self) -> Option<Tickets> {
        match self {
            Self::Tickets { baseline } => Some(*baseline),
            Self::Both { tickets, .. } => Some(*tickets),
            Self::Hours { .. } => None,
        }
    }

    /// Returns true if the contract tracks `kind`.
    #[must_use]
    pub const fn covers(&self, kind: QuantityKind) -> bool {
        match kind {
            QuantityKind::Hours => self.hours_baseline().is_some(),
            QuantityKind::Tickets => self.tickets_baseline().is_some(),
        }
    }

    /// Returns the storage code for this shape.
    #[must_use]
    pub const fn code(&self) -> ContractKindCode {
        match self {
            Self::Hours { .. } => ContractKindCode::Hours,
            Self::Tickets { .. } => ContractKindCode::Tickets,
            Self::Both { .. } => ContractKindCode::Both,
        }
    }
}

/// Raw contract settings as held by the parameter store.
///
/// Every field is optional; [`ContractParameters::from_settings`] decides
/// which absences are fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSettings {
    /// Display name used in overage descriptions.
    pub company_name: Option<String>,
    /// Contract shape.
    pub kind: Option<ContractKindCode>,
    /// Months per closure period.
    pub cycle_length_months: Option<u8>,
    /// Date the contract started.
    pub contract_start: Option<Date>,
    /// Monthly hours allotment.
    pub hours_baseline: Option<Minutes>,
    /// Monthly ticket allotment.
    pub tickets_baseline: Option<Tickets>,
    /// Whether positive balances may be carried across period closes.
    pub has_special_rollover: Option<bool>,
    /// Number of period closes before a carried balance is zeroed.
    pub cycles_until_zeroing: Option<u8>,
    /// Share of a positive monthly balance carried into the next month.
    pub monthly_rollover_percent: Option<Decimal>,
    /// Cycle index in effect when the bank chain starts.
    pub current_cycle_index: Option<u8>,
}

/// Validated contract parameters for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameters {
    /// The company these parameters belong to.
    pub company: CompanyId,
    /// Display name used in overage descriptions.
    pub company_name: String,
    /// Contract shape and baselines.
    pub kind: ContractKind,
    /// Months per closure period (1-12).
    pub cycle_length_months: u8,
    /// Date the contract started.
    pub contract_start: Date,
    /// Whether positive balances may be carried across period closes.
    pub has_special_rollover: bool,
    /// Monthly rollover percentage (0-100).
    pub monthly_rollover_percent: Decimal,
    /// Cycle counter in effect when the bank chain starts.
    pub cycle: CycleState,
}

impl ContractParameters {
    /// Builds validated parameters from raw settings.
    ///
    /// A missing baseline for a tracked kind is read as zero; callers that
    /// care should inspect the settings before converting.
    ///
    /// # Arguments
    ///
    /// * `company` - The company the settings belong to
    /// * `settings` - The raw stored settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The kind, cycle length or contract start is absent
    /// - The cycle length is outside 1..=12
    /// - The rollover percentage is outside 0..=100
    /// - The cycle counters are inconsistent
    pub fn from_settings(
        company: CompanyId,
        settings: &ContractSettings,
    ) -> Result<Self, DomainError> {
        let code: ContractKindCode = settings
            .kind
            .ok_or(DomainError::NotConfigured { field: "kind" })?;
        let cycle_length_months: u8 = settings
            .cycle_length_months
            .ok_or(DomainError::NotConfigured {
                field: "cycle_length_months",
            })?;
        let contract_start: Date = settings
            .contract_start
            .ok_or(DomainError::NotConfigured {
                field: "contract_start",
            })?;

        validate_cycle_length(cycle_length_months)?;

        let monthly_rollover_percent: Decimal =
            settings.monthly_rollover_percent.unwrap_or(Decimal::ZERO);
        validate_percent(monthly_rollover_percent)?;

        let cycle: CycleState = CycleState::new(
            settings.current_cycle_index.unwrap_or(1),
            settings.cycles_until_zeroing.unwrap_or(1),
        )?;

        let hours: Minutes = settings.hours_baseline.unwrap_or_default();
        let tickets: Tickets = settings.tickets_baseline.unwrap_or_default();
        let kind: ContractKind = match code {
            ContractKindCode::Hours => ContractKind::Hours { baseline: hours },
            ContractKindCode::Tickets => ContractKind::Tickets { baseline: tickets },
            ContractKindCode::Both => ContractKind::Both { hours, tickets },
        };

        Ok(Self {
            company,
            company_name: settings
                .company_name
                .clone()
                .unwrap_or_else(|| format!("Company {company}")),
            kind,
            cycle_length_months,
            contract_start,
            has_special_rollover: settings.has_special_rollover.unwrap_or(false),
            monthly_rollover_percent,
            cycle,
        })
    }
}

/// The special-rollover cycle counter.
///
/// This is explicit state: each month inherits it from the previous month's
/// calculation and it only moves through [`CycleState::advance`], once per
/// period close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleState {
    index: u8,
    cycles_until_zeroing: u8,
}

impl CycleState {
    /// Creates a cycle counter.
    ///
    /// # Errors
    ///
    /// Returns an error if `cycles_until_zeroing` is zero or `index` is
    /// outside `1..=cycles_until_zeroing`.
    pub const fn new(index: u8, cycles_until_zeroing: u8) -> Result<Self, DomainError> {
        if cycles_until_zeroing < 1 {
            return Err(DomainError::InvalidCyclesUntilZeroing {
                count: cycles_until_zeroing,
            });
        }
        if index < 1 || index > cycles_until_zeroing {
            return Err(DomainError::InvalidCycleIndex {
                index,
                cycles_until_zeroing,
            });
        }
        Ok(Self {
            index,
            cycles_until_zeroing,
        })
    }

    /// Returns the current cycle index.
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    /// Returns the number of closes before a carried balance is zeroed.
    #[must_use]
    pub const fn cycles_until_zeroing(&self) -> u8 {
        self.cycles_until_zeroing
    }

    /// Returns the counter for the period after a close.
    ///
    /// The index wraps back to 1 after the zeroing close.
    #[must_use]
    pub const fn advance(&self) -> Self {
        let index: u8 = if self.index >= self.cycles_until_zeroing {
            1
        } else {
            self.index + 1
        };
        Self {
            index,
            cycles_until_zeroing: self.cycles_until_zeroing,
        }
    }
}

/// Validates a cycle length in months.
///
/// # Errors
///
/// Returns an error if `months` is outside 1..=12.
pub const fn validate_cycle_length(months: u8) -> Result<(), DomainError> {
    if months < 1 || months > 12 {
        return Err(DomainError::InvalidCycleLength { months });
    }
    Ok(())
}

/// Validates a rollover percentage.
///
/// # Errors
///
/// Returns an error if `percent` is outside 0..=100.
pub fn validate_percent(percent: Decimal) -> Result<(), DomainError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(DomainError::InvalidRolloverPercent { percent });
    }
    Ok(())
}
