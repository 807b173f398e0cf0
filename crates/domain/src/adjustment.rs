// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::calculation::AdjustmentTotals;
use crate::contract::{CompanyId, ContractKind};
use crate::error::DomainError;
use crate::period::Period;
use crate::quantity::{Minutes, Quantity, QuantityKind, Tickets};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Minimum length of an adjustment note, after trimming.
pub const MIN_NOTE_LENGTH: usize = 10;

/// Whether an adjustment gives balance back or takes it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Credits the bank: reduces total consumption.
    Entry,
    /// Debits the bank: increases total consumption.
    Exit,
}

impl Direction {
    /// Returns the stable string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Exit => "Exit",
        }
    }

    /// Applies the direction's sign to a magnitude.
    #[must_use]
    pub fn signed<Q: Quantity>(self, magnitude: Q) -> Q {
        match self {
            Self::Entry => magnitude,
            Self::Exit => -magnitude,
        }
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Entry" | "entry" => Ok(Self::Entry),
            "Exit" | "exit" => Ok(Self::Exit),
            _ => Err(DomainError::InvalidAdjustmentAmount {
                reason: format!("unknown direction '{s}'"),
            }),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Magnitudes of a manual correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentAmount {
    /// Hours corrected, if any.
    pub hours: Option<Minutes>,
    /// Tickets corrected, if any.
    pub tickets: Option<Tickets>,
}

impl AdjustmentAmount {
    /// Validates the amount against the contract shape.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No non-zero magnitude is given
    /// - A magnitude is negative (the sign comes from the direction)
    /// - A magnitude targets a kind the contract does not track
    pub fn validate(&self, kind: &ContractKind) -> Result<(), DomainError> {
        let hours: Minutes = self.hours.unwrap_or_default();
        let tickets: Tickets = self.tickets.unwrap_or_default();

        if hours.is_negative() || tickets.is_negative() {
            return Err(DomainError::InvalidAdjustmentAmount {
                reason: String::from("magnitudes must not be negative; use the direction"),
            });
        }
        if hours == Minutes::zero() && tickets == Tickets::zero() {
            return Err(DomainError::InvalidAdjustmentAmount {
                reason: String::from("at least one non-zero magnitude is required"),
            });
        }
        if hours != Minutes::zero() && !kind.covers(QuantityKind::Hours) {
            return Err(DomainError::KindNotCovered {
                kind: QuantityKind::Hours,
            });
        }
        if tickets != Tickets::zero() && !kind.covers(QuantityKind::Tickets) {
            return Err(DomainError::KindNotCovered {
                kind: QuantityKind::Tickets,
            });
        }
        Ok(())
    }
}

/// Validates an adjustment note.
///
/// # Errors
///
/// Returns an error if the trimmed note is shorter than [`MIN_NOTE_LENGTH`].
pub fn validate_note(note: &str) -> Result<(), DomainError> {
    let length: usize = note.trim().chars().count();
    if length < MIN_NOTE_LENGTH {
        return Err(DomainError::NoteTooShort {
            length,
            minimum: MIN_NOTE_LENGTH,
        });
    }
    Ok(())
}

/// A manual correction to a month's consumption total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Store-assigned identifier. `None` until persisted.
    pub id: Option<i64>,
    /// The company.
    pub company: CompanyId,
    /// The month being corrected.
    pub period: Period,
    /// Corrected magnitudes.
    pub amount: AdjustmentAmount,
    /// Whether the correction credits or debits the bank.
    pub direction: Direction,
    /// Mandatory justification.
    pub note: String,
    /// False once soft-deactivated.
    pub active: bool,
    /// Who recorded the adjustment.
    pub author: String,
    /// When the adjustment was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Who deactivated the adjustment.
    pub deactivated_by: Option<String>,
    /// When the adjustment was deactivated.
    #[serde(with = "time::serde::rfc3339::option")]
    pub deactivated_at: Option<OffsetDateTime>,
}

impl Adjustment {
    /// Returns this adjustment's signed contribution to the month's total.
    #[must_use]
    pub fn contribution(&self) -> AdjustmentTotals {
        AdjustmentTotals {
            hours: self
                .direction
                .signed(self.amount.hours.unwrap_or_default()),
            tickets: self
                .direction
                .signed(self.amount.tickets.unwrap_or_default()),
        }
    }
}

/// Sums the signed contributions of the active adjustments.
#[must_use]
pub fn active_totals<'a, I>(adjustments: I) -> AdjustmentTotals
where
    I: IntoIterator<Item = &'a Adjustment>,
{
    adjustments
        .into_iter()
        .filter(|adjustment| adjustment.active)
        .map(Adjustment::contribution)
        .fold(AdjustmentTotals::default(), |acc, c| AdjustmentTotals {
            hours: acc.hours + c.hours,
            tickets: acc.tickets + c.tickets,
        })
}
