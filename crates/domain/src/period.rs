// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

/// A calendar month.
///
/// Field order matters: the derived ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u8,
}

impl Period {
    /// Creates a period.
    ///
    /// # Arguments
    ///
    /// * `year` - The calendar year
    /// * `month` - The month (1-12)
    ///
    /// # Errors
    ///
    /// Returns an error if the month is outside 1..=12.
    pub const fn new(year: i32, month: u8) -> Result<Self, DomainError> {
        if month < 1 || month > 12 {
            return Err(DomainError::InvalidMonth { month });
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing `date`.
    #[must_use]
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// Returns the calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month (1-12).
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Returns the following calendar month.
    #[must_use]
    pub const fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Returns the preceding calendar month.
    #[must_use]
    pub const fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Counts contract months elapsed up to and including this period.
    ///
    /// The month containing `contract_start` counts as 1. Periods before the
    /// contract start yield zero or a negative count.
    #[must_use]
    pub fn months_elapsed(&self, contract_start: Date) -> i64 {
        elapsed_months(self.year, self.month, contract_start)
    }
}

/// `(year - startYear) * 12 + (month - startMonth) + 1`.
pub(crate) fn elapsed_months(year: i32, month: u8, contract_start: Date) -> i64 {
    let years: i64 = i64::from(year) - i64::from(contract_start.year());
    let months: i64 = i64::from(month) - i64::from(u8::from(contract_start.month()));
    years * 12 + months + 1
}

impl std::fmt::Display for Period {
    /// Formats as `MM/YYYY`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for Period {
    type Err = DomainError;

    /// Parses `YYYY-MM` or `MM/YYYY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        let (year, month): (&str, &str) = if let Some((y, m)) = trimmed.split_once('-') {
            (y, m)
        } else if let Some((m, y)) = trimmed.split_once('/') {
            (y, m)
        } else {
            return Err(DomainError::InvalidPeriod(format!(
                "expected YYYY-MM or MM/YYYY, got '{s}'"
            )));
        };

        let year: i32 = year
            .parse()
            .map_err(|_| DomainError::InvalidPeriod(format!("invalid year in '{s}'")))?;
        let month: u8 = month
            .parse()
            .map_err(|_| DomainError::InvalidPeriod(format!("invalid month in '{s}'")))?;

        Self::new(year, month)
    }
}
