// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bank quantities.
//!
//! Hours are carried as whole minutes and tickets as two-decimal counts.
//! Every bank rule is written once against the [`Quantity`] trait so the
//! hours and tickets ledgers cannot drift apart in behaviour.

use crate::error::DomainError;
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// The two kinds of quantity a contract can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuantityKind {
    /// Hours, tracked as whole minutes.
    Hours,
    /// Tickets, tracked as a two-decimal count.
    Tickets,
}

impl QuantityKind {
    /// Returns the stable string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "Hours",
            Self::Tickets => "Tickets",
        }
    }

    /// Returns the unit word used in human-readable descriptions.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Tickets => "tickets",
        }
    }
}

impl std::fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuantityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hours" | "hours" => Ok(Self::Hours),
            "Tickets" | "tickets" => Ok(Self::Tickets),
            _ => Err(DomainError::InvalidQuantity(format!(
                "unknown quantity kind '{s}'"
            ))),
        }
    }
}

/// Arithmetic shared by every bank quantity.
pub trait Quantity:
    Copy
    + PartialEq
    + PartialOrd
    + Default
    + std::fmt::Debug
    + std::fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
{
    /// The kind this quantity represents.
    const KIND: QuantityKind;

    /// Returns the additive identity.
    #[must_use]
    fn zero() -> Self {
        Self::default()
    }

    /// Returns true if the value is strictly below zero.
    fn is_negative(self) -> bool;

    /// Returns the absolute value.
    #[must_use]
    fn abs(self) -> Self;

    /// Scales by `percent / 100`.
    ///
    /// Minutes floor to a whole minute; tickets round to two decimals.
    #[must_use]
    fn scale(self, percent: Decimal) -> Self;

    /// Reconciliation tolerance for `segments` independently scaled parts.
    fn tolerance(segments: usize) -> Self;

    /// Returns the value in billable units (hours or tickets).
    fn billable_units(self) -> Decimal;

    /// Returns true if `self` and `other` differ by no more than `tolerance`.
    fn within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }
}

/// A signed duration in whole minutes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Minutes(i64);

impl Minutes {
    /// Creates a duration from a minute count.
    #[must_use]
    pub const fn new(minutes: i64) -> Self {
        Self(minutes)
    }

    /// Creates a duration from hours and minutes.
    ///
    /// A negative `hours` value yields a negative duration of the full span.
    #[must_use]
    pub const fn hm(hours: i64, minutes: i64) -> Self {
        if hours < 0 {
            Self(hours * 60 - minutes)
        } else {
            Self(hours * 60 + minutes)
        }
    }

    /// Returns the minute count.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Minutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign: &str = if self.0 < 0 { "-" } else { "" };
        let total: u64 = self.0.unsigned_abs();
        write!(f, "{sign}{}:{:02}", total / 60, total % 60)
    }
}

impl FromStr for Minutes {
    type Err = DomainError;

    /// Parses `H:MM` or `-H:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        let (negative, body): (bool, &str) = trimmed
            .strip_prefix('-')
            .map_or((false, trimmed), |rest| (true, rest));

        let (hours, minutes): (&str, &str) = body
            .split_once(':')
            .ok_or_else(|| DomainError::InvalidQuantity(format!("expected H:MM, got '{s}'")))?;

        let hours: i64 = hours
            .parse()
            .map_err(|_| DomainError::InvalidQuantity(format!("invalid hours in '{s}'")))?;
        let minutes: i64 = minutes
            .parse()
            .map_err(|_| DomainError::InvalidQuantity(format!("invalid minutes in '{s}'")))?;

        if !(0..60).contains(&minutes) || hours < 0 {
            return Err(DomainError::InvalidQuantity(format!(
                "out of range duration '{s}'"
            )));
        }

        let total: i64 = hours * 60 + minutes;
        Ok(Self(if negative { -total } else { total }))
    }
}

impl Add for Minutes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Minutes {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Minutes {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Minutes {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Quantity for Minutes {
    const KIND: QuantityKind = QuantityKind::Hours;

    fn is_negative(self) -> bool {
        self.0 < 0
    }

    fn abs(self) -> Self {
        Self(self.0.abs())
    }

    fn scale(self, percent: Decimal) -> Self {
        let scaled: Decimal = (Decimal::from(self.0) * percent / Decimal::ONE_HUNDRED).floor();
        // The floor of a value no larger than |self| always fits.
        Self(scaled.to_i64().unwrap_or_default())
    }

    fn tolerance(segments: usize) -> Self {
        Self(i64::try_from(segments.max(1)).unwrap_or(i64::MAX))
    }

    fn billable_units(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(60)
    }
}

/// A signed ticket count kept at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tickets(Decimal);

impl Tickets {
    /// Creates a ticket count, rounding to two decimals.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        Self(round_two(value))
    }

    /// Creates a ticket count from a whole number.
    #[must_use]
    pub fn from_count(count: i64) -> Self {
        Self(Decimal::from(count))
    }

    /// Returns the decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Tickets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Tickets {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self::new)
            .map_err(|e| DomainError::InvalidQuantity(format!("invalid ticket count '{s}': {e}")))
    }
}

impl Add for Tickets {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Tickets {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Tickets {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Tickets {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Quantity for Tickets {
    const KIND: QuantityKind = QuantityKind::Tickets;

    fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    fn abs(self) -> Self {
        Self(self.0.abs())
    }

    fn scale(self, percent: Decimal) -> Self {
        Self(round_two(self.0 * percent / Decimal::ONE_HUNDRED))
    }

    fn tolerance(segments: usize) -> Self {
        let count: i64 = i64::try_from(segments.max(1)).unwrap_or(i64::MAX);
        Self(Decimal::new(count, 2))
    }

    fn billable_units(self) -> Decimal {
        self.0
    }
}

/// Rounds to two decimals, midpoint away from zero.
#[must_use]
pub fn round_two(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a monetary value with thousands separators and two decimals.
///
/// `1234.5` becomes `1,234.50`.
#[must_use]
pub fn format_money(value: Decimal) -> String {
    let rounded: Decimal = round_two(value);
    let negative: bool = rounded < Decimal::ZERO;
    let text: String = format!("{:.2}", rounded.abs());
    let (whole, fraction): (&str, &str) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped: String = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign: &str = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
