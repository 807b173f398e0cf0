// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod snapshot;

use hourbank_domain::{CompanyId, DomainError, Period};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

pub use snapshot::{FieldChange, Snapshot, SnapshotDiff, diff};

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// This could be an analyst, the scheduler, or a recompute triggered by
/// another change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "user", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// Creates a user actor.
    #[must_use]
    pub fn user(id: &str) -> Self {
        Self::new(id.to_string(), String::from("user"))
    }

    /// The actor used for scheduled and automatic computations.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from("system"), String::from("system"))
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.actor_type)
    }
}

/// Why a new calculation version was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The month's own recompute after an adjustment was created or
    /// deactivated.
    Adjustment,
    /// A computation, including later months of a cascade.
    Recompute,
    /// A manual recompute requested to correct a month.
    Correction,
}

impl ChangeKind {
    /// Returns the stable string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Adjustment => "Adjustment",
            Self::Recompute => "Recompute",
            Self::Correction => "Correction",
        }
    }
}

impl FromStr for ChangeKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Adjustment" => Ok(Self::Adjustment),
            "Recompute" => Ok(Self::Recompute),
            "Correction" => Ok(Self::Correction),
            _ => Err(DomainError::InvalidQuantity(format!(
                "unknown change kind '{s}'"
            ))),
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of one calculation version transition.
///
/// Records are write-once and form the audit trail of a company's month:
/// - Who caused the transition (author)
/// - Why it happened (reason, change kind)
/// - The calculation before and after
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Store-assigned identifier. `None` until appended.
    pub id: Option<i64>,
    /// The calculation version this record produced.
    pub calculation_id: i64,
    /// The company.
    pub company: CompanyId,
    /// The month.
    pub period: Period,
    /// Previous version, or 0 for the first computation.
    pub from_version: u32,
    /// The version written.
    pub to_version: u32,
    /// Snapshot of the previous version (empty for the first computation).
    pub before: Snapshot,
    /// Snapshot of the new version.
    pub after: Snapshot,
    /// Free-text reason (the adjustment note for adjustment records).
    pub reason: String,
    /// What triggered the transition.
    pub change_kind: ChangeKind,
    /// Who triggered the transition.
    pub author: Actor,
    /// When the record was written.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl VersionRecord {
    /// Returns the field differences this transition introduced.
    #[must_use]
    pub fn diff(&self) -> SnapshotDiff {
        diff(&self.before, &self.after)
    }
}
