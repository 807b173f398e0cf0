// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::{CoreError, ErrorContext, WithContext};
use crate::ports::{CalculationStore, VersionStore};
use hourbank_audit::{Actor, ChangeKind, Snapshot, SnapshotDiff, VersionRecord, diff};
use hourbank_domain::{CompanyId, MonthlyCalculation, Period};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

/// Who is writing a new calculation version, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeContext {
    /// The actor responsible for the change.
    pub author: Actor,
    /// Free-text reason recorded on the version record.
    pub reason: String,
    /// What triggered the change.
    pub kind: ChangeKind,
}

impl ChangeContext {
    /// A routine or cascaded computation.
    #[must_use]
    pub fn recompute(author: Actor, reason: impl Into<String>) -> Self {
        Self {
            author,
            reason: reason.into(),
            kind: ChangeKind::Recompute,
        }
    }

    /// A manual correction.
    #[must_use]
    pub fn correction(author: Actor, reason: impl Into<String>) -> Self {
        Self {
            author,
            reason: reason.into(),
            kind: ChangeKind::Correction,
        }
    }

    /// The recompute of the month an adjustment was made in.
    #[must_use]
    pub fn adjustment(author: Actor, note: impl Into<String>) -> Self {
        Self {
            author,
            reason: note.into(),
            kind: ChangeKind::Adjustment,
        }
    }
}

/// The append-only audit trail of calculation versions.
#[derive(Clone)]
pub struct VersionLedger {
    versions: Arc<dyn VersionStore>,
    calculations: Arc<dyn CalculationStore>,
}

impl VersionLedger {
    /// Creates a ledger over the version and calculation stores.
    #[must_use]
    pub fn new(versions: Arc<dyn VersionStore>, calculations: Arc<dyn CalculationStore>) -> Self {
        Self {
            versions,
            calculations,
        }
    }

    /// Stores `calculation` together with the record of its transition from
    /// `previous`, in one atomic write.
    ///
    /// # Arguments
    ///
    /// * `previous` - The version being superseded, if any
    /// * `calculation` - The new version, not yet stored
    /// * `change` - Who made the change and why
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot cannot be captured or the store
    /// rejects the write. Nothing is stored in that case.
    pub async fn commit(
        &self,
        previous: Option<&MonthlyCalculation>,
        calculation: &MonthlyCalculation,
        change: &ChangeContext,
    ) -> Result<(MonthlyCalculation, VersionRecord), CoreError> {
        let context = || {
            ErrorContext::new("record version")
                .company(calculation.company)
                .period(calculation.period)
        };

        let before: Snapshot = previous
            .map(capture)
            .transpose()
            .map_err(|err| snapshot_error(context(), &err))?
            .unwrap_or_default();
        let after: Snapshot =
            capture(calculation).map_err(|err| snapshot_error(context(), &err))?;

        let record: VersionRecord = VersionRecord {
            id: None,
            // Assigned by the store once the calculation row exists
            calculation_id: 0,
            company: calculation.company,
            period: calculation.period,
            from_version: previous.map_or(0, |p| p.version),
            to_version: calculation.version,
            before,
            after,
            reason: change.reason.clone(),
            change_kind: change.kind,
            author: change.author.clone(),
            created_at: OffsetDateTime::now_utc(),
        };

        let (stored, recorded): (MonthlyCalculation, VersionRecord) = self
            .calculations
            .insert_versioned(calculation, &record)
            .await
            .within(context)?;
        debug!(
            company = %stored.company,
            period = %stored.period,
            from = recorded.from_version,
            to = recorded.to_version,
            kind = %recorded.change_kind,
            "Recorded version"
        );
        Ok((stored, recorded))
    }

    /// Returns a month's version records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the version store fails.
    pub async fn history(
        &self,
        company: CompanyId,
        period: Period,
    ) -> Result<Vec<VersionRecord>, CoreError> {
        let mut records: Vec<VersionRecord> = self
            .versions
            .history(company, period)
            .await
            .within(|| ErrorContext::new("history").company(company).period(period))?;
        records.sort_by(|a, b| b.to_version.cmp(&a.to_version).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    /// Compares two snapshots.
    #[must_use]
    pub fn diff(before: &Snapshot, after: &Snapshot) -> SnapshotDiff {
        diff(before, after)
    }

    /// Loads two versions of a month and compares them.
    ///
    /// # Errors
    ///
    /// Returns an error if either version does not exist or the store fails.
    pub async fn diff_versions(
        &self,
        company: CompanyId,
        period: Period,
        from: u32,
        to: u32,
    ) -> Result<SnapshotDiff, CoreError> {
        let context = || ErrorContext::new("diff versions").company(company).period(period);

        let mut snapshots: Vec<Snapshot> = Vec::with_capacity(2);
        for version in [from, to] {
            let calculation: MonthlyCalculation = self
                .calculations
                .get_version(company, period, version)
                .await
                .within(context)?
                .ok_or_else(|| CoreError::NotFound {
                    context: context(),
                    resource: format!("calculation version {version}"),
                })?;
            snapshots.push(capture(&calculation).map_err(|err| snapshot_error(context(), &err))?);
        }

        match snapshots.as_slice() {
            [before, after] => Ok(diff(before, after)),
            _ => Ok(SnapshotDiff::default()),
        }
    }
}

/// Snapshots a calculation without its store identifier, so that diffs
/// only report calculated fields.
fn capture(calculation: &MonthlyCalculation) -> Result<Snapshot, serde_json::Error> {
    Snapshot::capture(&MonthlyCalculation {
        id: None,
        ..calculation.clone()
    })
}

fn snapshot_error(context: ErrorContext, err: &serde_json::Error) -> CoreError {
    CoreError::Integration {
        context,
        message: format!("failed to capture snapshot: {err}"),
        retryable: false,
    }
}

impl std::fmt::Debug for VersionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionLedger").finish_non_exhaustive()
    }
}
