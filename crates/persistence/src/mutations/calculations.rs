// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_audit::VersionRecord;
use hourbank_domain::MonthlyCalculation;
use num_traits::ToPrimitive;
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{period_key, timestamp_text};
use crate::diesel_schema::calculations;
use crate::error::PersistenceError;
use crate::mutations::audit::append_version_record;
use crate::queries::latest_version_number;

/// Inserts a new calculation version and the version record describing it.
///
/// The version check, the calculation insert and the record append run in
/// one immediate transaction. Two writers cannot both claim the same version,
/// and a failed append rolls the calculation back.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `calculation` - The version to store; its `id` is ignored
/// * `record` - The transition record; its `id` and `calculation_id` are
///   replaced by the generated ones
///
/// # Errors
///
/// Returns [`PersistenceError::VersionConflict`] unless `calculation.version`
/// is exactly one above the stored latest (or 1 for a new month). Returns an
/// error if serialization or either insert fails.
pub fn insert_versioned_calculation(
    conn: &mut SqliteConnection,
    calculation: &MonthlyCalculation,
    record: &VersionRecord,
) -> Result<(MonthlyCalculation, VersionRecord), PersistenceError> {
    let version: i32 = calculation.version.to_i32().ok_or_else(|| {
        PersistenceError::Encoding(format!(
            "version {} is out of range",
            calculation.version
        ))
    })?;
    let hours_json: Option<String> = calculation
        .hours
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let tickets_json: Option<String> = calculation
        .tickets
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let warnings_json: String = serde_json::to_string(&calculation.warnings)?;
    let computed_at: String = timestamp_text(calculation.computed_at)?;
    let period: String = period_key(calculation.period);

    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let latest: i32 =
            latest_version_number(conn, calculation.company, calculation.period)?.unwrap_or(0);
        if version != latest + 1 {
            return Err(PersistenceError::VersionConflict(format!(
                "version {version} of {} for company {} does not follow stored version {latest}",
                calculation.period, calculation.company
            )));
        }

        diesel::insert_into(calculations::table)
            .values((
                calculations::company_id.eq(calculation.company.value()),
                calculations::period.eq(&period),
                calculations::version.eq(version),
                calculations::is_period_end.eq(i32::from(calculation.is_period_end)),
                calculations::cycle_index.eq(i32::from(calculation.cycle.index())),
                calculations::next_cycle_index.eq(i32::from(calculation.next_cycle.index())),
                calculations::cycles_until_zeroing
                    .eq(i32::from(calculation.cycle.cycles_until_zeroing())),
                calculations::hours_ledger_json.eq(&hours_json),
                calculations::tickets_ledger_json.eq(&tickets_json),
                calculations::amount_to_bill.eq(calculation.amount_to_bill.to_string()),
                calculations::overage_note.eq(&calculation.overage_note),
                calculations::warnings_json.eq(&warnings_json),
                calculations::computed_by.eq(&calculation.computed_by),
                calculations::computed_at.eq(&computed_at),
            ))
            .execute(conn)?;

        let calculation_id: i64 = get_last_insert_rowid(conn)?;
        debug!(
            calculation_id,
            company = %calculation.company,
            period = %calculation.period,
            version,
            "Inserted calculation version"
        );

        let recorded: VersionRecord = append_version_record(
            conn,
            &VersionRecord {
                calculation_id,
                ..record.clone()
            },
        )?;

        Ok((
            MonthlyCalculation {
                id: Some(calculation_id),
                ..calculation.clone()
            },
            recorded,
        ))
    })
}
