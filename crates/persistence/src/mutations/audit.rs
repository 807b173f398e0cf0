// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_audit::VersionRecord;
use num_traits::ToPrimitive;
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{period_key, timestamp_text};
use crate::diesel_schema::version_records;
use crate::error::PersistenceError;

fn version_column(what: &str, version: u32) -> Result<i32, PersistenceError> {
    version.to_i32().ok_or_else(|| {
        PersistenceError::Encoding(format!("{what} {version} is out of range"))
    })
}

/// Appends a version record and returns it with its generated id.
///
/// Snapshots and the actor are stored as JSON. Callers run this inside the
/// transaction that inserted the referenced calculation.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails, including when
/// the referenced calculation does not exist.
pub fn append_version_record(
    conn: &mut SqliteConnection,
    record: &VersionRecord,
) -> Result<VersionRecord, PersistenceError> {
    let before_json: String = serde_json::to_string(&record.before)?;
    let after_json: String = serde_json::to_string(&record.after)?;
    let actor_json: String = serde_json::to_string(&record.author)?;
    let created_at: String = timestamp_text(record.created_at)?;

    diesel::insert_into(version_records::table)
        .values((
            version_records::calculation_id.eq(record.calculation_id),
            version_records::company_id.eq(record.company.value()),
            version_records::period.eq(period_key(record.period)),
            version_records::from_version.eq(version_column("from_version", record.from_version)?),
            version_records::to_version.eq(version_column("to_version", record.to_version)?),
            version_records::before_snapshot_json.eq(&before_json),
            version_records::after_snapshot_json.eq(&after_json),
            version_records::reason.eq(&record.reason),
            version_records::change_kind.eq(record.change_kind.as_str()),
            version_records::actor_json.eq(&actor_json),
            version_records::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let record_id: i64 = get_last_insert_rowid(conn)?;
    debug!(
        record_id,
        calculation_id = record.calculation_id,
        kind = %record.change_kind,
        "Appended version record"
    );

    Ok(VersionRecord {
        id: Some(record_id),
        ..record.clone()
    })
}
