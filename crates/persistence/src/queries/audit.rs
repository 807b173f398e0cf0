// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_audit::VersionRecord;
use hourbank_domain::{CompanyId, Period};

use crate::data_models::{VersionRecordRow, period_key};
use crate::diesel_schema::version_records;
use crate::error::PersistenceError;

/// Retrieves a month's version records, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored snapshot is unreadable.
pub fn list_version_records(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
) -> Result<Vec<VersionRecord>, PersistenceError> {
    let rows: Vec<VersionRecordRow> = version_records::table
        .filter(version_records::company_id.eq(company.value()))
        .filter(version_records::period.eq(period_key(period)))
        .order((
            version_records::to_version.desc(),
            version_records::record_id.desc(),
        ))
        .select(VersionRecordRow::as_select())
        .load(conn)?;

    rows.into_iter().map(VersionRecordRow::into_record).collect()
}
