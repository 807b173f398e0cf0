// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_domain::{Adjustment, Minutes};
use time::OffsetDateTime;
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{period_key, tickets_text, timestamp_text};
use crate::diesel_schema::adjustments;
use crate::error::PersistenceError;
use crate::queries::get_adjustment;

/// Inserts an adjustment and returns it with its generated id.
///
/// # Errors
///
/// Returns an error if the insert fails, including when the company has no
/// contract.
pub fn insert_adjustment(
    conn: &mut SqliteConnection,
    adjustment: &Adjustment,
) -> Result<Adjustment, PersistenceError> {
    let created_at: String = timestamp_text(adjustment.created_at)?;

    diesel::insert_into(adjustments::table)
        .values((
            adjustments::company_id.eq(adjustment.company.value()),
            adjustments::period.eq(period_key(adjustment.period)),
            adjustments::hours_minutes.eq(adjustment.amount.hours.map(Minutes::value)),
            adjustments::tickets.eq(adjustment.amount.tickets.map(tickets_text)),
            adjustments::direction.eq(adjustment.direction.as_str()),
            adjustments::note.eq(&adjustment.note),
            adjustments::is_active.eq(i32::from(adjustment.active)),
            adjustments::author.eq(&adjustment.author),
            adjustments::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let adjustment_id: i64 = get_last_insert_rowid(conn)?;
    debug!(adjustment_id, company = %adjustment.company, "Inserted adjustment");

    Ok(Adjustment {
        id: Some(adjustment_id),
        ..adjustment.clone()
    })
}

/// Marks an active adjustment inactive and returns its new state.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `adjustment_id` - The adjustment to deactivate
/// * `deactivated_by` - Who deactivates it
/// * `deactivated_at` - When
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if the adjustment does not exist
/// and [`PersistenceError::VersionConflict`] if it is already inactive.
pub fn deactivate_adjustment(
    conn: &mut SqliteConnection,
    adjustment_id: i64,
    deactivated_by: &str,
    deactivated_at: OffsetDateTime,
) -> Result<Adjustment, PersistenceError> {
    let deactivated_at: String = timestamp_text(deactivated_at)?;

    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let updated: usize = diesel::update(
            adjustments::table
                .filter(adjustments::adjustment_id.eq(adjustment_id))
                .filter(adjustments::is_active.eq(1)),
        )
        .set((
            adjustments::is_active.eq(0),
            adjustments::deactivated_by.eq(deactivated_by),
            adjustments::deactivated_at.eq(&deactivated_at),
        ))
        .execute(conn)?;

        let current: Adjustment = get_adjustment(conn, adjustment_id)?.ok_or_else(|| {
            PersistenceError::NotFound(format!("adjustment {adjustment_id}"))
        })?;
        if updated == 0 {
            return Err(PersistenceError::VersionConflict(format!(
                "adjustment {adjustment_id} is already inactive"
            )));
        }

        debug!(adjustment_id, deactivated_by, "Deactivated adjustment");
        Ok(current)
    })
}
