// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_domain::{Adjustment, CompanyId, Period};

use crate::data_models::{AdjustmentRow, period_key};
use crate::diesel_schema::adjustments;
use crate::error::PersistenceError;

/// Retrieves one adjustment by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row is unreadable.
pub fn get_adjustment(
    conn: &mut SqliteConnection,
    adjustment_id: i64,
) -> Result<Option<Adjustment>, PersistenceError> {
    let row: Option<AdjustmentRow> = adjustments::table
        .find(adjustment_id)
        .select(AdjustmentRow::as_select())
        .first(conn)
        .optional()?;

    row.map(AdjustmentRow::into_adjustment).transpose()
}

/// Retrieves every adjustment of a month in creation order.
///
/// # Errors
///
/// Returns an error if the query fails or a row is unreadable.
pub fn list_adjustments(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
) -> Result<Vec<Adjustment>, PersistenceError> {
    let rows: Vec<AdjustmentRow> = adjustments::table
        .filter(adjustments::company_id.eq(company.value()))
        .filter(adjustments::period.eq(period_key(period)))
        .order(adjustments::adjustment_id.asc())
        .select(AdjustmentRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AdjustmentRow::into_adjustment).collect()
}
