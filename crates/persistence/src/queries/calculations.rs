// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use hourbank_domain::{CompanyId, MonthlyCalculation, Period};

use crate::data_models::{CalculationRow, period_key};
use crate::diesel_schema::calculations;
use crate::error::PersistenceError;

/// Retrieves the highest stored version of a month.
///
/// # Errors
///
/// Returns an error if the query fails or the row is unreadable.
pub fn latest_calculation(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
) -> Result<Option<MonthlyCalculation>, PersistenceError> {
    let row: Option<CalculationRow> = calculations::table
        .filter(calculations::company_id.eq(company.value()))
        .filter(calculations::period.eq(period_key(period)))
        .order(calculations::version.desc())
        .select(CalculationRow::as_select())
        .first(conn)
        .optional()?;

    row.map(CalculationRow::into_calculation).transpose()
}

/// Retrieves one version of a month.
///
/// # Errors
///
/// Returns an error if the query fails or the row is unreadable.
pub fn get_calculation_version(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
    version: i32,
) -> Result<Option<MonthlyCalculation>, PersistenceError> {
    let row: Option<CalculationRow> = calculations::table
        .filter(calculations::company_id.eq(company.value()))
        .filter(calculations::period.eq(period_key(period)))
        .filter(calculations::version.eq(version))
        .select(CalculationRow::as_select())
        .first(conn)
        .optional()?;

    row.map(CalculationRow::into_calculation).transpose()
}

/// Returns the highest version number stored for a month, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn latest_version_number(
    conn: &mut SqliteConnection,
    company: CompanyId,
    period: Period,
) -> Result<Option<i32>, PersistenceError> {
    Ok(calculations::table
        .filter(calculations::company_id.eq(company.value()))
        .filter(calculations::period.eq(period_key(period)))
        .select(diesel::dsl::max(calculations::version))
        .first(conn)?)
}
