// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` persistence for the hour bank.
//!
//! [`SqliteStore`] implements every port the core depends on, so a single
//! store can be wired in with [`hourbank::Ports::from_store`]. It is built on
//! Diesel with embedded migrations.
//!
//! ## Storage Rules
//!
//! - Calculation versions and version records are append-only. The schema
//!   rejects updates and deletes on both tables.
//! - A calculation insert must carry the stored latest version plus one;
//!   anything else is reported as a conflict.
//! - Foreign keys tie every row to a contract and are verified at startup.
//!
//! ## Testing
//!
//! [`SqliteStore::new_in_memory`] gives each call its own shared-cache
//! in-memory database, so tests never see each other's rows.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod ports;
mod queries;

#[cfg(test)]
mod tests;

use diesel::SqliteConnection;
use hourbank_domain::{Allocation, BillingRate, CompanyId, ContractSettings, Period, Usage};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use data_models::{CHANNEL_BILLED, CHANNEL_CONSUMPTION};
pub use error::PersistenceError;

/// Sequence for unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A `SQLite` database holding contracts, usage, rates, calculations,
/// adjustments, version records and allocations.
///
/// The connection sits behind an async mutex; every operation holds it for
/// one short synchronous Diesel call.
pub struct SqliteStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteStore {
    /// Creates a store over a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:hourbank_mem_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates a store over a database file, creating it if needed.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not valid UTF-8 or the database cannot
    /// be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::Setup("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        info!(path = path_str, "SQLite store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs one synchronous database operation under the connection lock.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError> + Send,
    {
        let mut conn: MutexGuard<'_, SqliteConnection> = self.conn.lock().await;
        f(&mut conn).inspect_err(|err| {
            warn!(operation, error = %err, "SQLite operation failed");
        })
    }

    /// Creates or replaces a company's contract settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn put_contract(
        &self,
        company: CompanyId,
        settings: &ContractSettings,
    ) -> Result<(), PersistenceError> {
        self.with_conn("put contract", |conn| {
            mutations::put_contract(conn, company, settings)
        })
        .await
    }

    /// Creates or replaces the consumption reported for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the company has no contract.
    pub async fn put_usage(
        &self,
        company: CompanyId,
        period: Period,
        consumption: Usage,
    ) -> Result<(), PersistenceError> {
        self.with_conn("put usage", |conn| {
            mutations::put_usage(conn, company, period, CHANNEL_CONSUMPTION, consumption)
        })
        .await
    }

    /// Creates or replaces the requests billed separately for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the company has no contract.
    pub async fn put_billed(
        &self,
        company: CompanyId,
        period: Period,
        billed: Usage,
    ) -> Result<(), PersistenceError> {
        self.with_conn("put billed", |conn| {
            mutations::put_usage(conn, company, period, CHANNEL_BILLED, billed)
        })
        .await
    }

    /// Adds a billing rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the company has no contract.
    pub async fn put_rate(&self, rate: &BillingRate) -> Result<BillingRate, PersistenceError> {
        self.with_conn("put rate", |conn| mutations::put_rate(conn, rate))
            .await
    }

    /// Creates or updates an allocation, keyed by company and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the company has no contract.
    pub async fn put_allocation(
        &self,
        allocation: &Allocation,
    ) -> Result<Allocation, PersistenceError> {
        self.with_conn("put allocation", |conn| {
            mutations::put_allocation(conn, allocation)
        })
        .await
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}
