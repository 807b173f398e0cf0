// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;
use hourbank::PortError;

/// Failures of the `SQLite` store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// `SQLite` rejected a statement, e.g. a foreign key or trigger abort.
    Sqlite(String),
    /// The database could not be opened.
    ConnectionFailed(String),
    /// The embedded schema migrations did not apply.
    MigrationFailed(String),
    /// A query returned something other than what the schema promises.
    QueryFailed(String),
    /// A stored row holds a value the domain does not accept.
    InvalidRow(String),
    /// A value could not be encoded for its column.
    Encoding(String),
    /// The store could not be set up.
    Setup(String),
    /// `PRAGMA foreign_keys` is off for the connection.
    ForeignKeysDisabled,
    /// A calculation version was already taken or skipped, or an adjustment
    /// was already inactive.
    VersionConflict(String),
    /// No row with the requested key.
    NotFound(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(msg) => write!(f, "SQLite error: {msg}"),
            Self::ConnectionFailed(msg) => write!(f, "Cannot open database: {msg}"),
            Self::MigrationFailed(msg) => write!(f, "Schema migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Unexpected query result: {msg}"),
            Self::InvalidRow(msg) => write!(f, "Invalid stored row: {msg}"),
            Self::Encoding(msg) => write!(f, "Column encoding error: {msg}"),
            Self::Setup(msg) => write!(f, "Store setup failed: {msg}"),
            Self::ForeignKeysDisabled => write!(f, "SQLite foreign keys are disabled"),
            Self::VersionConflict(msg) => write!(f, "Version conflict: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound(String::from("no matching row")),
            // Only the calculation version key is unique among the written tables
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::VersionConflict(info.message().to_string())
            }
            other => Self::Sqlite(other.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<PersistenceError> for PortError {
    fn from(err: PersistenceError) -> Self {
        let message: String = err.to_string();
        match err {
            PersistenceError::ConnectionFailed(_) => Self::unavailable(message),
            PersistenceError::VersionConflict(_) => Self::conflict(message),
            PersistenceError::NotFound(_) => Self::not_found(message),
            PersistenceError::Sqlite(_)
            | PersistenceError::MigrationFailed(_)
            | PersistenceError::QueryFailed(_)
            | PersistenceError::InvalidRow(_)
            | PersistenceError::Encoding(_)
            | PersistenceError::Setup(_)
            | PersistenceError::ForeignKeysDisabled => Self::rejected(message),
        }
    }
}
