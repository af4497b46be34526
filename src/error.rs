//! Error taxonomy for the table access layer and the bridge in front of it.
//! Application glue (startup, UI) keeps using `anyhow`; everything that a
//! caller may want to match on lives here.

use std::io;

use rusqlite::ErrorCode;

/// Result alias used throughout the persistence layer.
pub type Result<T> = std::result::Result<T, AccessError>;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The table name is not one of the six known tables.
    #[error("unknown table \"{0}\"")]
    InvalidTable(String),

    /// A column in an insert/update mapping (or a key column) is not part of
    /// the table's schema.
    #[error("table \"{table}\" has no column \"{column}\"")]
    UnknownColumn { table: String, column: String },

    /// Insert or update without any column to write.
    #[error("no values supplied for table \"{table}\"")]
    EmptyValues { table: String },

    /// Single-row lookup found nothing.
    #[error("no row found with primary key \"{key}\" in table \"{table}\"")]
    NotFound { table: String, key: String },

    /// Arrays and objects have no SQLite representation.
    #[error("unsupported parameter value: {0}")]
    UnsupportedValue(String),

    /// Driver or engine failure, including constraint violations.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A record did not match the shape of its typed model.
    #[error("record decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The bridge worker has stopped; no connection is available.
    #[error("database bridge is closed")]
    BridgeClosed,
}

impl AccessError {
    /// True when the engine rejected a statement because of a constraint
    /// (duplicate key, NOT NULL, foreign key).
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            AccessError::Sqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(ErrorCode::ConstraintViolation)
            ),
            _ => false,
        }
    }

    /// True for a single-row lookup that matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound { .. })
    }
}
