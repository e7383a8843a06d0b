use annonces_shared::ValidationError;
use rusqlite::ffi;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The engine could not run the statement (I/O, locking, corruption...).
    /// Never retried here.
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or out-of-range field, one reason per violated rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced listing or account does not exist.
    #[error("Record not found")]
    NotFound,

    /// Uniqueness violation, e.g. an email already registered.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A structured value could not be encoded for storage.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// `QueryReturnedNoRows` becomes [`StoreError::NotFound`].
pub(crate) fn not_found_or_unavailable(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Unavailable(other),
    }
}

pub(crate) fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
