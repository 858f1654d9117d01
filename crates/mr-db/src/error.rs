//! Error types for mr-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// BEGIN / COMMIT / ROLLBACK failed (D003)
    #[error("[D003] Transaction control failed: {0}")]
    TransactionError(String),

    /// Operation on a transaction that was already committed or rolled back (D004)
    #[error("[D004] Transaction already finished")]
    NoTransaction,
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
