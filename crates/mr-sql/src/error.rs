//! Error types for mr-sql

use thiserror::Error;

/// SQL splitting errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// Script could not be tokenized (S001)
    #[error("[S001] SQL tokenize error at line {line}, column {column}: {message}")]
    Tokenize {
        message: String,
        line: usize,
        column: usize,
    },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
