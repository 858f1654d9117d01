//! Error types for mr-migrate

use mr_core::CoreError;
use mr_db::DbError;
use mr_sql::SqlError;
use std::fmt;
use thiserror::Error;

/// Where in a run a statement-level failure happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementLocation {
    /// Script file name
    pub script: String,
    /// 1-based index among the script's non-empty statements
    pub index: usize,
    /// 1-based line in the script where the statement starts
    pub line: usize,
}

impl fmt::Display for StatementLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "script '{}' statement {} (line {})",
            self.script, self.index, self.line
        )
    }
}

/// Migration run errors. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Task configuration is unusable; nothing was touched (MG001)
    #[error("[MG001] Invalid migration task: {message}")]
    Config { message: String },

    /// Scripts directory could not be listed (MG002)
    #[error("[MG002] Failed to read scripts directory '{path}': {source}")]
    DirectoryRead {
        path: String,
        source: std::io::Error,
    },

    /// Script file could not be read (MG003)
    #[error("[MG003] Failed to read script '{script}' at '{path}': {source}")]
    ScriptRead {
        script: String,
        path: String,
        source: std::io::Error,
    },

    /// Script could not be split into statements (MG004)
    #[error("[MG004] Failed to split script '{script}' into statements: {source}")]
    ScriptSplit { script: String, source: SqlError },

    /// Existence check or select on the bookkeeping table failed (MG005)
    #[error("[MG005] Failed to {action}: {source}")]
    Query { action: String, source: DbError },

    /// BEGIN failed (MG006)
    #[error("[MG006] Failed to begin transaction for {at}: {source}")]
    TransactionBegin {
        at: StatementLocation,
        source: DbError,
    },

    /// Statement failed and its transaction was rolled back (MG007)
    #[error("[MG007] Failed to execute {at}: {source}")]
    StatementExec {
        at: StatementLocation,
        source: DbError,
    },

    /// COMMIT failed and the transaction was rolled back (MG008)
    #[error("[MG008] Failed to commit {at}: {source}")]
    Commit {
        at: StatementLocation,
        source: DbError,
    },

    /// ROLLBACK failed after a statement or commit failure (MG009)
    #[error(
        "[MG009] Rollback failed for {at} after {cause}; database state is indeterminate: {source}"
    )]
    Rollback {
        at: StatementLocation,
        cause: String,
        source: DbError,
    },

    /// Script effects are committed but not recorded as applied (MG010)
    #[error(
        "[MG010] Script '{script}' was applied but could not be recorded in {table}; \
         a later run will apply it again unless it is recorded manually: {source}"
    )]
    RecordInsert {
        script: String,
        table: String,
        source: DbError,
    },
}

impl MigrateError {
    /// Script the error refers to, if any
    pub fn script(&self) -> Option<&str> {
        match self {
            MigrateError::ScriptRead { script, .. }
            | MigrateError::ScriptSplit { script, .. }
            | MigrateError::RecordInsert { script, .. } => Some(script),
            MigrateError::TransactionBegin { at, .. }
            | MigrateError::StatementExec { at, .. }
            | MigrateError::Commit { at, .. }
            | MigrateError::Rollback { at, .. } => Some(&at.script),
            MigrateError::Config { .. }
            | MigrateError::DirectoryRead { .. }
            | MigrateError::Query { .. } => None,
        }
    }

    /// Statement location for statement-level failures
    pub fn location(&self) -> Option<&StatementLocation> {
        match self {
            MigrateError::TransactionBegin { at, .. }
            | MigrateError::StatementExec { at, .. }
            | MigrateError::Commit { at, .. }
            | MigrateError::Rollback { at, .. } => Some(at),
            _ => None,
        }
    }

    /// True when the database may hold changes the bookkeeping table does not
    /// reflect, or whose transaction outcome is unknown.
    pub fn needs_operator(&self) -> bool {
        matches!(
            self,
            MigrateError::RecordInsert { .. } | MigrateError::Rollback { .. }
        )
    }
}

impl From<CoreError> for MigrateError {
    fn from(err: CoreError) -> Self {
        MigrateError::Config {
            message: err.to_string(),
        }
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
