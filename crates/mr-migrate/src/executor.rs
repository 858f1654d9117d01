//! Script execution
//!
//! Each pending script goes through `read -> split -> execute -> record`.
//! Every statement runs in its own transaction, so a failure partway through a
//! multi-statement script leaves the earlier statements committed. Nothing is
//! retried.

use crate::applied::VersionsTable;
use crate::error::{MigrateError, MigrateResult, StatementLocation};
use crate::task::MigrationTask;
use chrono::{DateTime, Utc};
use mr_db::Database;
use mr_sql::{split_statements, SqlStatement, StatementDelimiter};
use std::path::Path;
use std::time::{Duration, Instant};

/// Outcome of one successfully applied script
#[derive(Debug, Clone)]
pub struct ScriptReport {
    /// Script file name
    pub name: String,
    /// Non-empty statements executed
    pub statements: usize,
    /// Timestamp written to the bookkeeping table
    pub applied_at: DateTime<Utc>,
    /// Wall time spent on the script, recording included
    pub duration: Duration,
}

/// Applies scripts one at a time against a task's database.
pub struct ScriptExecutor<'a> {
    db: &'a dyn Database,
    scripts_dir: &'a Path,
    delimiter: &'a StatementDelimiter,
    versions: VersionsTable,
    create_versions_table: bool,
    table_ready: bool,
}

impl<'a> ScriptExecutor<'a> {
    pub fn new(task: &'a MigrationTask) -> Self {
        Self {
            db: task.db.as_ref(),
            scripts_dir: &task.scripts_dir,
            delimiter: &task.options.delimiter,
            versions: task.versions_table(),
            create_versions_table: task.options.create_versions_table,
            table_ready: false,
        }
    }

    /// Apply a single script and record it.
    ///
    /// A script that splits into no statements at all is still recorded.
    pub async fn apply(&mut self, script: &str) -> MigrateResult<ScriptReport> {
        let started = Instant::now();

        let content = self.read_script(script)?;
        let statements =
            split_statements(&content, self.delimiter).map_err(|source| {
                MigrateError::ScriptSplit {
                    script: script.to_string(),
                    source,
                }
            })?;

        if statements.is_empty() {
            log::debug!("Script {} contains no statements", script);
        }

        for (i, statement) in statements.iter().enumerate() {
            let at = StatementLocation {
                script: script.to_string(),
                index: i + 1,
                line: statement.line,
            };
            self.run_statement(at, statement).await?;
        }

        let applied_at = self.record(script).await?;

        Ok(ScriptReport {
            name: script.to_string(),
            statements: statements.len(),
            applied_at,
            duration: started.elapsed(),
        })
    }

    fn read_script(&self, script: &str) -> MigrateResult<String> {
        let path = self.scripts_dir.join(script);
        let read_error = |source: std::io::Error| MigrateError::ScriptRead {
            script: script.to_string(),
            path: path.display().to_string(),
            source,
        };

        let bytes = std::fs::read(&path).map_err(read_error)?;
        String::from_utf8(bytes)
            .map_err(|e| read_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Run one statement inside its own transaction.
    ///
    /// On a statement or commit failure the transaction is rolled back before
    /// the error is returned. A failed rollback wins over the original error.
    async fn run_statement(
        &self,
        at: StatementLocation,
        statement: &SqlStatement,
    ) -> MigrateResult<()> {
        log::debug!("Executing {}", at);

        let mut tx = match self.db.begin().await {
            Ok(tx) => tx,
            Err(source) => return Err(MigrateError::TransactionBegin { at, source }),
        };

        if let Err(exec_err) = tx.execute(&statement.sql).await {
            if let Err(source) = tx.rollback().await {
                return Err(MigrateError::Rollback {
                    at,
                    cause: format!("statement failure ({exec_err})"),
                    source,
                });
            }
            return Err(MigrateError::StatementExec {
                at,
                source: exec_err,
            });
        }

        if let Err(commit_err) = tx.commit().await {
            if let Err(source) = tx.rollback().await {
                return Err(MigrateError::Rollback {
                    at,
                    cause: format!("commit failure ({commit_err})"),
                    source,
                });
            }
            return Err(MigrateError::Commit {
                at,
                source: commit_err,
            });
        }

        Ok(())
    }

    async fn record(&mut self, script: &str) -> MigrateResult<DateTime<Utc>> {
        let record_error = |source| MigrateError::RecordInsert {
            script: script.to_string(),
            table: self.versions.to_string(),
            source,
        };

        if self.create_versions_table && !self.table_ready {
            self.versions.ensure(self.db).await.map_err(record_error)?;
            self.table_ready = true;
        }

        let applied_at = Utc::now();
        self.versions
            .record(self.db, script, applied_at)
            .await
            .map_err(record_error)?;
        Ok(applied_at)
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
