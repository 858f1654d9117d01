//! Shared test utilities for mr-migrate

use crate::task::MigrationTask;
use async_trait::async_trait;
use mr_db::{Database, DbError, DbResult, DuckDbBackend, Transaction};
use std::path::Path;
use std::sync::Arc;

/// Catalog name of an in-memory DuckDB database
pub(crate) const MEMORY_DB: &str = "memory";

/// Failures a [`FaultyDb`] injects
#[derive(Debug, Clone, Default)]
pub(crate) struct Faults {
    pub(crate) exists_check: bool,
    pub(crate) begin: bool,
    pub(crate) commit: bool,
    pub(crate) rollback: bool,
    pub(crate) record: bool,
}

/// In-memory DuckDB wrapper that fails selected operations on demand.
///
/// DuckDB cannot be made to fail a COMMIT or ROLLBACK at will, so those paths
/// are exercised through this wrapper.
pub(crate) struct FaultyDb {
    inner: DuckDbBackend,
    faults: Faults,
}

impl FaultyDb {
    pub(crate) fn new(faults: Faults) -> Self {
        Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            faults,
        }
    }
}

fn injected(what: &str) -> DbError {
    DbError::TransactionError(format!("injected {what} failure"))
}

#[async_trait]
impl Database for FaultyDb {
    async fn query_strings(&self, sql: &str, params: &[&str]) -> DbResult<Vec<String>> {
        self.inner.query_strings(sql, params).await
    }

    async fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<i64> {
        if self.faults.exists_check && sql.contains("information_schema.tables") {
            return Err(DbError::ConnectionError("injected connection failure".to_string()));
        }
        self.inner.query_count(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        if self.faults.record && sql.trim_start().starts_with("INSERT") {
            return Err(DbError::ExecutionError("injected insert failure".to_string()));
        }
        self.inner.execute(sql, params).await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.inner.execute_batch(sql).await
    }

    async fn begin<'a>(&'a self) -> DbResult<Box<dyn Transaction + 'a>> {
        if self.faults.begin {
            return Err(injected("BEGIN"));
        }
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            faults: &self.faults,
        }))
    }

    async fn current_database(&self) -> DbResult<String> {
        self.inner.current_database().await
    }

    fn db_type(&self) -> &'static str {
        "faulty-duckdb"
    }
}

struct FaultyTransaction<'a> {
    inner: Box<dyn Transaction + 'a>,
    faults: &'a Faults,
}

#[async_trait]
impl<'a> Transaction for FaultyTransaction<'a> {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.inner.execute(sql).await
    }

    async fn commit(&mut self) -> DbResult<()> {
        if self.faults.commit {
            return Err(injected("COMMIT"));
        }
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> DbResult<()> {
        if self.faults.rollback {
            return Err(injected("ROLLBACK"));
        }
        self.inner.rollback().await
    }
}

/// Write a script file into `dir`
pub(crate) fn write_script(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// Task over `dir` against `db`, using the in-memory catalog name
pub(crate) fn task_for(dir: &Path, db: Arc<dyn Database>) -> MigrationTask {
    MigrationTask::new(dir, db, MEMORY_DB)
}

/// Row count of `table`, or `None` when it does not exist
pub(crate) async fn row_count(db: &dyn Database, table: &str) -> Option<i64> {
    db.query_count(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await
        .ok()
}

/// Whether `table` exists in the default schema
pub(crate) async fn table_exists(db: &dyn Database, table: &str) -> bool {
    db.query_count(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
        &[table],
    )
    .await
    .unwrap()
        > 0
}
