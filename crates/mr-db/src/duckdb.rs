//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Transaction};
use async_trait::async_trait;
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", e, path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn query_strings(&self, sql: &str, params: &[&str]) -> DbResult<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))?;
        let values = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    async fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<i64> {
        let conn = self.conn.lock().await;
        let count = conn.query_row(sql, params_from_iter(params.iter()), |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(count)
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        let conn = self.conn.lock().await;
        let affected = conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(affected)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn begin<'a>(&'a self) -> DbResult<Box<dyn Transaction + 'a>> {
        let conn = self.conn.lock().await;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;
        Ok(Box::new(DuckDbTransaction {
            conn,
            finished: false,
        }))
    }

    async fn current_database(&self) -> DbResult<String> {
        let conn = self.conn.lock().await;
        let name = conn.query_row("SELECT current_database()", [], |row| {
            row.get::<_, String>(0)
        })?;
        Ok(name)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Explicit `BEGIN` / `COMMIT` / `ROLLBACK` transaction on a [`DuckDbBackend`].
///
/// Holds the connection lock for its whole lifetime.
pub struct DuckDbTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> DuckDbTransaction<'a> {
    fn ensure_open(&self) -> DbResult<()> {
        if self.finished {
            return Err(DbError::NoTransaction);
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> Transaction for DuckDbTransaction<'a> {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.ensure_open()?;
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.ensure_open()?;
        match self.conn.execute_batch("COMMIT") {
            Ok(()) => {
                self.finished = true;
                Ok(())
            }
            Err(e) => Err(DbError::TransactionError(format!("COMMIT failed: {e}"))),
        }
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.ensure_open()?;
        match self.conn.execute_batch("ROLLBACK") {
            Ok(()) => {
                self.finished = true;
                Ok(())
            }
            // A failed COMMIT already aborted the transaction on DuckDB's side.
            Err(e) if e.to_string().contains("no transaction is active") => {
                self.finished = true;
                Ok(())
            }
            Err(e) => Err(DbError::TransactionError(format!("ROLLBACK failed: {e}"))),
        }
    }
}

impl<'a> Drop for DuckDbTransaction<'a> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                log::debug!("Implicit rollback on drop failed: {e}");
            }
        }
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
