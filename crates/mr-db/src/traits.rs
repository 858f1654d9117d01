//! Database trait definitions

use crate::error::DbResult;
use async_trait::async_trait;

/// Database abstraction trait for migrun
///
/// The handle is supplied by the caller and outlives a migration run; the
/// engine never opens or closes it. Implementations must be Send + Sync for
/// async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a parameterized query and return the first column of every row as text
    async fn query_strings(&self, sql: &str, params: &[&str]) -> DbResult<Vec<String>>;

    /// Run a parameterized query returning a single integer
    async fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<i64>;

    /// Execute one parameterized statement outside any explicit transaction,
    /// returns affected rows
    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Execute raw SQL (possibly several statements) outside any explicit transaction
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Begin a transaction.
    ///
    /// The returned transaction holds the connection until it is committed,
    /// rolled back, or dropped; dropping an unfinished transaction rolls it back.
    async fn begin<'a>(&'a self) -> DbResult<Box<dyn Transaction + 'a>>;

    /// Name of the catalog (database) the connection is attached to
    async fn current_database(&self) -> DbResult<String>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// An open transaction on a [`Database`]
#[async_trait]
pub trait Transaction: Send {
    /// Execute SQL inside the transaction
    async fn execute(&mut self, sql: &str) -> DbResult<()>;

    /// Commit the transaction
    async fn commit(&mut self) -> DbResult<()>;

    /// Roll the transaction back
    async fn rollback(&mut self) -> DbResult<()>;
}
