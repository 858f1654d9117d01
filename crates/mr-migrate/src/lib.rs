//! mr-migrate - Migration engine for migrun
//!
//! Applies pending SQL scripts from a directory to a database exactly once,
//! tracking applied scripts in a bookkeeping table inside the same database.
//!
//! A run flows through four stages:
//!
//! 1. [`discovery`]: list script files with the configured extension, sorted
//!    lexically by file name.
//! 2. [`applied`]: load the names already recorded in the bookkeeping table.
//!    A missing table means nothing has been applied yet.
//! 3. [`diff`]: keep the discovered scripts that are not yet applied, in
//!    discovery order.
//! 4. [`executor`]: apply each pending script one statement at a time, each
//!    statement in its own transaction, then record the script.
//!
//! The run stops at the first failure. Statements of a failed script that
//! already committed stay committed; scripts are not atomic.

pub mod applied;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod handler;
pub mod task;

#[cfg(test)]
pub(crate) mod test_utils;

pub use applied::{check_catalog, load_applied_set, AppliedSet, VersionsTable};
pub use diff::pending_scripts;
pub use discovery::discover_scripts;
pub use error::{MigrateError, MigrateResult, StatementLocation};
pub use executor::{ScriptExecutor, ScriptReport};
pub use handler::{MigrationHandler, MigrationStatus, RunSummary, ScriptState, ScriptStatus};
pub use task::{MigrationOptions, MigrationTask};
