//! mr-db - Database abstraction layer for migrun
//!
//! This crate provides the `Database` and `Transaction` traits consumed by the
//! migration engine, and their DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::{DuckDbBackend, DuckDbTransaction};
pub use error::{DbError, DbResult};
pub use traits::{Database, Transaction};
