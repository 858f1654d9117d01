//! mr-sql - SQL layer for migrun
//!
//! Splits migration script content into individually executable statements,
//! either SQL-aware on semicolons (via the sqlparser tokenizer) or literally on
//! a dedicated delimiter marker.

pub mod error;
pub mod splitter;

pub use error::{SqlError, SqlResult};
pub use splitter::{split_statements, SqlStatement, StatementDelimiter};
