//! mr-core - Core library for migrun
//!
//! This crate provides configuration parsing for `migrun.yml` and the SQL
//! identifier validation and quoting shared by every migrun component.

pub mod config;
pub mod error;
pub mod sql_utils;

pub use config::{Config, DatabaseConfig};
pub use error::{CoreError, CoreResult};
