//! Bookkeeping table access and applied-set lookup

use crate::error::{MigrateError, MigrateResult};
use chrono::{DateTime, Utc};
use mr_core::sql_utils::{quote_ident, split_qualified_name};
use mr_db::{Database, DbResult};
use std::collections::HashSet;
use std::fmt;

/// Existence check scoped by catalog, schema and table name.
const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) FROM information_schema.tables \
     WHERE table_catalog = ? AND table_schema = ? AND table_name = ?";

/// Catalog existence check; every attached catalog has at least one schema.
const CATALOG_EXISTS_SQL: &str =
    "SELECT COUNT(*) FROM information_schema.schemata WHERE catalog_name = ?";

/// The bookkeeping table, addressed as `catalog.schema.table`.
///
/// Components must already have passed identifier validation; they are
/// quoted again whenever they are interpolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionsTable {
    catalog: String,
    schema: String,
    table: String,
}

impl VersionsTable {
    /// Build from a database name and a `table` or `schema.table` name
    pub fn new(catalog: &str, name: &str) -> Self {
        let (schema, table) = split_qualified_name(name);
        Self {
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }

    /// Quoted, fully qualified name for use in SQL
    pub fn quoted(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_ident(&self.catalog),
            quote_ident(&self.schema),
            quote_ident(&self.table)
        )
    }

    /// Database (catalog) name the table lives in
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Whether the catalog is attached to the connection
    pub async fn catalog_exists(&self, db: &dyn Database) -> DbResult<bool> {
        let count = db.query_count(CATALOG_EXISTS_SQL, &[self.catalog.as_str()]).await?;
        Ok(count > 0)
    }

    /// Whether the table exists in the catalog
    pub async fn exists(&self, db: &dyn Database) -> DbResult<bool> {
        let params = [
            self.catalog.as_str(),
            self.schema.as_str(),
            self.table.as_str(),
        ];
        let count = db.query_count(TABLE_EXISTS_SQL, &params).await?;
        Ok(count > 0)
    }

    /// Recorded script names, oldest first
    pub async fn applied_names(&self, db: &dyn Database) -> DbResult<Vec<String>> {
        let sql = format!("SELECT name FROM {} ORDER BY created, name", self.quoted());
        db.query_strings(&sql, &[]).await
    }

    /// Create the table (and its schema) if missing
    pub async fn ensure(&self, db: &dyn Database) -> DbResult<()> {
        if self.schema != "main" {
            db.execute_batch(&format!(
                "CREATE SCHEMA IF NOT EXISTS {}.{}",
                quote_ident(&self.catalog),
                quote_ident(&self.schema)
            ))
            .await?;
        }
        db.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (name VARCHAR PRIMARY KEY, created TIMESTAMP NOT NULL)",
            self.quoted()
        ))
        .await
    }

    /// Record `script` as applied at `at`
    pub async fn record(&self, db: &dyn Database, script: &str, at: DateTime<Utc>) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (name, created) VALUES (?, CAST(? AS TIMESTAMP))",
            self.quoted()
        );
        let created = at.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        db.execute(&sql, &[script, created.as_str()]).await?;
        Ok(())
    }
}

impl fmt::Display for VersionsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// Names of applied scripts, for membership tests.
///
/// Keeps the load order (oldest record first) for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSet {
    ordered: Vec<String>,
    names: HashSet<String>,
}

impl AppliedSet {
    /// Whether `script` has been applied
    pub fn contains(&self, script: &str) -> bool {
        self.names.contains(script)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Applied names in load order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

impl FromIterator<String> for AppliedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = AppliedSet::default();
        for name in iter {
            if set.names.insert(name.clone()) {
                set.ordered.push(name);
            }
        }
        set
    }
}

/// Fail with [`MigrateError::Config`] when the table's catalog is not
/// attached.
///
/// Without this check a mistyped database name reads as an empty applied set
/// and only fails once the first script has already been committed.
pub async fn check_catalog(db: &dyn Database, table: &VersionsTable) -> MigrateResult<()> {
    let exists = table
        .catalog_exists(db)
        .await
        .map_err(|source| MigrateError::Query {
            action: format!("check whether database '{}' exists", table.catalog()),
            source,
        })?;

    if !exists {
        return Err(MigrateError::Config {
            message: format!("database '{}' does not exist", table.catalog()),
        });
    }
    Ok(())
}

/// Load the applied set from the bookkeeping table.
///
/// A missing table is the expected first-run state and yields an empty set.
/// Any other failure of the existence check or the select is a
/// [`MigrateError::Query`].
pub async fn load_applied_set(
    db: &dyn Database,
    table: &VersionsTable,
) -> MigrateResult<AppliedSet> {
    let exists = table
        .exists(db)
        .await
        .map_err(|source| MigrateError::Query {
            action: format!("check whether {} exists", table),
            source,
        })?;

    if !exists {
        log::debug!("Bookkeeping table {} does not exist yet", table);
        return Ok(AppliedSet::default());
    }

    let names = table
        .applied_names(db)
        .await
        .map_err(|source| MigrateError::Query {
            action: format!("select applied scripts from {}", table),
            source,
        })?;

    let applied: AppliedSet = names.into_iter().collect();
    log::debug!("{} script(s) already applied", applied.len());
    Ok(applied)
}

#[cfg(test)]
#[path = "applied_test.rs"]
mod tests;
