//! Migration task configuration

use crate::applied::VersionsTable;
use crate::error::{MigrateError, MigrateResult};
use mr_core::sql_utils::{validate_catalog_name, validate_qualified};
use mr_core::Config;
use mr_db::Database;
use mr_sql::StatementDelimiter;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Tunables for a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Script file extension, without the leading dot
    pub extension: String,
    /// How script content is cut into statements
    pub delimiter: StatementDelimiter,
    /// Bookkeeping table, optionally `schema.table`
    pub versions_table: String,
    /// Create the bookkeeping table before the first record insert of a run
    pub create_versions_table: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            extension: "sql".to_string(),
            delimiter: StatementDelimiter::Semicolon,
            versions_table: "versions".to_string(),
            create_versions_table: true,
        }
    }
}

impl MigrationOptions {
    /// Build options from a loaded `migrun.yml`
    pub fn from_config(config: &Config) -> Self {
        Self {
            extension: config.extension().to_string(),
            delimiter: StatementDelimiter::from_config(config.delimiter.as_deref()),
            versions_table: config.versions_table.clone(),
            create_versions_table: config.create_versions_table,
        }
    }
}

/// Everything a run needs. Supplied by the caller and left untouched for the
/// duration of the run.
///
/// The database handle is injected; the engine never opens or closes it.
pub struct MigrationTask {
    /// Directory holding the migration scripts
    pub scripts_dir: PathBuf,
    /// Target database
    pub db: Arc<dyn Database>,
    /// Catalog the bookkeeping table lives in
    pub db_name: String,
    /// Run tunables
    pub options: MigrationOptions,
}

impl MigrationTask {
    /// Create a task with default options
    pub fn new(
        scripts_dir: impl Into<PathBuf>,
        db: Arc<dyn Database>,
        db_name: impl Into<String>,
    ) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            db,
            db_name: db_name.into(),
            options: MigrationOptions::default(),
        }
    }

    /// Replace the run options
    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Check the task before any work is done.
    ///
    /// The database and table names are interpolated into SQL, so they must
    /// pass identifier validation.
    pub fn validate(&self) -> MigrateResult<()> {
        if self.db_name.is_empty() {
            return Err(MigrateError::Config {
                message: "database name is not set".to_string(),
            });
        }
        validate_catalog_name(&self.db_name)?;
        validate_qualified("versions table", &self.options.versions_table)?;

        if self.options.extension.trim_start_matches('.').is_empty() {
            return Err(MigrateError::Config {
                message: "script extension is not set".to_string(),
            });
        }
        if let StatementDelimiter::Marker(marker) = &self.options.delimiter {
            if marker.trim().is_empty() {
                return Err(MigrateError::Config {
                    message: "statement delimiter marker is blank".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Extension without a leading dot
    pub fn extension(&self) -> &str {
        self.options.extension.trim_start_matches('.')
    }

    /// The bookkeeping table this task reads and writes
    pub fn versions_table(&self) -> VersionsTable {
        VersionsTable::new(&self.db_name, &self.options.versions_table)
    }
}

impl fmt::Debug for MigrationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationTask")
            .field("scripts_dir", &self.scripts_dir)
            .field("db_type", &self.db.db_type())
            .field("db_name", &self.db_name)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mr_db::DuckDbBackend;

    fn task(db_name: &str) -> MigrationTask {
        let db: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
        MigrationTask::new("migrations", db, db_name)
    }

    #[test]
    fn test_validate_ok() {
        task("memory").validate().unwrap();
    }

    #[test]
    fn test_empty_db_name_rejected() {
        let err = task("").validate().unwrap_err();
        assert!(matches!(err, MigrateError::Config { .. }));
        assert!(err.to_string().contains("database name is not set"));
    }

    #[test]
    fn test_file_stem_db_name_accepted() {
        task("my-app").validate().unwrap();
        task("2024").validate().unwrap();
    }

    #[test]
    fn test_db_name_injection_rejected() {
        let err = task("memory; DROP TABLE t").validate().unwrap_err();
        assert!(matches!(err, MigrateError::Config { .. }));
    }

    #[test]
    fn test_versions_table_injection_rejected() {
        let t = task("memory").with_options(MigrationOptions {
            versions_table: "versions WHERE 1=1".to_string(),
            ..MigrationOptions::default()
        });
        assert!(matches!(t.validate(), Err(MigrateError::Config { .. })));
    }

    #[test]
    fn test_blank_marker_rejected() {
        let t = task("memory").with_options(MigrationOptions {
            delimiter: StatementDelimiter::Marker(" \n".to_string()),
            ..MigrationOptions::default()
        });
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_options_from_config() {
        let config = load_config(
            "extension: .psql\ndelimiter: \"--;;\"\nversions_table: meta.applied\ncreate_versions_table: false\n",
        );
        let options = MigrationOptions::from_config(&config);
        assert_eq!(options.extension, "psql");
        assert_eq!(
            options.delimiter,
            StatementDelimiter::Marker("--;;".to_string())
        );
        assert_eq!(options.versions_table, "meta.applied");
        assert!(!options.create_versions_table);
    }

    fn load_config(yaml: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("migrun.yml"), yaml).unwrap();
        Config::load_from_dir(dir.path()).unwrap()
    }
}
