//! Configuration types and parsing for migrun.yml

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::{validate_catalog_name, validate_qualified};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names probed by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["migrun.yml", "migrun.yaml"];

/// Main configuration from migrun.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing migration scripts, relative to the config file
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// File extension identifying migration scripts (leading dot optional)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Statement delimiter. Absent or `";"` means SQL-aware semicolon
    /// splitting; anything else is split on literally.
    #[serde(default)]
    pub delimiter: Option<String>,

    /// Bookkeeping table, optionally schema-qualified (`schema.table`)
    #[serde(default = "default_versions_table")]
    pub versions_table: String,

    /// Create the bookkeeping table before recording the first applied script
    #[serde(default = "default_true")]
    pub create_versions_table: bool,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Catalog name the bookkeeping table lives in. When unset the name is
    /// resolved from the open connection.
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            name: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            extension: default_extension(),
            delimiter: None,
            versions_table: default_versions_table(),
            create_versions_table: true,
            database: DatabaseConfig::default(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_scripts_dir() -> String {
    "migrations".to_string()
}

fn default_extension() -> String {
    "sql".to_string()
}

fn default_versions_table() -> String {
    "versions".to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for migrun.yml or migrun.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Like [`load_from_dir`](Self::load_from_dir), but falls back to the
    /// defaults when the directory has no config file.
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!(
                    "No config file in {}, using defaults",
                    dir.display()
                );
                Ok(Self::default())
            }
        }
    }

    fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.scripts_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "scripts_dir cannot be empty".to_string(),
            });
        }

        if self.extension().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "extension cannot be empty".to_string(),
            });
        }

        if let Some(delimiter) = &self.delimiter {
            if delimiter.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "delimiter cannot be empty or whitespace".to_string(),
                });
            }
        }

        validate_qualified("versions table", &self.versions_table)?;

        if let Some(name) = &self.database.name {
            validate_catalog_name(name)?;
        }

        Ok(())
    }

    /// Script extension without a leading dot
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Get the absolute scripts directory relative to a root directory
    pub fn scripts_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.scripts_dir)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
