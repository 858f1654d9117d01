//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use mr_core::Config;
use mr_db::{Database, DuckDbBackend};
use mr_migrate::{MigrationOptions, MigrationTask};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

const IN_MEMORY: &str = ":memory:";

/// Initialize the logger. Defaults to `warn`, `debug` with `--verbose`;
/// `RUST_LOG` takes precedence over both.
pub(crate) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Load the configuration and the directory relative paths resolve against.
///
/// An explicit `--config` must exist; otherwise the project directory is
/// searched and defaults are used when it has no config file.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<(Config, PathBuf)> {
    match &global.config {
        Some(path) => {
            let path = Path::new(path);
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, root))
        }
        None => {
            let root = PathBuf::from(&global.project_dir);
            let config = Config::load_or_default(&root)
                .with_context(|| format!("Failed to load config from {}", root.display()))?;
            Ok((config, root))
        }
    }
}

/// Resolve the DuckDB path: flag as given, config path relative to `root`.
fn resolve_db_path(global: &GlobalArgs, config: &Config, root: &Path) -> String {
    if let Some(path) = &global.database {
        return path.clone();
    }
    if config.database.path == IN_MEMORY {
        return config.database.path.clone();
    }
    root.join(&config.database.path).display().to_string()
}

/// Build a migration task from config plus CLI overrides.
///
/// The database name comes from `--database-name`, then `database.name` in
/// the config, then the connection's current database.
pub(crate) async fn build_task(global: &GlobalArgs) -> Result<MigrationTask> {
    let (config, root) = load_config(global)?;

    let scripts_dir = match &global.scripts_dir {
        Some(dir) => PathBuf::from(dir),
        None => config.scripts_dir_absolute(&root),
    };

    let db_path = resolve_db_path(global, &config, &root);
    log::debug!("Opening database {}", db_path);
    let db = DuckDbBackend::new(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;

    let db_name = match global
        .database_name
        .clone()
        .or_else(|| config.database.name.clone())
    {
        Some(name) => name,
        None => db
            .current_database()
            .await
            .context("Failed to resolve the current database name")?,
    };

    let options = MigrationOptions::from_config(&config);
    Ok(MigrationTask::new(scripts_dir, Arc::new(db), db_name).with_options(options))
}

#[cfg(test)]
#[path = "common_test.rs"]
pub(crate) mod tests;
