//! Script discovery

use crate::error::{MigrateError, MigrateResult};
use std::ffi::OsStr;
use std::path::Path;

/// List migration scripts in `dir`, sorted lexically by file name.
///
/// Only regular files (or symlinks to them) whose extension equals
/// `extension` (no leading dot, case-sensitive) are returned. Subdirectories
/// are never descended into. An empty directory yields an empty list.
pub fn discover_scripts(dir: &Path, extension: &str) -> MigrateResult<Vec<String>> {
    let read_error = |source: std::io::Error| MigrateError::DirectoryRead {
        path: dir.display().to_string(),
        source,
    };

    let mut scripts = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(OsStr::to_str) != Some(extension) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => scripts.push(name),
            Err(name) => {
                log::warn!("Skipping script with non UTF-8 file name: {:?}", name);
            }
        }
    }

    scripts.sort();
    log::debug!(
        "Discovered {} script(s) in {}",
        scripts.len(),
        dir.display()
    );
    Ok(scripts)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
