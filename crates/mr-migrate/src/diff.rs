//! Pending-script computation

use crate::applied::AppliedSet;

/// Scripts in `discovered` that are not in `applied`, keeping discovery order.
pub fn pending_scripts(discovered: &[String], applied: &AppliedSet) -> Vec<String> {
    discovered
        .iter()
        .filter(|name| !applied.contains(name))
        .cloned()
        .collect()
}
