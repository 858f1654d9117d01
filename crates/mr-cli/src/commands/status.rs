//! Status command implementation

use anyhow::{Context, Result};
use mr_migrate::{MigrationHandler, MigrationStatus};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::build_task;

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let task = build_task(global).await?;
    let handler = MigrationHandler::new(task);
    let status = handler
        .status()
        .await
        .context("Failed to read migration status")?;

    match args.output {
        StatusOutput::Table => print_table(&status),
        StatusOutput::Json => print_json(&status)?,
    }

    Ok(())
}

fn format_table(status: &MigrationStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("Versions table: {}\n\n", status.versions_table));

    if status.scripts.is_empty() {
        out.push_str("No scripts found\n");
    } else {
        let name_width = status
            .scripts
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0)
            .max(4);
        out.push_str(&format!("{:<name_width$}  STATE\n", "NAME"));
        out.push_str(&format!("{:-<name_width$}  {:-<7}\n", "", ""));
        for script in &status.scripts {
            out.push_str(&format!("{:<name_width$}  {}\n", script.name, script.state));
        }
    }

    if !status.orphaned.is_empty() {
        out.push_str("\nRecorded but missing from the scripts directory:\n");
        for name in &status.orphaned {
            out.push_str(&format!("  {}\n", name));
        }
    }

    let pending = status.pending().count();
    out.push_str(&format!(
        "\n{} script(s), {} pending\n",
        status.scripts.len(),
        pending
    ));
    out
}

fn print_table(status: &MigrationStatus) {
    print!("{}", format_table(status));
}

fn print_json(status: &MigrationStatus) -> Result<()> {
    let json = serde_json::to_string_pretty(status).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
