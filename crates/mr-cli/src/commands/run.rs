//! Run command implementation

use anyhow::{Context, Result};
use mr_migrate::MigrationHandler;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::build_task;

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let task = build_task(global).await?;
    let scripts_dir = task.scripts_dir.clone();
    let handler = MigrationHandler::new(task);

    if args.dry_run {
        let pending = handler
            .pending()
            .await
            .context("Failed to compute pending scripts")?;
        if pending.is_empty() {
            println!("Nothing to apply in {}", scripts_dir.display());
        } else {
            println!("Pending scripts in {}:", scripts_dir.display());
            for name in &pending {
                println!("  {}", name);
            }
        }
        return Ok(());
    }

    println!("Applying scripts from {}", scripts_dir.display());

    let result = handler
        .run_with_progress(|report| {
            println!(
                "  ✓ {} ({} statements) [{}ms]",
                report.name,
                report.statements,
                report.duration.as_millis()
            );
        })
        .await;

    match result {
        Ok(summary) => {
            println!();
            println!(
                "Applied: {}, already applied: {}, discovered: {}",
                summary.applied.len(),
                summary.already_applied,
                summary.discovered
            );
            Ok(())
        }
        Err(err) => {
            if let Some(script) = err.script() {
                println!("  ✗ {}", script);
            }
            if err.needs_operator() {
                eprintln!(
                    "The database may not match the versions table; inspect it before re-running."
                );
            }
            Err(err).context("Migration run stopped")
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
