//! Migration run orchestration

use crate::applied::{check_catalog, load_applied_set, AppliedSet};
use crate::diff::pending_scripts;
use crate::discovery::discover_scripts;
use crate::error::MigrateResult;
use crate::executor::{ScriptExecutor, ScriptReport};
use crate::task::MigrationTask;
use serde::Serialize;
use std::fmt;

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Scripts found in the scripts directory
    pub discovered: usize,
    /// Scripts that were already applied before the run
    pub already_applied: usize,
    /// Scripts applied by this run, in order
    pub applied: Vec<ScriptReport>,
}

/// Whether a discovered script has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptState {
    Applied,
    Pending,
}

impl fmt::Display for ScriptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptState::Applied => write!(f, "applied"),
            ScriptState::Pending => write!(f, "pending"),
        }
    }
}

/// One discovered script and its state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptStatus {
    pub name: String,
    pub state: ScriptState,
}

/// Snapshot of scripts on disk against the bookkeeping table
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    /// Fully qualified bookkeeping table
    pub versions_table: String,
    /// Every discovered script, in discovery order
    pub scripts: Vec<ScriptStatus>,
    /// Applied records with no matching script file, oldest first
    pub orphaned: Vec<String>,
}

impl MigrationStatus {
    /// Names of pending scripts, in application order
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.scripts
            .iter()
            .filter(|s| s.state == ScriptState::Pending)
            .map(|s| s.name.as_str())
    }
}

/// Runs a [`MigrationTask`].
///
/// Stages run strictly in sequence: discovery, applied-set lookup, diff, then
/// one script at a time. The first failure ends the run.
#[derive(Debug)]
pub struct MigrationHandler {
    task: MigrationTask,
}

impl MigrationHandler {
    pub fn new(task: MigrationTask) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &MigrationTask {
        &self.task
    }

    /// Discovered scripts and the applied set, after validating the task
    async fn load(&self) -> MigrateResult<(Vec<String>, AppliedSet)> {
        self.task.validate()?;
        let versions = self.task.versions_table();
        check_catalog(self.task.db.as_ref(), &versions).await?;
        let discovered = discover_scripts(&self.task.scripts_dir, self.task.extension())?;
        let applied = load_applied_set(self.task.db.as_ref(), &versions).await?;
        Ok((discovered, applied))
    }

    /// Scripts that a run would apply, in order
    pub async fn pending(&self) -> MigrateResult<Vec<String>> {
        let (discovered, applied) = self.load().await?;
        Ok(pending_scripts(&discovered, &applied))
    }

    /// Apply every pending script
    pub async fn run(&self) -> MigrateResult<RunSummary> {
        self.run_with_progress(|_| {}).await
    }

    /// Apply every pending script, calling `on_applied` after each one is
    /// recorded
    pub async fn run_with_progress<F>(&self, mut on_applied: F) -> MigrateResult<RunSummary>
    where
        F: FnMut(&ScriptReport),
    {
        let (discovered, applied) = self.load().await?;
        let pending = pending_scripts(&discovered, &applied);

        log::info!(
            "{} script(s) discovered, {} already applied, {} pending",
            discovered.len(),
            applied.len(),
            pending.len()
        );

        let mut executor = ScriptExecutor::new(&self.task);
        let mut reports = Vec::with_capacity(pending.len());
        for script in &pending {
            let report = executor.apply(script).await?;
            log::info!(
                "Applied {} ({} statement(s))",
                report.name,
                report.statements
            );
            on_applied(&report);
            reports.push(report);
        }

        Ok(RunSummary {
            discovered: discovered.len(),
            already_applied: discovered.len() - pending.len(),
            applied: reports,
        })
    }

    /// Compare scripts on disk with the bookkeeping table without applying anything
    pub async fn status(&self) -> MigrateResult<MigrationStatus> {
        let (discovered, applied) = self.load().await?;

        let scripts = discovered
            .iter()
            .map(|name| ScriptStatus {
                name: name.clone(),
                state: if applied.contains(name) {
                    ScriptState::Applied
                } else {
                    ScriptState::Pending
                },
            })
            .collect();

        let orphaned = applied
            .iter()
            .filter(|name| !discovered.iter().any(|d| d.as_str() == *name))
            .map(String::from)
            .collect();

        Ok(MigrationStatus {
            versions_table: self.task.versions_table().to_string(),
            scripts,
            orphaned,
        })
    }
}

#[cfg(test)]
#[path = "handler_test.rs"]
mod tests;
