//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// migrun - apply pending SQL migration scripts exactly once
#[derive(Parser, Debug)]
#[command(name = "migrun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing migrun.yml
    #[arg(short = 'd', long = "dir", global = true, default_value = ".")]
    pub project_dir: String,

    /// Explicit config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the scripts directory
    #[arg(short, long, global = true)]
    pub scripts_dir: Option<String>,

    /// Override the database path (DuckDB file or :memory:)
    #[arg(long, global = true, env = "MIGRUN_DATABASE")]
    pub database: Option<String>,

    /// Override the database (catalog) name holding the versions table
    #[arg(long, global = true)]
    pub database_name: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migration scripts
    Run(RunArgs),

    /// Show applied and pending migration scripts
    Status(StatusArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// List pending scripts without applying them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
