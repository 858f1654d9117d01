//! migrun CLI - apply pending SQL migration scripts exactly once

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{common, run, status};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.global.verbose);

    match &cli.command {
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
    }
}
