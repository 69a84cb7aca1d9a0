//! KickStream Helper CLI entry point.

mod cli;
mod commands;
mod logging;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    commands::execute(cli).await
}
