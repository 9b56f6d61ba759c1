//! Catfeed CLI — vendor XML catalog importer.
//!
//! Parses vendor product catalog files into normalized article groups and
//! articles, and upserts them into a local database by natural key.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
