//! ReviewCrew CLI — product review collection and formatting.
//!
//! Prints the crew plan, scrapes review pages with a source counter,
//! and renders review records as Markdown tables or CSV files.

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
