//! Lunathink CLI — research digests delivered by email.
//!
//! Searches recent web content for a set of topics, filters and summarizes
//! it, and has a drafter/critic pair agree on one digest before sending it.

mod commands;
mod progress;
mod wiring;

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
