//! mdxsync CLI — remote Markdown ingestion and MDX repair.
//!
//! Fetches documentation from GitHub repositories, converts it to
//! framework-ready MDX, and writes it into the local content tree.

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
