//! scholardigest CLI - scholarly article digests delivered as HTML emails.
//!
//! Expands topics of interest into search terms, pulls recent papers from
//! Google Scholar, summarizes them with a language model and renders each
//! summary into a styled email file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
