//! docgrab CLI: find a documentation site's pages and save them locally.
//!
//! Discovery tries `llms.txt` manifests, then `sitemap.xml`, then the start
//! page's navigation links.

mod commands;
mod prompt;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
