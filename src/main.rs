use anyhow::Result;
use clap::Parser;

use cityguide::cli::{self, Cli};
use cityguide::{GuideConfig, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GuideConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;
    cli::run(cli, config).await
}
