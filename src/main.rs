// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;

use vanguard_posture::{api, config::Config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Config::parse();
    logging::initialize_logging(config.log_to_file)?;

    api::serve(config).await
}
