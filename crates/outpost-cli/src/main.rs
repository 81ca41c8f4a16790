//! `outpost` - scrape, geocode and store McDonald's Malaysia outlets.

mod nearby;
mod run;


use clap::{Parser, Subcommand};
use outpost_core::AppConfig;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "outpost", version)]
#[command(about = "Scrape and geocode outlets from the McDonald's Malaysia locator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one scrape of the outlet locator
    Run(run::RunArgs),
    /// List stored outlets by distance from a point
    Nearby(nearby::NearbyArgs),
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,outpost=debug")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_with_env()?;

    match cli.command {
        Commands::Run(args) => run::run_scrape(config, &args).await,
        Commands::Nearby(args) => {
            nearby::list_nearby(&config, &args).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
