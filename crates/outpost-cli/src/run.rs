//! `outpost run`: one scrape with persistence and a printed summary.

use anyhow::Context;
use clap::Args;
use outpost_core::{AppConfig, OutletStore};
use outpost_db::Database;
use outpost_scraper::{run_browser_scrape, RunOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Region to select in the locator filter
    #[arg(long)]
    pub(crate) region: Option<String>,
    /// Show the browser window
    #[arg(long)]
    pub(crate) headed: bool,
    /// Do not write outlets to the database
    #[arg(long)]
    pub(crate) no_db: bool,
    /// Only use coordinates from navigation links
    #[arg(long)]
    pub(crate) no_geocoding: bool,
    /// Database file
    #[arg(long, value_name = "PATH")]
    pub(crate) db: Option<PathBuf>,
    /// Print the outcome as JSON instead of the summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl RunArgs {
    /// Fold command-line flags over the loaded configuration.
    pub(crate) fn apply(&self, config: &mut AppConfig) {
        if let Some(region) = &self.region {
            config.scraping.region.clone_from(region);
        }
        if self.headed {
            config.browser.headless = false;
        }
        if self.no_db {
            config.database.enabled = false;
        }
        if self.no_geocoding {
            config.geocoding.enabled = false;
        }
        if let Some(path) = &self.db {
            config.database.path = Some(path.clone());
        }
    }
}

/// Run one scrape. Exits with failure when the run was aborted.
pub(crate) async fn run_scrape(mut config: AppConfig, args: &RunArgs) -> anyhow::Result<ExitCode> {
    args.apply(&mut config);

    let database = if config.database.enabled {
        let path = config.database_path()?;
        let db = Database::open(&path)
            .await
            .with_context(|| format!("failed to open database {}", path.display()))?;
        tracing::info!(path = %path.display(), "Database ready");
        Some(db.with_required_prefix(config.scraping.brand.clone()))
    } else {
        None
    };

    let store = database
        .clone()
        .map(|db| Arc::new(db) as Arc<dyn OutletStore>);
    let outcome = run_browser_scrape(&config, store).await;

    if let Some(db) = &database {
        match db.count_outlets().await {
            Ok(total) => tracing::info!(total, "Outlets stored"),
            Err(e) => tracing::warn!(error = %e, "could not count stored outlets"),
        }
        db.close().await;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }

    if let Some(reason) = &outcome.aborted {
        tracing::error!(reason = %reason, "Run aborted");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(outcome: &RunOutcome) {
    let stats = &outcome.statistics;

    println!("Session:              {}", stats.session_id);
    println!("Region:               {}", stats.region);
    println!("Unique outlets:       {}", stats.unique_outlets);
    println!("Duplicates skipped:   {}", stats.duplicates_skipped);
    println!("Already stored:       {}", stats.storage_duplicates);
    println!("Saved:                {}", stats.records_saved);
    println!("Database errors:      {}", stats.database_errors);
    println!("Navigation coords:    {}", stats.navigation_coordinates);
    println!("Geocoding successes:  {}", stats.geocoding_successes);
    println!("Runtime:              {:.1}s", stats.elapsed_secs);
    println!("Outlets per second:   {:.2}", stats.outlets_per_second());
    println!(
        "Navigation links:     {:.1}%",
        stats.navigation_success_rate()
    );
    if stats.text_fallback {
        println!("Mode:                 page text fallback");
    }
    if let Some(reason) = &outcome.aborted {
        println!("Aborted:              {reason}");
    }
}
