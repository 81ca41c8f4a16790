//! `outpost nearby`: stored outlets ordered by distance.

use clap::Args;
use outpost_core::{AppConfig, Coordinates};
use outpost_db::Database;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub(crate) struct NearbyArgs {
    /// Latitude of the query point
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) lat: f64,
    /// Longitude of the query point
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) lon: f64,
    /// Search radius in kilometres
    #[arg(long, default_value_t = 2.0)]
    pub(crate) radius_km: f64,
    /// Maximum number of outlets to list
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,
    /// Database file
    #[arg(long, value_name = "PATH")]
    pub(crate) db: Option<PathBuf>,
}

pub(crate) async fn list_nearby(config: &AppConfig, args: &NearbyArgs) -> anyhow::Result<()> {
    let center = Coordinates::new(args.lat, args.lon);
    if !center.is_within_global_bounds() {
        anyhow::bail!("coordinates out of range: {center}");
    }
    if args.radius_km <= 0.0 {
        anyhow::bail!("radius must be positive, got {}", args.radius_km);
    }

    let path = match &args.db {
        Some(path) => path.clone(),
        None => config.database_path()?,
    };
    let db = Database::open(&path).await?;
    let nearby = db.nearby_outlets(center, args.radius_km, args.limit).await;
    db.close().await;
    let nearby = nearby?;

    if nearby.is_empty() {
        println!("No outlets within {} km of {center}", args.radius_km);
        return Ok(());
    }

    for entry in &nearby {
        println!(
            "{:>6.2} km  {}  ({})",
            entry.distance_km, entry.outlet.name, entry.outlet.address
        );
    }
    Ok(())
}
