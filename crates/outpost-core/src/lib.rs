//! Outpost Core - Foundation crate for the Outpost outlet pipeline.
//!
//! This crate provides the shared outlet model, error handling, configuration
//! management and the persistence contract that the other Outpost crates
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Outlet draft, feature tags, dedup key and coordinates
//! - [`store`] - The `OutletStore` persistence contract
//!
//! # Example
//!
//! ```rust
//! use outpost_core::{AppConfig, DedupKey, OutletDraft};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.scraping.region, "Kuala Lumpur");
//!
//! let draft = OutletDraft::new("McDonald's KLCC", "Jalan Ampang, Kuala Lumpur");
//! assert_eq!(
//!     DedupKey::of(&draft).as_str(),
//!     "McDonald's KLCC-Jalan Ampang, Kuala Lumpur"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, DatabaseConfig, GeocodingConfig, ScrapingConfig};
pub use error::{ConfigError, ConfigResult, OutpostError, Result};
pub use store::{OutletStore, StoreError};
pub use types::{
    AreaClass, Coordinates, DedupKey, Feature, GeocodingInfo, GeocodingStatus, LocationType,
    OutletDraft, ADDRESS_PLACEHOLDER,
};
