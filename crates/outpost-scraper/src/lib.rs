//! Outpost Scraper - outlet extraction and run orchestration.
//!
//! Turns the rendered outlet locator into [`outpost_core::OutletDraft`]s.
//! The [`SequentialScrapeOrchestrator`] walks outlet containers one at a
//! time: field extraction, navigation-link capture, geocoding, in-run
//! deduplication and persistence. When no containers can be found, the
//! page text is split into per-outlet blocks instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use outpost_core::AppConfig;
//! use outpost_scraper::run_browser_scrape;
//!
//! let config = AppConfig::load_with_env()?;
//! let outcome = run_browser_scrape(&config, None).await;
//! println!("{} outlets", outcome.outlets.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod runner;
#[allow(missing_docs)]
pub mod scrape;
pub mod splitter;
pub mod stats;

// Re-export commonly used types
pub use error::{Result, ScrapeError};
pub use extractor::OutletFieldExtractor;
pub use orchestrator::{RunOutcome, SequentialScrapeOrchestrator};
pub use runner::{build_pipeline, run_browser_scrape};
pub use scrape::Scraper;
pub use splitter::MultiOutletSplitter;
pub use stats::RunStatistics;
