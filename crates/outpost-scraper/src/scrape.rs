//! The `Scraper` trait implemented by the run orchestrator.

use crate::error::Result;
use crate::orchestrator::RunOutcome;

/// A source of outlet listings
#[async_trait::async_trait]
pub trait Scraper {
    /// Load the source page and wait until it is usable
    async fn fetch(&mut self, url: &str) -> Result<()>;

    /// Plain text of the listing region
    async fn extract_text(&self) -> Result<String>;

    /// Run a full scrape. Always returns statistics, even when aborted.
    async fn scrape(&mut self) -> RunOutcome;
}
