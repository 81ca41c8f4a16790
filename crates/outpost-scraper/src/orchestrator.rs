//! Sequential scrape orchestrator.
//!
//! Drives one run against the outlet locator: loads the page, applies the
//! region filter, finds the outlet containers and walks them strictly in
//! order. Each outlet goes through extraction, navigation-link capture,
//! geocoding, in-run deduplication and persistence before the next one is
//! touched. Per-outlet failures are logged and skipped; only a page that
//! never becomes interactive ends the run early.

use crate::error::{Result, ScrapeError};
use crate::extractor::OutletFieldExtractor;
use crate::scrape::Scraper;
use crate::splitter::MultiOutletSplitter;
use crate::stats::RunStatistics;
use outpost_browser::{BrowserPage, ContainerLocator, ElementHandle, NavigationCapture};
use outpost_core::{DedupKey, OutletDraft, OutletStore, ScrapingConfig, StoreError};
use outpost_geocoding::GeocodingPipeline;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Listing text shorter than this is not worth extracting.
const MIN_LISTING_LEN: usize = 10;

/// Fallback text source when the results region is empty.
const BODY_SELECTOR: &str = "body";

/// Result of one run: accepted outlets, counters, and the abort reason if any.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Unique outlets in page order
    pub outlets: Vec<OutletDraft>,
    /// Run counters
    pub statistics: RunStatistics,
    /// Why the run stopped early
    pub aborted: Option<String>,
}

impl RunOutcome {
    /// Outcome for a run that could not start.
    #[must_use]
    pub fn aborted(statistics: RunStatistics, reason: impl Into<String>) -> Self {
        Self {
            outlets: Vec::new(),
            statistics,
            aborted: Some(reason.into()),
        }
    }

    /// Whether the run completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Scrapes outlets one at a time from a browser page.
pub struct SequentialScrapeOrchestrator<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    config: ScrapingConfig,
    locator: ContainerLocator,
    extractor: OutletFieldExtractor,
    splitter: MultiOutletSplitter,
    capture: Option<NavigationCapture>,
    pipeline: GeocodingPipeline,
    store: Option<Arc<dyn OutletStore>>,
    seen: HashSet<DedupKey>,
    outlets: Vec<OutletDraft>,
    stats: RunStatistics,
}

impl<'a, P: BrowserPage + ?Sized> SequentialScrapeOrchestrator<'a, P> {
    /// Create an orchestrator over a page.
    pub fn new(page: &'a P, config: ScrapingConfig, pipeline: GeocodingPipeline) -> Result<Self> {
        let splitter = MultiOutletSplitter::new(&config.brand, &config.navigation_label)?;
        Ok(Self {
            page,
            locator: ContainerLocator::new(config.results_selector.clone(), config.min_containers),
            extractor: OutletFieldExtractor::new(&config.brand),
            splitter,
            capture: None,
            pipeline,
            store: None,
            seen: HashSet::new(),
            outlets: Vec::new(),
            stats: RunStatistics::new(&config.region),
            config,
        })
    }

    /// Click each outlet's navigation control to capture its link.
    #[must_use]
    pub fn with_capture(mut self, capture: NavigationCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Persist accepted outlets.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn OutletStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the field extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: OutletFieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    async fn run(&mut self) -> Result<()> {
        let target = self.config.target_url.clone();
        self.fetch(&target).await?;
        self.show_results().await?;

        let containers = self.locator.locate(self.page).await;
        if containers.is_empty() {
            tracing::warn!("no outlet containers found, splitting page text");
            self.scrape_text().await;
            return Ok(());
        }

        self.wait_for_navigation_controls().await;

        let total = containers.len();
        for (index, container) in containers.iter().enumerate() {
            if index == 0 {
                sleep_ms(self.config.first_outlet_wait_ms).await;
            }
            tracing::debug!(outlet = index + 1, total, "processing container");
            self.process_container(container.as_ref()).await;
        }

        Ok(())
    }

    /// Select the region, trigger the search and wait for results.
    async fn show_results(&self) -> Result<()> {
        let config = &self.config;

        if let Err(e) = self
            .page
            .select_option(&config.filter_selector, &config.region)
            .await
        {
            tracing::warn!(region = %config.region, error = %e, "region filter not applied");
        }
        sleep_ms(config.filter_settle_ms).await;

        self.page.click(&config.trigger_selector).await?;

        if let Err(e) = self
            .page
            .wait_for_children(&config.results_selector, config.results_timeout_ms)
            .await
        {
            tracing::warn!(error = %e, "results did not stabilize, continuing");
        }

        tracing::info!(region = %config.region, "Search results requested");
        Ok(())
    }

    async fn wait_for_navigation_controls(&self) {
        let selector = format!("{} a", self.config.results_selector);
        if let Err(e) = self
            .page
            .wait_for_selector(&selector, self.config.navigation_ready_timeout_ms)
            .await
        {
            tracing::warn!(error = %e, "navigation controls not ready, waiting longer");
            sleep_ms(self.config.navigation_fallback_wait_ms).await;
        }
    }

    async fn process_container(&mut self, container: &dyn ElementHandle) {
        self.stats.containers_seen += 1;

        let text = match container.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable container skipped");
                return;
            }
        };
        if text.trim().chars().count() < MIN_LISTING_LEN {
            return;
        }
        let markup = container.inner_html().await.ok();

        let mut draft = self.extractor.extract(&text, markup.as_deref());
        self.stats.outlets_extracted += 1;
        if !draft.is_persistable(&self.config.brand) {
            self.stats.invalid_skipped += 1;
            tracing::debug!(name = %draft.name, "incomplete outlet skipped");
            return;
        }

        if let Some(capture) = self.capture.as_mut() {
            if let Some(url) = capture.capture(self.page, container).await {
                self.stats.navigation_links_captured += 1;
                draft.navigation_link = Some(url);
            }
        }

        self.accept(draft).await;
    }

    /// Split the listing text and extract each block without clicking.
    async fn scrape_text(&mut self) {
        self.stats.text_fallback = true;

        let text = match self.extract_text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "no listing text available");
                return;
            }
        };

        for block in self.splitter.split(&text) {
            if block.trim().chars().count() < MIN_LISTING_LEN {
                continue;
            }
            let draft = self.extractor.extract(&block, None);
            self.stats.outlets_extracted += 1;
            if !draft.is_persistable(&self.config.brand) {
                self.stats.invalid_skipped += 1;
                continue;
            }
            self.accept(draft).await;
        }
    }

    /// Geocode, deduplicate and persist one draft.
    async fn accept(&mut self, mut draft: OutletDraft) {
        if draft.navigation_link.is_some() {
            self.stats.navigation_links_matched += 1;
        }

        let report = self.pipeline.resolve(&mut draft).await;
        self.stats.record_geocoding(&report);

        if !self.seen.insert(DedupKey::of(&draft)) {
            self.stats.duplicates_skipped += 1;
            tracing::debug!(name = %draft.name, "duplicate outlet in this run");
            return;
        }
        self.stats.unique_outlets += 1;

        if let Some(store) = self.store.clone() {
            self.persist(store.as_ref(), &draft).await;
        }

        tracing::info!(
            name = %draft.name,
            geocoded = draft.is_geocoded(),
            "Outlet accepted"
        );
        self.outlets.push(draft);
    }

    async fn persist(&mut self, store: &dyn OutletStore, draft: &OutletDraft) {
        match store.exists(&draft.name).await {
            Ok(true) => {
                self.stats.storage_duplicates += 1;
                tracing::debug!(name = %draft.name, "outlet already stored");
                return;
            }
            Ok(false) => {}
            Err(e) => {
                self.stats.database_errors += 1;
                tracing::warn!(name = %draft.name, error = %e, "store lookup failed");
                return;
            }
        }

        match store.insert(draft).await {
            Ok(id) => {
                self.stats.records_saved += 1;
                tracing::debug!(id, name = %draft.name, "outlet saved");
            }
            Err(StoreError::Duplicate { name }) => {
                self.stats.storage_duplicates += 1;
                tracing::debug!(name = %name, "outlet already stored");
            }
            Err(e) => {
                self.stats.database_errors += 1;
                tracing::warn!(name = %draft.name, error = %e, "failed to save outlet");
            }
        }
    }
}

#[async_trait::async_trait]
impl<'a, P: BrowserPage + ?Sized> Scraper for SequentialScrapeOrchestrator<'a, P> {
    async fn fetch(&mut self, url: &str) -> Result<()> {
        tracing::info!(url, "Loading outlet locator");
        self.page.navigate(url).await?;

        let config = &self.config;
        for selector in [
            &config.app_selector,
            &config.filter_selector,
            &config.trigger_selector,
        ] {
            if self
                .page
                .wait_for_selector(selector, config.interactive_timeout_ms)
                .await
                .is_err()
            {
                return Err(ScrapeError::PageNotInteractive {
                    selector: selector.clone(),
                });
            }
        }
        Ok(())
    }

    async fn extract_text(&self) -> Result<String> {
        match self.page.extract_text(&self.config.results_selector).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            _ => Ok(self.page.extract_text(BODY_SELECTOR).await?),
        }
    }

    async fn scrape(&mut self) -> RunOutcome {
        let started = Instant::now();
        self.seen.clear();

        let aborted = match self.run().await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(error = %e, "Scrape run aborted");
                Some(e.to_string())
            }
        };

        self.stats.finish(started.elapsed());
        self.stats.log_report();

        RunOutcome {
            outlets: std::mem::take(&mut self.outlets),
            statistics: self.stats.clone(),
            aborted,
        }
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
