//! Wiring for a live run: browser session, geocoder and orchestrator.

use crate::extractor::OutletFieldExtractor;
use crate::orchestrator::{RunOutcome, SequentialScrapeOrchestrator};
use crate::scrape::Scraper;
use crate::stats::RunStatistics;
use outpost_browser::{BrowserSession, NavigationCapture};
use outpost_core::{AppConfig, OutletStore};
use outpost_geocoding::{
    AddressNormalizer, CoordinateValidator, GeocodingClient, GeocodingPipeline, NominatimClient,
};
use std::sync::Arc;
use std::time::Duration;

/// Build the geocoding pipeline described by the configuration.
///
/// When address geocoding is disabled, or the HTTP client cannot be built,
/// only navigation links are used.
#[must_use]
pub fn build_pipeline(config: &AppConfig) -> GeocodingPipeline {
    let geocoding = &config.geocoding;

    let client: Option<Arc<dyn GeocodingClient>> = if geocoding.enabled {
        match NominatimClient::new(geocoding) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "geocoding client unavailable, using navigation links only");
                None
            }
        }
    } else {
        None
    };

    GeocodingPipeline::new(
        client,
        AddressNormalizer::new(&geocoding.city, &geocoding.country, &config.scraping.brand),
        CoordinateValidator::kuala_lumpur(),
    )
}

/// Launch a browser, scrape once and close the browser on every path.
pub async fn run_browser_scrape(
    config: &AppConfig,
    store: Option<Arc<dyn OutletStore>>,
) -> RunOutcome {
    let scraping = &config.scraping;

    let mut session = match BrowserSession::launch(&config.browser).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Browser launch failed");
            return RunOutcome::aborted(RunStatistics::new(&scraping.region), e.to_string());
        }
    };

    let settle = Duration::from_millis(scraping.capture_settle_ms);
    let capture = match session.navigation_events().await {
        Ok(receiver) => NavigationCapture::new(receiver, &scraping.navigation_label, settle),
        Err(e) => {
            tracing::warn!(error = %e, "request interception unavailable, watching tabs only");
            NavigationCapture::without_requests(&scraping.navigation_label, settle)
        }
    };

    let outcome = {
        let extractor = OutletFieldExtractor::new(&scraping.brand)
            .with_locality(&config.geocoding.city, &config.geocoding.country);

        match SequentialScrapeOrchestrator::new(&session, scraping.clone(), build_pipeline(config)) {
            Ok(orchestrator) => {
                let mut orchestrator = orchestrator
                    .with_extractor(extractor)
                    .with_capture(capture);
                if let Some(store) = store {
                    orchestrator = orchestrator.with_store(store);
                }
                orchestrator.scrape().await
            }
            Err(e) => RunOutcome::aborted(RunStatistics::new(&scraping.region), e.to_string()),
        }
    };

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Browser did not close cleanly");
    }

    outcome
}
