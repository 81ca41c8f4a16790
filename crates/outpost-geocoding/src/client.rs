//! Address geocoding client.
//!
//! [`GeocodingClient`] is the seam the pipeline talks to; [`NominatimClient`]
//! implements it against the OpenStreetMap Nominatim search API with a
//! minimum-interval gate and retry on transient failures.

use crate::error::{GeocodingError, Result};
use crate::gate::RequestGate;
use crate::validator::round2;
use async_trait::async_trait;
use outpost_core::{Coordinates, GeocodingConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Relevance assumed when the service omits an importance score.
const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Bonus per locality term present in the query.
const TERM_BONUS: f64 = 0.1;

/// Cap on the total locality bonus.
const MAX_TERM_BONUS: f64 = 0.3;

/// Street-type terms that earn a locality bonus alongside city and country.
const STREET_TERMS: [&str; 3] = ["kl", "jalan", "jln"];

/// A single successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    /// Resolved position
    pub coordinates: Coordinates,
    /// Relevance-derived confidence in 0..=1
    pub confidence: f64,
    /// The service's label for the match
    pub display_name: String,
}

/// Classified result of one geocoding query.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// A match was found
    Found(GeocodeHit),
    /// The service knows no such place
    NoResults,
    /// The service kept answering 429
    RateLimited,
    /// Transport failure, bad status or unreadable body
    ServiceError(String),
}

/// Address to coordinate lookup.
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// Look up one free-text query.
    async fn geocode(&self, query: &str) -> GeocodeOutcome;
}

/// One entry of a Nominatim `jsonv2` search response.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    importance: Option<f64>,
}

/// Nominatim search client.
pub struct NominatimClient {
    client: Client,
    base_url: String,
    country: String,
    country_code: String,
    max_attempts: u32,
    retry_base: Duration,
    gate: RequestGate,
    bonus_terms: Vec<String>,
}

impl NominatimClient {
    /// Build a client from geocoding settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodingError::Client(e.to_string()))?;

        let mut bonus_terms = vec![config.city.to_lowercase(), config.country.to_lowercase()];
        bonus_terms.extend(STREET_TERMS.iter().map(|t| (*t).to_string()));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            country_code: config.country_code.clone(),
            max_attempts: config.max_retries.max(1),
            retry_base: Duration::from_millis(config.min_interval_ms.saturating_mul(2)),
            gate: RequestGate::new(Duration::from_millis(config.min_interval_ms)),
            bonus_terms,
        })
    }

    /// Override the base delay between retries.
    #[must_use]
    pub fn with_retry_base(mut self, delay: Duration) -> Self {
        self.retry_base = delay;
        self
    }

    /// Append the country unless the query already names it.
    fn qualify(&self, query: &str) -> String {
        if query.to_lowercase().contains(&self.country.to_lowercase()) {
            query.to_string()
        } else {
            format!("{query}, {}", self.country)
        }
    }

    /// Service importance plus a capped bonus for locality terms in the query.
    fn confidence(&self, importance: Option<f64>, query: &str) -> f64 {
        let base = importance.unwrap_or(DEFAULT_IMPORTANCE).clamp(0.0, 1.0);
        let query = query.to_lowercase();
        #[allow(clippy::cast_precision_loss)]
        let matched = self
            .bonus_terms
            .iter()
            .filter(|term| query.contains(term.as_str()))
            .count() as f64;
        let bonus = (matched * TERM_BONUS).min(MAX_TERM_BONUS);
        round2((base + bonus).min(1.0))
    }

    async fn search_once(&self, query: &str) -> Result<Vec<NominatimPlace>> {
        self.gate.acquire().await;

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("countrycodes", self.country_code.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodingError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodingError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodingError::Parse(e.to_string()))
    }

    /// Retry transient failures with exponential backoff, up to `max_attempts` in total.
    async fn search_with_retry(&self, query: &str) -> Result<Vec<NominatimPlace>> {
        let mut attempt = 1u32;

        loop {
            let err = match self.search_once(query).await {
                Ok(places) => return Ok(places),
                Err(err) => err,
            };

            if !err.is_retriable() || attempt >= self.max_attempts {
                return Err(err);
            }

            let delay = self
                .retry_base
                .saturating_mul(1u32 << (attempt - 1).min(16));
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis(),
                error = %err,
                "transient geocoding error, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl GeocodingClient for NominatimClient {
    async fn geocode(&self, query: &str) -> GeocodeOutcome {
        let query = self.qualify(query);

        let places = match self.search_with_retry(&query).await {
            Ok(places) => places,
            Err(GeocodingError::RateLimited) => {
                tracing::warn!(query = %query, "geocoding service rate limit persisted");
                return GeocodeOutcome::RateLimited;
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "geocoding request failed");
                return GeocodeOutcome::ServiceError(e.to_string());
            }
        };

        let Some(place) = places.into_iter().next() else {
            tracing::debug!(query = %query, "no geocoding results");
            return GeocodeOutcome::NoResults;
        };

        match (place.lat.parse::<f64>(), place.lon.parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => {
                let hit = GeocodeHit {
                    coordinates: Coordinates::new(latitude, longitude),
                    confidence: self.confidence(place.importance, &query),
                    display_name: place.display_name,
                };
                tracing::debug!(
                    query = %query,
                    coordinates = %hit.coordinates,
                    confidence = hit.confidence,
                    "geocoded address"
                );
                GeocodeOutcome::Found(hit)
            }
            _ => GeocodeOutcome::ServiceError(format!(
                "unparseable coordinates '{}', '{}'",
                place.lat, place.lon
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NominatimClient {
        NominatimClient::new(&GeocodingConfig::default()).expect("build client")
    }

    #[test]
    fn test_qualify_appends_country_once() {
        let client = client();
        assert_eq!(
            client.qualify("Jalan Ampang, Kuala Lumpur"),
            "Jalan Ampang, Kuala Lumpur, Malaysia"
        );
        assert_eq!(client.qualify("Bangsar, malaysia"), "Bangsar, malaysia");
    }

    #[test]
    fn test_confidence_bonus_is_capped() {
        let client = client();
        // kuala lumpur + malaysia + jalan + jln would be 0.4 uncapped
        let c = client.confidence(Some(0.4), "Jalan Jln Ampang, Kuala Lumpur, Malaysia");
        assert!((c - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_defaults_and_clamps() {
        let client = client();
        assert!((client.confidence(None, "Somewhere") - 0.5).abs() < 1e-9);
        assert!((client.confidence(Some(0.95), "Kuala Lumpur, Malaysia") - 1.0).abs() < 1e-9);
    }
}
