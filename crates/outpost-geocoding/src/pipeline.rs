//! Two-stage coordinate resolution for a single outlet.
//!
//! Stage one parses coordinates out of the captured navigation link. Stage
//! two cleans the address, walks its variants through the geocoding client
//! and stops at the first match or the first rate-limit response. Whatever
//! stage produces a pair, the validator has the final word.

use crate::client::{GeocodeOutcome, GeocodingClient};
use crate::navlink::extract_coordinates;
use crate::normalizer::AddressNormalizer;
use crate::validator::{round2, CoordinateValidator};
use outpost_core::{GeocodingInfo, GeocodingStatus, LocationType, OutletDraft};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fixed confidence for coordinates read from a navigation link.
const NAVIGATION_LINK_CONFIDENCE: f64 = 0.95;

/// Weight of the service's own confidence in the blended score.
const SERVICE_WEIGHT: f64 = 0.7;

/// Weight of the validator's confidence in the blended score.
const VALIDATION_WEIGHT: f64 = 0.3;

/// What the pipeline did for one outlet, for run statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    /// Geocoding service queries issued
    pub attempts: u32,
    /// Source of the accepted coordinates, if any
    pub resolved_by: Option<LocationType>,
    /// The service rate-limited a query
    pub rate_limited: bool,
    /// Wall time spent in the pipeline
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Whether coordinates were accepted.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.resolved_by.is_some()
    }
}

/// Resolves and validates outlet coordinates.
pub struct GeocodingPipeline {
    client: Option<Arc<dyn GeocodingClient>>,
    normalizer: AddressNormalizer,
    validator: CoordinateValidator,
}

impl GeocodingPipeline {
    /// Create a pipeline. Without a client only navigation links are used.
    #[must_use]
    pub fn new(
        client: Option<Arc<dyn GeocodingClient>>,
        normalizer: AddressNormalizer,
        validator: CoordinateValidator,
    ) -> Self {
        Self {
            client,
            normalizer,
            validator,
        }
    }

    /// Resolve coordinates for a draft, recording success or failure on it.
    pub async fn resolve(&self, draft: &mut OutletDraft) -> PipelineReport {
        let started = Instant::now();
        let mut report = PipelineReport::default();

        let outcome = self.resolve_inner(draft, &mut report).await;
        match outcome {
            Ok(location_type) => report.resolved_by = Some(location_type),
            Err(reason) => {
                tracing::debug!(outlet = %draft.name, reason = %reason, "geocoding failed");
                draft.apply_geocode_failure(GeocodingInfo::failed(reason));
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    async fn resolve_inner(
        &self,
        draft: &mut OutletDraft,
        report: &mut PipelineReport,
    ) -> Result<LocationType, String> {
        if let Some(point) = draft.navigation_link.as_deref().and_then(extract_coordinates) {
            let validation = self.validator.validate(point);
            if !validation.is_valid {
                return Err("invalid coordinates".to_string());
            }

            let info = GeocodingInfo {
                status: GeocodingStatus::Success,
                confidence: NAVIGATION_LINK_CONFIDENCE,
                location_type: LocationType::NavigationLink,
                area: Some(validation.area),
                matched_query: None,
                issues: validation.issues,
            };
            draft
                .apply_geocode_success(point, info)
                .map_err(|e| e.to_string())?;
            tracing::debug!(outlet = %draft.name, coordinates = %point, "resolved from navigation link");
            return Ok(LocationType::NavigationLink);
        }

        if !draft.has_address() {
            return Err("no address provided".to_string());
        }

        let Some(client) = &self.client else {
            return Err("address geocoding disabled".to_string());
        };

        let cleaned = self.normalizer.clean(&draft.address);
        for variant in self.normalizer.variants(&cleaned, Some(&draft.name)) {
            report.attempts += 1;

            match client.geocode(&variant).await {
                GeocodeOutcome::Found(hit) => {
                    let validation = self.validator.validate(hit.coordinates);
                    if !validation.is_valid {
                        return Err("invalid coordinates".to_string());
                    }

                    let info = GeocodingInfo {
                        status: GeocodingStatus::Success,
                        confidence: round2(
                            SERVICE_WEIGHT * hit.confidence + VALIDATION_WEIGHT * validation.confidence,
                        ),
                        location_type: LocationType::Geocoded,
                        area: Some(validation.area),
                        matched_query: Some(variant),
                        issues: validation.issues,
                    };
                    draft
                        .apply_geocode_success(hit.coordinates, info)
                        .map_err(|e| e.to_string())?;
                    return Ok(LocationType::Geocoded);
                }
                GeocodeOutcome::RateLimited => {
                    report.rate_limited = true;
                    return Err("rate limited".to_string());
                }
                GeocodeOutcome::NoResults => {
                    tracing::trace!(variant = %variant, "no results, trying next variant");
                }
                GeocodeOutcome::ServiceError(message) => {
                    tracing::debug!(variant = %variant, error = %message, "geocoding variant failed");
                }
            }
        }

        Err("geocoding failed".to_string())
    }
}
