//! Per-run counters and the end-of-run report.

use chrono::{DateTime, Utc};
use outpost_core::LocationType;
use outpost_geocoding::PipelineReport;
use serde::Serialize;
use std::time::Duration;

/// Counters for one scrape run
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    /// `outpost_<region>_<timestamp>`
    pub session_id: String,
    /// Region selected in the locator filter
    pub region: String,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Outlet containers visited
    pub containers_seen: u32,
    /// Drafts built from containers or text blocks
    pub outlets_extracted: u32,
    /// Drafts that survived in-run deduplication
    pub unique_outlets: u32,
    /// Drafts dropped for repeating a key already seen this run
    pub duplicates_skipped: u32,
    /// Drafts the store already held
    pub storage_duplicates: u32,
    /// Drafts without a usable name or address
    pub invalid_skipped: u32,
    /// Navigation links obtained by clicking
    pub navigation_links_captured: u32,
    /// Drafts carrying a navigation link from any source
    pub navigation_links_matched: u32,
    /// Geocoding service queries
    pub geocoding_attempts: u32,
    /// Drafts with accepted coordinates
    pub geocoding_successes: u32,
    /// Drafts without coordinates
    pub geocoding_failures: u32,
    /// Successes resolved from navigation links
    pub navigation_coordinates: u32,
    /// Geocoding queries refused for rate limiting
    pub rate_limited: u32,
    /// Records written to the store
    pub records_saved: u32,
    /// Store failures other than duplicates
    pub database_errors: u32,
    /// Time spent in the geocoding pipeline, seconds
    pub geocoding_secs: f64,
    /// Run wall time, seconds
    pub elapsed_secs: f64,
    /// The run fell back to splitting page text
    pub text_fallback: bool,
}

impl RunStatistics {
    /// Fresh counters for a run over `region`
    #[must_use]
    pub fn new(region: &str) -> Self {
        let started_at = Utc::now();
        let slug: String = region
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        Self {
            session_id: format!("outpost_{slug}_{}", started_at.format("%Y%m%d_%H%M%S")),
            region: region.to_string(),
            started_at,
            containers_seen: 0,
            outlets_extracted: 0,
            unique_outlets: 0,
            duplicates_skipped: 0,
            storage_duplicates: 0,
            invalid_skipped: 0,
            navigation_links_captured: 0,
            navigation_links_matched: 0,
            geocoding_attempts: 0,
            geocoding_successes: 0,
            geocoding_failures: 0,
            navigation_coordinates: 0,
            rate_limited: 0,
            records_saved: 0,
            database_errors: 0,
            geocoding_secs: 0.0,
            elapsed_secs: 0.0,
            text_fallback: false,
        }
    }

    /// Fold one pipeline report into the counters
    pub fn record_geocoding(&mut self, report: &PipelineReport) {
        self.geocoding_attempts += report.attempts;
        self.geocoding_secs += report.elapsed.as_secs_f64();
        if report.rate_limited {
            self.rate_limited += 1;
        }
        match report.resolved_by {
            Some(LocationType::NavigationLink) => {
                self.geocoding_successes += 1;
                self.navigation_coordinates += 1;
            }
            Some(_) => self.geocoding_successes += 1,
            None => self.geocoding_failures += 1,
        }
    }

    /// Record the run's wall time
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed_secs = elapsed.as_secs_f64();
    }

    /// Unique outlets per second of wall time
    #[must_use]
    pub fn outlets_per_second(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            f64::from(self.unique_outlets) / self.elapsed_secs
        } else {
            0.0
        }
    }

    /// Share of extracted outlets that carried a navigation link, in percent
    #[must_use]
    pub fn navigation_success_rate(&self) -> f64 {
        percent(self.navigation_links_matched, self.outlets_extracted)
    }

    /// Share of geocoded outlets among those the pipeline saw, in percent
    #[must_use]
    pub fn geocoding_success_rate(&self) -> f64 {
        percent(
            self.geocoding_successes,
            self.geocoding_successes + self.geocoding_failures,
        )
    }

    /// Emit the report through `tracing`
    pub fn log_report(&self) {
        tracing::info!(session = %self.session_id, region = %self.region, "Scrape run finished");
        tracing::info!(
            containers = self.containers_seen,
            extracted = self.outlets_extracted,
            unique = self.unique_outlets,
            duplicates = self.duplicates_skipped,
            invalid = self.invalid_skipped,
            text_fallback = self.text_fallback,
            "Extraction"
        );
        tracing::info!(
            captured = self.navigation_links_captured,
            matched = self.navigation_links_matched,
            rate = %format!("{:.1}%", self.navigation_success_rate()),
            "Navigation links"
        );
        tracing::info!(
            attempts = self.geocoding_attempts,
            successes = self.geocoding_successes,
            failures = self.geocoding_failures,
            from_links = self.navigation_coordinates,
            rate_limited = self.rate_limited,
            secs = %format!("{:.1}", self.geocoding_secs),
            "Geocoding"
        );
        tracing::info!(
            saved = self.records_saved,
            storage_duplicates = self.storage_duplicates,
            errors = self.database_errors,
            "Persistence"
        );
        tracing::info!(
            elapsed = %format!("{:.1}s", self.elapsed_secs),
            outlets_per_sec = %format!("{:.2}", self.outlets_per_second()),
            "Timing"
        );
    }
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) * 100.0 / f64::from(whole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let stats = RunStatistics::new("Kuala Lumpur");
        assert!(stats.session_id.starts_with("outpost_kuala_lumpur_"));
        // outpost_kuala_lumpur_YYYYmmdd_HHMMSS
        assert_eq!(stats.session_id.len(), "outpost_kuala_lumpur_".len() + 15);
    }

    #[test]
    fn test_record_geocoding() {
        let mut stats = RunStatistics::new("Kuala Lumpur");
        stats.record_geocoding(&PipelineReport {
            attempts: 0,
            resolved_by: Some(LocationType::NavigationLink),
            rate_limited: false,
            elapsed: Duration::from_millis(5),
        });
        stats.record_geocoding(&PipelineReport {
            attempts: 3,
            resolved_by: None,
            rate_limited: true,
            elapsed: Duration::from_millis(5),
        });

        assert_eq!(stats.geocoding_successes, 1);
        assert_eq!(stats.navigation_coordinates, 1);
        assert_eq!(stats.geocoding_failures, 1);
        assert_eq!(stats.geocoding_attempts, 3);
        assert_eq!(stats.rate_limited, 1);
        assert!((stats.geocoding_success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rates_without_data() {
        let stats = RunStatistics::new("Selangor");
        assert!(stats.outlets_per_second().abs() < f64::EPSILON);
        assert!(stats.navigation_success_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_outlets_per_second() {
        let mut stats = RunStatistics::new("Selangor");
        stats.unique_outlets = 30;
        stats.finish(Duration::from_secs(60));
        assert!((stats.outlets_per_second() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = RunStatistics::new("Kuala Lumpur");
        let json = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(json["region"], "Kuala Lumpur");
        assert_eq!(json["text_fallback"], false);
    }
}
