//! Shared types used across the Outpost pipeline.
//!
//! This module defines the outlet record built during a scrape pass, the
//! feature tags and geocoding metadata attached to it, and the small value
//! types (`Coordinates`, `DedupKey`) the other crates agree on.

use crate::error::OutpostError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Address value used when no address line could be extracted.
pub const ADDRESS_PLACEHOLDER: &str = "Address not available";

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Addresses shorter than this are too vague to store or geocode.
const MIN_ADDRESS_LEN: usize = 10;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the pair lies within -90..90 / -180..180.
    #[must_use]
    pub fn is_within_global_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in kilometres (haversine formula).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Amenity tags detected on an outlet listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// Open around the clock
    #[serde(rename = "24 Hours")]
    TwentyFourHours,
    /// Drive-through lane
    #[serde(rename = "Drive-Thru")]
    DriveThru,
    /// In-store cafe counter
    #[serde(rename = "McCafe")]
    Cafe,
    /// Children's play area
    #[serde(rename = "PlayPlace")]
    PlayArea,
    /// Customer wifi
    #[serde(rename = "WiFi")]
    Wifi,
    /// Delivery service
    #[serde(rename = "Delivery")]
    Delivery,
    /// Customer parking
    #[serde(rename = "Parking")]
    Parking,
}

impl Feature {
    /// Every feature, in report order.
    pub const ALL: [Feature; 7] = [
        Feature::TwentyFourHours,
        Feature::DriveThru,
        Feature::Cafe,
        Feature::PlayArea,
        Feature::Wifi,
        Feature::Delivery,
        Feature::Parking,
    ];

    /// Display label, also the stored form.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TwentyFourHours => "24 Hours",
            Self::DriveThru => "Drive-Thru",
            Self::Cafe => "McCafe",
            Self::PlayArea => "PlayPlace",
            Self::Wifi => "WiFi",
            Self::Delivery => "Delivery",
            Self::Parking => "Parking",
        }
    }

    /// Lowercase keywords whose presence in listing text implies this feature.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::TwentyFourHours => &["24 hours", "24hrs", "24/7", "open 24"],
            Self::DriveThru => &["drive-thru", "drive thru", "drive through", "drivethru"],
            Self::Cafe => &["mccafe", "mccafé", "cafe"],
            Self::PlayArea => &["playplace", "play place", "playground"],
            Self::Wifi => &["wifi", "wi-fi", "wireless"],
            Self::Delivery => &["mcdelivery", "delivery"],
            Self::Parking => &["parking", "car park"],
        }
    }

    /// Parse a stored label back into a feature.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of the geocoding stage for one outlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodingStatus {
    /// Coordinates were resolved and validated
    Success,
    /// No usable coordinates
    Failed,
}

impl fmt::Display for GeocodingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Where an outlet's coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Parsed out of a captured navigation-link URL
    NavigationLink,
    /// Looked up through the address geocoding service
    Geocoded,
    /// Nothing resolved
    Failed,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NavigationLink => write!(f, "navigation_link"),
            Self::Geocoded => write!(f, "geocoded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Grade of a coordinate pair relative to the metro bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaClass {
    /// Inside the central box
    Central,
    /// Inside the greater-area box only
    GreaterArea,
    /// Outside both boxes
    Outside,
}

impl fmt::Display for AreaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Central => write!(f, "central"),
            Self::GreaterArea => write!(f, "greater_area"),
            Self::Outside => write!(f, "outside"),
        }
    }
}

/// Geocoding metadata attached to a draft once the geocoding stage ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingInfo {
    /// Success or failure
    pub status: GeocodingStatus,
    /// Confidence in 0..=1, rounded to two decimals
    pub confidence: f64,
    /// Source of the coordinates
    pub location_type: LocationType,
    /// Validator grade, when coordinates were validated
    pub area: Option<AreaClass>,
    /// Address variant or provider display name behind the match
    pub matched_query: Option<String>,
    /// Validator issues and failure reasons
    pub issues: Vec<String>,
}

impl GeocodingInfo {
    /// Metadata for a failed geocoding stage.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: GeocodingStatus::Failed,
            confidence: 0.0,
            location_type: LocationType::Failed,
            area: None,
            matched_query: None,
            issues: vec![reason.into()],
        }
    }
}

/// An outlet record built incrementally during one scrape pass.
///
/// Coordinates and geocoding metadata are only set through
/// [`OutletDraft::apply_geocode_success`] and
/// [`OutletDraft::apply_geocode_failure`], which keep the status and the
/// coordinate fields consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutletDraft {
    /// Brand-prefixed outlet name
    pub name: String,
    /// Cleaned free-text address
    pub address: String,
    /// Opening hours as listed
    pub operating_hours: Option<String>,
    /// Contact number
    pub phone: Option<String>,
    /// Detected amenity tags
    pub features: BTreeSet<Feature>,
    /// Captured navigation-service URL
    pub navigation_link: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    geocoding: Option<GeocodingInfo>,
}

impl OutletDraft {
    /// Start a draft with the two required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            operating_hours: None,
            phone: None,
            features: BTreeSet::new(),
            navigation_link: None,
            latitude: None,
            longitude: None,
            geocoding: None,
        }
    }

    /// Resolved coordinates, present only after a successful geocoding stage.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Latitude, if resolved.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    /// Longitude, if resolved.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    /// Geocoding metadata, absent until the geocoding stage ran.
    #[must_use]
    pub fn geocoding(&self) -> Option<&GeocodingInfo> {
        self.geocoding.as_ref()
    }

    /// Whether the geocoding stage resolved coordinates.
    #[must_use]
    pub fn is_geocoded(&self) -> bool {
        self.geocoding
            .as_ref()
            .is_some_and(|g| g.status == GeocodingStatus::Success)
    }

    /// Record a successful geocoding result.
    ///
    /// # Errors
    /// Returns `OutpostError::Validation` if the pair is outside global bounds
    /// or the metadata does not carry a success status; the draft is left
    /// unchanged in that case.
    pub fn apply_geocode_success(
        &mut self,
        coordinates: Coordinates,
        info: GeocodingInfo,
    ) -> Result<(), OutpostError> {
        if !coordinates.is_within_global_bounds() {
            return Err(OutpostError::Validation(format!(
                "coordinates out of global bounds: {coordinates}"
            )));
        }
        if info.status != GeocodingStatus::Success {
            return Err(OutpostError::Validation(
                "success metadata must carry a success status".to_string(),
            ));
        }

        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
        self.geocoding = Some(info);
        Ok(())
    }

    /// Record a failed geocoding stage, clearing any coordinates.
    pub fn apply_geocode_failure(&mut self, info: GeocodingInfo) {
        let info = if info.status == GeocodingStatus::Failed {
            info
        } else {
            GeocodingInfo {
                status: GeocodingStatus::Failed,
                location_type: LocationType::Failed,
                ..info
            }
        };
        self.latitude = None;
        self.longitude = None;
        self.geocoding = Some(info);
    }

    /// Whether the address is a real extracted value rather than the placeholder.
    #[must_use]
    pub fn has_address(&self) -> bool {
        let address = self.address.trim();
        !address.is_empty() && address != ADDRESS_PLACEHOLDER
    }

    /// Minimum bar for storing a draft: a brand-bearing name and a usable address.
    #[must_use]
    pub fn is_persistable(&self, brand: &str) -> bool {
        let name = self.name.trim();
        !name.is_empty()
            && name.to_lowercase().contains(&brand.to_lowercase())
            && !name.ends_with(" Unknown")
            && self.has_address()
            && self.address.trim().chars().count() >= MIN_ADDRESS_LEN
    }
}

/// In-run deduplication key: the exact concatenation `name + "-" + address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey(String);

impl DedupKey {
    /// Build the key from its two parts.
    #[must_use]
    pub fn new(name: &str, address: &str) -> Self {
        Self(format!("{name}-{address}"))
    }

    /// Key for a draft.
    #[must_use]
    pub fn of(draft: &OutletDraft) -> Self {
        Self::new(&draft.name, &draft.address)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
