//! Coordinate validation against the metro bounding boxes.
//!
//! A pair is valid when it falls inside the greater-area box. Pairs inside the
//! nested central box score higher; pairs over known water bodies or carrying
//! implausible precision are marked down.

use outpost_core::{AreaClass, Coordinates};
use serde::{Deserialize, Serialize};

const CENTRAL_CONFIDENCE: f64 = 0.9;
const GREATER_AREA_CONFIDENCE: f64 = 0.7;
const WATER_PENALTY: f64 = 0.2;
const PRECISION_PENALTY: f64 = 0.1;
const MIN_VALID_CONFIDENCE: f64 = 0.1;

/// Survey-grade GPS rarely exceeds six decimal places.
const MAX_DECIMAL_PLACES: usize = 6;

/// Inclusive latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge
    pub min_lat: f64,
    /// Northern edge
    pub max_lat: f64,
    /// Western edge
    pub min_lon: f64,
    /// Eastern edge
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a box from its edges.
    #[must_use]
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Whether the point lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Result of validating one coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    /// Inside the greater-area box
    pub is_valid: bool,
    /// Which box the pair falls in
    pub area: AreaClass,
    /// 0 for invalid pairs, otherwise 0.1..=0.9
    pub confidence: f64,
    /// Human-readable reasons for any mark-down
    pub issues: Vec<String>,
}

/// Classifies coordinate pairs against fixed geographic bounds.
#[derive(Debug, Clone)]
pub struct CoordinateValidator {
    greater_area: BoundingBox,
    central: BoundingBox,
    water_bodies: Vec<BoundingBox>,
}

impl Default for CoordinateValidator {
    fn default() -> Self {
        Self::kuala_lumpur()
    }
}

impl CoordinateValidator {
    /// Bounds for the Kuala Lumpur metro area.
    #[must_use]
    pub fn kuala_lumpur() -> Self {
        Self {
            greater_area: BoundingBox::new(2.9, 3.4, 101.5, 101.9),
            central: BoundingBox::new(3.0, 3.25, 101.6, 101.8),
            water_bodies: vec![
                // Titiwangsa lake
                BoundingBox::new(3.176, 3.184, 101.703, 101.709),
                // Perdana Botanical Garden lake
                BoundingBox::new(3.140, 3.146, 101.683, 101.689),
                // Kepong Metropolitan Park lake
                BoundingBox::new(3.208, 3.215, 101.632, 101.640),
            ],
        }
    }

    /// Validator with custom bounds.
    #[must_use]
    pub fn with_bounds(
        greater_area: BoundingBox,
        central: BoundingBox,
        water_bodies: Vec<BoundingBox>,
    ) -> Self {
        Self {
            greater_area,
            central,
            water_bodies,
        }
    }

    /// Classify a coordinate pair.
    #[must_use]
    pub fn validate(&self, point: Coordinates) -> Validation {
        if !self.greater_area.contains(point) {
            return Validation {
                is_valid: false,
                area: AreaClass::Outside,
                confidence: 0.0,
                issues: vec![format!("coordinates {point} outside metro bounds")],
            };
        }

        let (area, mut confidence) = if self.central.contains(point) {
            (AreaClass::Central, CENTRAL_CONFIDENCE)
        } else {
            (AreaClass::GreaterArea, GREATER_AREA_CONFIDENCE)
        };
        let mut issues = Vec::new();

        if self.water_bodies.iter().any(|b| b.contains(point)) {
            confidence -= WATER_PENALTY;
            issues.push("coordinates fall on a water body".to_string());
        }

        if decimal_places(point.latitude) > MAX_DECIMAL_PLACES
            || decimal_places(point.longitude) > MAX_DECIMAL_PLACES
        {
            confidence -= PRECISION_PENALTY;
            issues.push("coordinates carry implausible precision".to_string());
        }

        Validation {
            is_valid: true,
            area,
            confidence: round2(confidence.max(MIN_VALID_CONFIDENCE)),
            issues,
        }
    }
}

/// Number of digits after the decimal point in the shortest round-trip form.
fn decimal_places(value: f64) -> usize {
    let repr = value.to_string();
    repr.split_once('.').map_or(0, |(_, frac)| frac.len())
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_central_point() {
        let report = CoordinateValidator::default().validate(Coordinates::new(3.1578, 101.7123));
        assert!(report.is_valid);
        assert_eq!(report.area, AreaClass::Central);
        assert!(approx(report.confidence, 0.9));
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_greater_area_point() {
        let report = CoordinateValidator::default().validate(Coordinates::new(3.3, 101.55));
        assert!(report.is_valid);
        assert_eq!(report.area, AreaClass::GreaterArea);
        assert!(approx(report.confidence, 0.7));
    }

    #[test]
    fn test_outside_point() {
        let report = CoordinateValidator::default().validate(Coordinates::new(5.4164, 100.3327));
        assert!(!report.is_valid);
        assert_eq!(report.area, AreaClass::Outside);
        assert!(approx(report.confidence, 0.0));
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_water_body_penalty() {
        let report = CoordinateValidator::default().validate(Coordinates::new(3.18, 101.706));
        assert!(report.is_valid);
        assert!(approx(report.confidence, 0.7));
        assert!(report.issues.iter().any(|i| i.contains("water")));
    }

    #[test]
    fn test_precision_penalty() {
        let report =
            CoordinateValidator::default().validate(Coordinates::new(3.157_812_34, 101.7123));
        assert!(approx(report.confidence, 0.8));
        assert!(report.issues.iter().any(|i| i.contains("precision")));
    }

    #[test]
    fn test_confidence_floor() {
        let validator = CoordinateValidator::with_bounds(
            BoundingBox::new(0.0, 10.0, 100.0, 110.0),
            BoundingBox::new(0.0, 0.0, 0.0, 0.0),
            vec![BoundingBox::new(3.0, 3.5, 101.0, 102.0)],
        );
        // 0.7 - 0.2 water - 0.1 precision = 0.4, still above the floor
        let report = validator.validate(Coordinates::new(3.123_456_789, 101.5));
        assert!(approx(report.confidence, 0.4));
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(3.0), 0);
        assert_eq!(decimal_places(3.1570), 3);
        assert_eq!(decimal_places(101.710_931), 6);
    }

    #[test]
    fn test_box_edges_inclusive() {
        let b = BoundingBox::new(2.9, 3.4, 101.5, 101.9);
        assert!(b.contains(Coordinates::new(2.9, 101.9)));
        assert!(!b.contains(Coordinates::new(3.41, 101.7)));
    }
}
