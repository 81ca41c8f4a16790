//! Coordinate extraction from navigation-service URLs.
//!
//! Navigation links encode the destination in several shapes
//! (`to=ll.<lat>%2C<lon>`, `ll=<lat>,<lon>`, `lat=..&lon=..`, ...). Patterns
//! are tried in priority order and the first one that matches decides.

use once_cell::sync::Lazy;
use outpost_core::Coordinates;
use regex::Regex;

/// Latitude range accepted for navigation-link coordinates.
const COUNTRY_LAT: (f64, f64) = (1.0, 7.0);

/// Longitude range accepted for navigation-link coordinates.
const COUNTRY_LON: (f64, f64) = (99.0, 119.0);

/// Coordinate encodings, most specific first.
static LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NUM: &str = r"([+-]?\d+(?:\.\d+)?)";
    [
        format!(r"(?i)to=ll\.{NUM}%2C{NUM}"),
        format!(r"(?i)\bll={NUM}(?:,|%2C){NUM}"),
        format!(r"(?i)navigate\?lat={NUM}&lon={NUM}"),
        format!(r"(?i)\blat={NUM}&(?:lon|lng)={NUM}"),
        format!(r"(?i)[?&]q={NUM}(?:,|%2C){NUM}"),
        format!(r"(?i)[?&]at={NUM}(?:,|%2C){NUM}"),
        format!(r"(?i)to=ll\.{NUM},{NUM}"),
        format!(r"(?i)ll\.{NUM}%2C{NUM}"),
        format!(r"(?i)ll\.{NUM},{NUM}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid navigation link regex"))
    .collect()
});

/// Extract a destination coordinate pair from a navigation URL.
///
/// Returns `None` when no pattern matches or when the first matching pair
/// lies outside the country bounds.
#[must_use]
pub fn extract_coordinates(url: &str) -> Option<Coordinates> {
    for pattern in LINK_PATTERNS.iter() {
        let Some(caps) = pattern.captures(url) else {
            continue;
        };
        let (Ok(latitude), Ok(longitude)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>())
        else {
            continue;
        };

        let point = Coordinates::new(latitude, longitude);
        if within_country(point) {
            return Some(point);
        }

        tracing::debug!(url, %point, "navigation link coordinates outside country bounds");
        return None;
    }

    None
}

fn within_country(point: Coordinates) -> bool {
    (COUNTRY_LAT.0..=COUNTRY_LAT.1).contains(&point.latitude)
        && (COUNTRY_LON.0..=COUNTRY_LON.1).contains(&point.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_to_ll() {
        let point = extract_coordinates(
            "https://www.waze.com/live-map/directions?to=ll.3.146847%2C101.710931&from=place",
        )
        .expect("coordinates");
        assert_eq!(point, Coordinates::new(3.146_847, 101.710_931));
    }

    #[test]
    fn test_ll_param() {
        let point = extract_coordinates("https://waze.com/ul?ll=3.1570,101.7123&navigate=yes")
            .expect("coordinates");
        assert_eq!(point, Coordinates::new(3.1570, 101.7123));
    }

    #[test]
    fn test_lat_lon_params() {
        let point = extract_coordinates("waze://?navigate?lat=3.1390&lon=101.6869")
            .expect("coordinates");
        assert_eq!(point, Coordinates::new(3.1390, 101.6869));

        let point =
            extract_coordinates("https://waze.com/ul?lat=3.2&lng=101.65").expect("coordinates");
        assert_eq!(point, Coordinates::new(3.2, 101.65));
    }

    #[test]
    fn test_query_and_at_params() {
        assert_eq!(
            extract_coordinates("https://waze.com/ul?q=3.1,101.7"),
            Some(Coordinates::new(3.1, 101.7))
        );
        assert_eq!(
            extract_coordinates("https://waze.com/ul?at=3.05,101.75&zoom=17"),
            Some(Coordinates::new(3.05, 101.75))
        );
    }

    #[test]
    fn test_plain_ll_dot_forms() {
        assert_eq!(
            extract_coordinates("https://www.waze.com/en/live-map/directions?to=ll.3.15,101.71"),
            Some(Coordinates::new(3.15, 101.71))
        );
        assert_eq!(
            extract_coordinates("https://www.waze.com/live-map?from=ll.3.12%2C101.68"),
            Some(Coordinates::new(3.12, 101.68))
        );
    }

    #[test]
    fn test_out_of_country_rejected() {
        assert_eq!(extract_coordinates("https://waze.com/ul?ll=40.7128,-74.0060"), None);
    }

    #[test]
    fn test_no_coordinates() {
        assert_eq!(extract_coordinates("https://waze.com/ul?q=McDonalds%20KLCC"), None);
        assert_eq!(extract_coordinates(""), None);
    }
}
