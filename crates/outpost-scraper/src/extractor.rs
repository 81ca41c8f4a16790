//! Field extraction from a single outlet listing.
//!
//! Listing text is loosely structured: a name line, one or two address
//! lines, contact details and a navigation control. Extraction never fails;
//! missing fields fall back to placeholders or `None`.

use once_cell::sync::Lazy;
use outpost_browser::is_navigation_url;
use outpost_core::{Feature, OutletDraft, ADDRESS_PLACEHOLDER};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

const DEFAULT_CITY: &str = "Kuala Lumpur";
const DEFAULT_COUNTRY: &str = "Malaysia";

/// Name lines at or above this length are treated as noise.
const MAX_NAME_LEN: usize = 100;

/// Cleaned lines at or below this length are ignored for addresses.
const MIN_LINE_LEN: usize = 5;

/// A second address line is appended only when shorter than this.
const MAX_SECOND_LINE_LEN: usize = 50;

/// Last-resort address candidates must be longer than this.
const MIN_FALLBACK_ADDRESS_LEN: usize = 20;

/// Street and building keywords marking a line as an address.
const ADDRESS_KEYWORDS: [&str; 11] = [
    "jalan",
    "jln",
    "road",
    "street",
    "avenue",
    "lot",
    "ground floor",
    "level",
    "mall",
    "complex",
    "kl",
];

/// Keywords that make a short second line worth appending.
const AREA_KEYWORDS: [&str; 3] = ["kl", "selangor", "wilayah"];

/// Markers of contact-detail lines.
const CONTACT_MARKERS: [&str; 5] = ["tel:", "fax:", "phone:", "email:", "@"];

/// Literal markers of round-the-clock opening.
const ALL_DAY_MARKERS: [&str; 4] = ["24 hours", "24hrs", "open 24", "24/7"];

static JSON_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*":\s*""#).expect("valid json key regex"));

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space regex"));

static PHONE_LINE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\b03-\d{8}\b", r"\b\d{3}-\d{8}\b"]
        .iter()
        .map(|p| Regex::new(p).expect("valid phone line regex"))
        .collect()
});

static HOURS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\d{1,2}:\d{2}\s*(?:AM|PM)?\s*-\s*\d{1,2}:\d{2}\s*(?:AM|PM)?",
        r"(?i)\d{1,2}\.\d{2}\s*(?:AM|PM)?\s*-\s*\d{1,2}\.\d{2}\s*(?:AM|PM)?",
        r"(?i)\b(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)[^\n]*?\d{1,2}:\d{2}",
        r"(?i)24\s*(?:hours|hrs)",
        r"(?i)Open\s+24\s+hours",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid hours regex"))
    .collect()
});

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b03-\d{8}",
        r"\b03-\d{4}\s*\d{4}",
        r"\+60\s*3-?\d{8}",
        r"\b03\s*\d{8}",
        r"\b01\d-\d{7,8}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid phone regex"))
    .collect()
});

static TEXT_NAV_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?waze\.com/ul\S*").expect("valid nav link regex")
});

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

static LABELLED: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[alt], [title]").expect("valid selector"));

/// Builds [`OutletDraft`]s from listing text and markup
#[derive(Debug, Clone)]
pub struct OutletFieldExtractor {
    brand: String,
    city: String,
    country: String,
    name_fallback: Regex,
}

impl OutletFieldExtractor {
    /// Create an extractor for a brand token, e.g. `McDonald's`
    pub fn new(brand: &str) -> Self {
        let name_fallback = Regex::new(&format!("{}[^,\n]*", regex::escape(brand)))
            .unwrap_or_else(|_| Regex::new(r"[^,\n]+").expect("valid fallback regex"));
        Self {
            brand: brand.to_string(),
            city: DEFAULT_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            name_fallback,
        }
    }

    /// Use a different city and country when recognising address lines
    #[must_use]
    pub fn with_locality(mut self, city: &str, country: &str) -> Self {
        self.city = city.to_string();
        self.country = country.to_string();
        self
    }

    /// Build a draft. With `markup` the navigation link comes from the
    /// anchors in it; without, from a link pattern in the text.
    pub fn extract(&self, text: &str, markup: Option<&str>) -> OutletDraft {
        let mut draft = OutletDraft::new(self.name(text), self.address(text));
        draft.operating_hours = hours(text);
        draft.phone = phone(text);

        let labels = markup.map(attribute_text).unwrap_or_default();
        draft.features = features(text, &labels);
        draft.navigation_link = match markup {
            Some(markup) => navigation_link_from_markup(markup),
            None => navigation_link_from_text(text),
        };

        tracing::debug!(
            name = %draft.name,
            has_phone = draft.phone.is_some(),
            has_hours = draft.operating_hours.is_some(),
            features = draft.features.len(),
            "extracted outlet fields"
        );
        draft
    }

    /// Outlet name, always carrying the brand as prefix
    pub fn name(&self, text: &str) -> String {
        for line in non_empty_lines(text) {
            let clean = strip_json_noise(line, true);
            if clean.contains(&self.brand) && clean.chars().count() < MAX_NAME_LEN {
                if clean.starts_with(&self.brand) {
                    return clean;
                }
                let rest = collapse_spaces(&clean.replace(&self.brand, ""));
                return format!("{} {rest}", self.brand);
            }
        }

        for line in non_empty_lines(text) {
            if let Some(m) = self.name_fallback.find(line) {
                return m.as_str().trim().to_string();
            }
        }

        format!("{} Unknown", self.brand)
    }

    /// Street address without contact details
    pub fn address(&self, text: &str) -> String {
        let city = self.city.to_lowercase();
        let country = self.country.to_lowercase();
        let brand = self.brand.to_lowercase();

        let lines: Vec<String> = non_empty_lines(text)
            .map(|line| strip_json_noise(line, false))
            .filter(|line| line.chars().count() > MIN_LINE_LEN)
            .collect();

        let candidates: Vec<&String> = lines
            .iter()
            .filter(|line| !is_contact_line(line) && !line.to_lowercase().contains(&brand))
            .filter(|line| {
                let lower = line.to_lowercase();
                ADDRESS_KEYWORDS.iter().any(|k| lower.contains(k))
                    || lower.contains(&city)
                    || lower.contains(&country)
            })
            .collect();

        if let Some(primary) = candidates.first() {
            let mut address = (*primary).clone();
            if let Some(second) = candidates.get(1) {
                let lower = second.to_lowercase();
                let adds_area = lower.contains(&city)
                    || lower.contains(&country)
                    || AREA_KEYWORDS.iter().any(|k| lower.contains(k));
                if second.chars().count() < MAX_SECOND_LINE_LEN && adds_area {
                    address = format!("{address}, {second}");
                }
            }
            return collapse_spaces(&address);
        }

        let located = lines.iter().find(|line| {
            let lower = line.to_lowercase();
            !is_contact_line(line)
                && !lower.contains(&brand)
                && (["jalan", "jln", "road", "street"]
                    .iter()
                    .any(|k| lower.contains(k))
                    || lower.contains(&city)
                    || lower.contains(&country))
        });
        if let Some(line) = located {
            return collapse_spaces(line);
        }

        lines
            .iter()
            .filter(|line| {
                line.chars().count() > MIN_FALLBACK_ADDRESS_LEN
                    && !line.to_lowercase().contains(&brand)
                    && !PHONE_LINE[0].is_match(line)
            })
            .max_by_key(|line| line.chars().count())
            .map_or_else(|| ADDRESS_PLACEHOLDER.to_string(), |line| collapse_spaces(line))
    }
}

/// Opening hours as listed, or `24 Hours` for round-the-clock outlets
pub fn hours(text: &str) -> Option<String> {
    for pattern in HOURS_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            return Some(m.as_str().trim().to_string());
        }
    }

    let lower = text.to_lowercase();
    ALL_DAY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
        .then(|| "24 Hours".to_string())
}

/// First phone number in the text
pub fn phone(text: &str) -> Option<String> {
    PHONE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

/// Features whose keywords appear in the text or in `alt`/`title` labels
pub fn features(text: &str, labels: &str) -> BTreeSet<Feature> {
    let haystack = format!("{text} {labels}").to_lowercase();
    Feature::ALL
        .into_iter()
        .filter(|feature| feature.keywords().iter().any(|k| haystack.contains(k)))
        .collect()
}

/// First anchor pointing at the navigation service
pub fn navigation_link_from_markup(markup: &str) -> Option<String> {
    let fragment = Html::parse_fragment(markup);
    fragment
        .select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| is_navigation_url(href))
        .map(ToString::to_string)
}

/// Navigation-service URL written out in plain text
pub fn navigation_link_from_text(text: &str) -> Option<String> {
    TEXT_NAV_LINK.find(text).map(|m| {
        let link = m.as_str();
        if link.to_lowercase().starts_with("http") {
            link.to_string()
        } else {
            format!("https://{link}")
        }
    })
}

/// `alt` and `title` attribute values, space separated
fn attribute_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    fragment
        .select(&LABELLED)
        .flat_map(|el| [el.value().attr("alt"), el.value().attr("title")])
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Remove `"key": "` fragments and JSON punctuation. Commas are kept
/// unless `strip_commas` is set.
fn strip_json_noise(line: &str, strip_commas: bool) -> String {
    let without_keys = JSON_KEY.replace_all(line, "");
    let cleaned: String = without_keys
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '"') && !(strip_commas && *c == ','))
        .collect();
    collapse_spaces(&cleaned)
}

fn collapse_spaces(text: &str) -> String {
    SPACES.replace_all(text, " ").trim().to_string()
}

fn is_contact_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    CONTACT_MARKERS.iter().any(|m| lower.contains(m))
        || PHONE_LINE.iter().any(|p| p.is_match(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KLCC: &str = "McDonald's KLCC\nLot 2.36.00 Jalan Ampang, Kuala Lumpur\nTel: 03-21662188\nWaze";

    fn extractor() -> OutletFieldExtractor {
        OutletFieldExtractor::new("McDonald's")
    }

    #[test]
    fn test_extract_listing() {
        let draft = extractor().extract(KLCC, None);

        assert_eq!(draft.name, "McDonald's KLCC");
        assert_eq!(draft.address, "Lot 2.36.00 Jalan Ampang, Kuala Lumpur");
        assert_eq!(draft.phone.as_deref(), Some("03-21662188"));
        assert!(draft.operating_hours.is_none());
        assert!(draft.features.is_empty());
        assert!(draft.navigation_link.is_none());
    }

    #[test]
    fn test_name_gets_brand_prefix() {
        let name = extractor().name("Drive-Thru McDonald's Sentul\nJalan Sentul");
        assert_eq!(name, "McDonald's Drive-Thru Sentul");
    }

    #[test]
    fn test_name_strips_json_noise() {
        let name = extractor().name(r#"{"name": "McDonald's Bangsar",}"#);
        assert_eq!(name, "McDonald's Bangsar");
    }

    #[test]
    fn test_name_placeholder() {
        assert_eq!(extractor().name("Jalan Ampang\n03-21662188"), "McDonald's Unknown");
    }

    #[test]
    fn test_address_appends_area_line() {
        let text = "McDonald's Sentul\nNo. 1, Jalan Sentul Pasar\n51000 Kuala Lumpur\nTel: 03-40431234";
        assert_eq!(
            extractor().address(text),
            "No. 1, Jalan Sentul Pasar, 51000 Kuala Lumpur"
        );
    }

    #[test]
    fn test_address_skips_contact_lines() {
        let text = "McDonald's Cheras\nEmail: cheras@example.com\nPhone: 03-91301234\nLot 5 Jalan Cheras";
        assert_eq!(extractor().address(text), "Lot 5 Jalan Cheras");
    }

    #[test]
    fn test_address_longest_line_fallback() {
        let text = "McDonald's Somewhere\nBeside the big roundabout near the hospital\nOpen daily";
        assert_eq!(
            extractor().address(text),
            "Beside the big roundabout near the hospital"
        );
    }

    #[test]
    fn test_address_placeholder() {
        assert_eq!(extractor().address("McDonald's X\nWaze"), ADDRESS_PLACEHOLDER);
    }

    #[test]
    fn test_hours_patterns() {
        assert_eq!(hours("Open 7:00 AM - 11:00 PM daily").as_deref(), Some("7:00 AM - 11:00 PM"));
        assert_eq!(hours("Hours 7.00am - 10.30pm").as_deref(), Some("7.00am - 10.30pm"));
        assert_eq!(hours("Open 24 Hours").as_deref(), Some("24 Hours"));
        assert_eq!(hours("Open 24/7").as_deref(), Some("24 Hours"));
        assert!(hours("Lot 2.36.00 Jalan Ampang").is_none());
    }

    #[test]
    fn test_phone_patterns() {
        assert_eq!(phone("Tel: 03-2166 2188").as_deref(), Some("03-2166 2188"));
        assert_eq!(phone("Call +60 3-21662188").as_deref(), Some("+60 3-21662188"));
        assert_eq!(phone("Hotline 012-3456789").as_deref(), Some("012-3456789"));
        assert!(phone("No contact").is_none());
    }

    #[test]
    fn test_features_from_text_and_labels() {
        let found = features("Drive-Thru available, free WiFi", "McCafe PlayPlace");
        assert!(found.contains(&Feature::DriveThru));
        assert!(found.contains(&Feature::Wifi));
        assert!(found.contains(&Feature::Cafe));
        assert!(found.contains(&Feature::PlayArea));
        assert!(!found.contains(&Feature::Parking));
    }

    #[test]
    fn test_feature_labels_from_markup() {
        let markup = r#"<div><img alt="Drive-Thru" src="dt.png"><span title="McDelivery"></span></div>"#;
        let draft = extractor().extract(KLCC, Some(markup));
        assert!(draft.features.contains(&Feature::DriveThru));
        assert!(draft.features.contains(&Feature::Delivery));
    }

    #[test]
    fn test_navigation_link_from_markup() {
        let markup = r#"<a href="tel:0321662188">Call</a><a href="https://www.waze.com/ul?ll=3.1578,101.7123">Waze</a>"#;
        assert_eq!(
            navigation_link_from_markup(markup).as_deref(),
            Some("https://www.waze.com/ul?ll=3.1578,101.7123")
        );
        assert!(navigation_link_from_markup("<a href=\"/menu\">Menu</a>").is_none());
    }

    #[test]
    fn test_navigation_link_from_text() {
        assert_eq!(
            navigation_link_from_text("Directions: waze.com/ul?ll=3.1,101.7 today").as_deref(),
            Some("https://waze.com/ul?ll=3.1,101.7")
        );
        assert!(navigation_link_from_text("no link here").is_none());
    }
}
