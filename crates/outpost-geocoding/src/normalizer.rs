//! Address cleaning and variant generation.
//!
//! Listing addresses carry phone numbers, e-mails and local abbreviations
//! that confuse a geocoder. [`AddressNormalizer::clean`] strips that noise and
//! guarantees city and country suffixes; [`AddressNormalizer::variants`]
//! derives progressively simpler queries, ending in the bare city name.

use once_cell::sync::Lazy;
use regex::Regex;

/// Variants shorter than this are dropped.
const MIN_VARIANT_LEN: usize = 3;

/// Contact-info noise removed before geocoding.
static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:tel|fax|phone)\s*:?\s*[\d\s\-+()]+",
        r"\+60\s*3-?\d{8}",
        r"\b03-\d{4}\s*\d{4}\b",
        r"\b03-\d{8}\b",
        r"\b\d{3}-\d{7,8}\b",
        r"\S+@\S+\.\S+",
        r"(?i)\bhttps?://\S+",
        r"(?i)\bwww\.\S+",
        r"\b\d{8,}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid noise regex"))
    .collect()
});

/// Local abbreviations and their expansions.
static ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\bJln\b\.?", "Jalan"),
        (r"(?i)\bRd\b\.?", "Road"),
        (r"(?i)\bSt\b\.?", "Street"),
        (r"(?i)\bAve\b\.?", "Avenue"),
        (r"(?i)\bBlvd\b\.?", "Boulevard"),
        (r"(?i)\bW\.\s?P\.", "Wilayah Persekutuan"),
        (r"(?i)\bWP\b", "Wilayah Persekutuan"),
        (r"(?i)\bKL\b", "Kuala Lumpur"),
    ]
    .iter()
    .map(|(p, r)| (Regex::new(p).expect("valid abbreviation regex"), *r))
    .collect()
});

/// District names, tried in order; the first match becomes a variant.
static AREA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bBukit\s+\w+",
        r"(?i)\bBangsar(?:\s+South)?\b",
        r"(?i)\bMont\s+Kiara\b",
        r"(?i)\bTaman\s+Tun\s+Dr\.?\s+Ismail\b",
        r"\bTTDI\b",
        r"(?i)\bCheras\b",
        r"(?i)\bKepong\b",
        r"(?i)\bSentul\b",
        r"(?i)\bAmpang\b",
        r"(?i)\bSri\s+Petaling\b",
        r"(?i)\bPetaling\b",
        r"(?i)\bSetapak\b",
        r"(?i)\bWangsa\s+Maju\b",
        r"(?i)\bDanau\s+Kota\b",
        r"(?i)\bBrickfields\b",
        r"(?i)\bDesa\s+\w+",
        r"(?i)\bTaman\s+\w+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid area regex"))
    .collect()
});

/// Well-known landmarks, longest names first so the specific one wins.
const LANDMARKS: &[&str] = &[
    "Berjaya Times Square",
    "Times Square",
    "Suria KLCC",
    "KLCC",
    "Pavilion",
    "Mid Valley",
    "NU Sentral",
    "KL Sentral",
    "Sunway Velocity",
    "MyTown",
    "Intermark",
    "Sogo",
];

static STREET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bJalan\s+([^,]+)").expect("valid street regex"));

static STRUCTURAL_NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\([^)]*\)",
        r"(?i)\b(?:ground|first|second|lower ground|upper ground)\s+floor\b,?",
        r"(?i)\b(?:floor|level|unit|lot)\s+[\w.\-/]+,?",
        r"(?i)\bno\.?\s*\d[\w.\-/]*,?",
        r"(?i)\b[GL]\d*[-.]\d+[\w.\-]*,?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid structural regex"))
    .collect()
});

static OUTLET_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:DT|SF|Drive[- ]?Thru)\s*$").expect("valid outlet suffix regex")
});

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid space regex"));

static COMMAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,(?:\s*,)*\s*").expect("valid comma regex"));

/// Cleans raw listing addresses and derives geocoding query variants.
#[derive(Debug, Clone)]
pub struct AddressNormalizer {
    city: String,
    country: String,
    brand: String,
    country_suffix: Regex,
}

impl AddressNormalizer {
    /// Create a normalizer for one city/country pair and outlet brand.
    #[must_use]
    pub fn new(city: impl Into<String>, country: impl Into<String>, brand: impl Into<String>) -> Self {
        let country = country.into();
        let country_suffix = Regex::new(&format!(r"(?i),?\s*{}\s*$", regex::escape(&country)))
            .expect("escaped country regex");
        Self {
            city: city.into(),
            country,
            brand: brand.into(),
            country_suffix,
        }
    }

    /// Strip contact noise, expand abbreviations and ensure city and country
    /// appear in the result.
    #[must_use]
    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.replace(['\n', '\r'], ", ");

        for pattern in NOISE_PATTERNS.iter() {
            text = pattern.replace_all(&text, " ").into_owned();
        }
        for (pattern, expansion) in ABBREVIATIONS.iter() {
            text = pattern.replace_all(&text, *expansion).into_owned();
        }

        let mut cleaned = tidy(&text);

        let lower = cleaned.to_lowercase();
        if !lower.contains(&self.city.to_lowercase()) {
            cleaned = join_parts(&cleaned, &self.city);
        }
        if !lower.contains(&self.country.to_lowercase()) {
            cleaned = join_parts(&cleaned, &self.country);
        }

        cleaned
    }

    /// Ordered, de-duplicated geocoding queries for a cleaned address.
    ///
    /// Most specific first: the full address without the country, the street
    /// name, a district, a landmark, the location named in the outlet title,
    /// a structurally simplified address, then the bare city.
    #[must_use]
    pub fn variants(&self, cleaned: &str, outlet_name: Option<&str>) -> Vec<String> {
        let base = tidy(&self.country_suffix.replace(cleaned, ""));
        let mut candidates = vec![base.clone()];

        if let Some(caps) = STREET.captures(&base) {
            let street = caps[1].trim();
            if !street.is_empty() {
                candidates.push(format!("Jalan {street}, {}", self.city));
                candidates.push(format!("{street}, {}", self.city));
            }
        }

        if let Some(area) = AREA_PATTERNS.iter().find_map(|p| p.find(&base)) {
            candidates.push(format!("{}, {}", area.as_str(), self.city));
        }

        let lower = base.to_lowercase();
        if let Some(landmark) = LANDMARKS
            .iter()
            .find(|l| lower.contains(&l.to_lowercase()))
        {
            candidates.push(format!("{landmark}, {}", self.city));
        }

        if let Some(location) = outlet_name.and_then(|name| self.location_from_name(name)) {
            candidates.push(format!("{location}, {}", self.city));
        }

        let mut simplified = base.clone();
        for pattern in STRUCTURAL_NOISE.iter() {
            simplified = pattern.replace_all(&simplified, " ").into_owned();
        }
        let simplified = tidy(&simplified);
        if simplified != base {
            candidates.push(simplified);
        }

        candidates.push(self.city.clone());

        let mut seen = std::collections::HashSet::new();
        candidates
            .into_iter()
            .filter(|v| v.chars().count() >= MIN_VARIANT_LEN)
            .filter(|v| seen.insert(v.to_lowercase()))
            .collect()
    }

    /// Location words from an outlet title such as `McDonald's Bangsar DT`.
    fn location_from_name(&self, name: &str) -> Option<String> {
        let trimmed = name.trim();
        let rest = if trimmed
            .to_lowercase()
            .starts_with(&self.brand.to_lowercase())
        {
            trimmed.get(self.brand.len()..).unwrap_or("")
        } else {
            trimmed
        };
        let location = OUTLET_SUFFIX.replace(rest, "");
        let location = location.trim();
        (location.chars().count() >= MIN_VARIANT_LEN).then(|| location.to_string())
    }
}

/// Collapse whitespace, normalise comma spacing and trim stray separators.
fn tidy(text: &str) -> String {
    let text = SPACES.replace_all(text, " ");
    let text = COMMAS.replace_all(&text, ", ");
    text.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

fn join_parts(head: &str, tail: &str) -> String {
    if head.is_empty() {
        tail.to_string()
    } else {
        format!("{head}, {tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> AddressNormalizer {
        AddressNormalizer::new("Kuala Lumpur", "Malaysia", "McDonald's")
    }

    #[test]
    fn test_clean_strips_contact_noise() {
        let cleaned = normalizer().clean(
            "Lot 1, Jln Ampang, Tel: 03-12345678, +60 3-12345678, info@example.com.my",
        );
        assert!(!cleaned.contains("12345678"), "phone left in {cleaned}");
        assert!(!cleaned.contains('@'), "email left in {cleaned}");
        assert!(cleaned.contains("Jalan Ampang"));
        assert!(cleaned.contains("Kuala Lumpur"));
        assert!(cleaned.ends_with("Malaysia"));
    }

    #[test]
    fn test_clean_strips_bare_phone_numbers() {
        let cleaned = normalizer().clean("No 5, Jalan Telawi 03-1234 5678 Bangsar");
        assert!(!cleaned.contains("5678"));
        assert!(cleaned.contains("Bangsar"));
    }

    #[test]
    fn test_clean_expands_abbreviations() {
        let cleaned = normalizer().clean("12 Jln. Tun Razak, KL");
        assert_eq!(cleaned, "12 Jalan Tun Razak, Kuala Lumpur, Malaysia");
    }

    #[test]
    fn test_clean_keeps_existing_suffixes() {
        let cleaned = normalizer().clean("Jalan Sultan Ismail, 50250 Kuala Lumpur, Malaysia");
        assert_eq!(cleaned, "Jalan Sultan Ismail, 50250 Kuala Lumpur, Malaysia");
    }

    #[test]
    fn test_clean_empty_input_still_has_city_and_country() {
        assert_eq!(normalizer().clean("Tel: 03-12345678"), "Kuala Lumpur, Malaysia");
    }

    #[test]
    fn test_variants_order_and_fallback() {
        let n = normalizer();
        let cleaned = n.clean("Lot G-12, Ground Floor, Mid Valley Megamall, Jalan Bangsar, KL");
        let variants = n.variants(&cleaned, Some("McDonald's Mid Valley"));

        assert_eq!(
            variants[0],
            "Lot G-12, Ground Floor, Mid Valley Megamall, Jalan Bangsar, Kuala Lumpur"
        );
        assert!(variants.contains(&"Jalan Bangsar, Kuala Lumpur".to_string()));
        assert!(variants.contains(&"Bangsar, Kuala Lumpur".to_string()));
        assert!(variants.contains(&"Mid Valley, Kuala Lumpur".to_string()));
        assert_eq!(variants.last().map(String::as_str), Some("Kuala Lumpur"));
    }

    #[test]
    fn test_variants_are_unique() {
        let n = normalizer();
        let cleaned = n.clean("Kuala Lumpur");
        let variants = n.variants(&cleaned, None);
        assert_eq!(variants, vec!["Kuala Lumpur".to_string()]);
    }

    #[test]
    fn test_variants_include_simplified_address() {
        let n = normalizer();
        let cleaned = n.clean("Unit 3A (near LRT), Menara Aik Hua, Changkat Raja Chulan, KL");
        let variants = n.variants(&cleaned, None);
        assert!(
            variants.contains(&"Menara Aik Hua, Changkat Raja Chulan, Kuala Lumpur".to_string()),
            "variants were {variants:?}"
        );
    }

    #[test]
    fn test_location_from_outlet_name() {
        let n = normalizer();
        assert_eq!(
            n.location_from_name("McDonald's Bangsar DT"),
            Some("Bangsar".to_string())
        );
        assert_eq!(n.location_from_name("McDonald's"), None);
    }
}
