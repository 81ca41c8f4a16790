//! Splitting of page text that lists several outlets.
//!
//! Used when no container strategy matched and the whole results region
//! comes back as one block of text.

use crate::error::Result;
use regex::Regex;

/// Accepted blocks must be longer than this.
const MIN_BLOCK_LEN: usize = 50;

/// More blocks than this means the split went wrong.
const MAX_BLOCKS: usize = 100;

/// Keywords an accepted block must contain (lowercase).
const ADDRESS_KEYWORDS: [&str; 11] = [
    "jalan",
    "jln",
    "road",
    "street",
    "avenue",
    "lot",
    "level",
    "mall",
    "complex",
    "kuala lumpur",
    "malaysia",
];

/// Splits multi-outlet text into one block per outlet
#[derive(Debug, Clone)]
pub struct MultiOutletSplitter {
    brand: String,
    /// Newline, then the brand and a capitalised word. Group 1 starts the next block.
    primary: Regex,
    /// Anchor word, newline, brand. Group 1 is the gap between blocks.
    secondary: Regex,
}

impl MultiOutletSplitter {
    /// Create a splitter for a brand token and the navigation anchor word
    pub fn new(brand: &str, anchor: &str) -> Result<Self> {
        let brand_pattern = regex::escape(brand);
        let primary = Regex::new(&format!(r"\n\s*((?i:{brand_pattern})\s+[A-Z])"))?;
        let secondary = Regex::new(&format!(
            r"(?i:{})(\s*\n\s*)(?i:{brand_pattern})",
            regex::escape(anchor)
        ))?;

        Ok(Self {
            brand: brand.to_lowercase(),
            primary,
            secondary,
        })
    }

    /// Split text into outlet blocks. Returns the original text as the
    /// only block when it names at most one outlet or no strategy yields
    /// a plausible split.
    pub fn split(&self, text: &str) -> Vec<String> {
        let occurrences = text.to_lowercase().matches(&self.brand).count();
        if occurrences <= 1 {
            return vec![text.to_string()];
        }

        let primary = self.accept(self.split_primary(text));
        if primary.len() > MAX_BLOCKS {
            tracing::warn!(blocks = primary.len(), "implausible split, keeping text whole");
            return vec![text.to_string()];
        }
        if primary.len() > 1 {
            tracing::debug!(blocks = primary.len(), strategy = "brand-line", "text split");
            return primary;
        }

        let secondary = self.accept(self.split_secondary(text));
        if secondary.len() > 1 && secondary.len() <= MAX_BLOCKS {
            tracing::debug!(blocks = secondary.len(), strategy = "anchor", "text split");
            return secondary;
        }

        tracing::debug!(occurrences, "no split strategy applied");
        vec![text.to_string()]
    }

    fn split_primary<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for captures in self.primary.captures_iter(text) {
            if let Some(next) = captures.get(1) {
                blocks.push(&text[start..next.start()]);
                start = next.start();
            }
        }
        blocks.push(&text[start..]);
        blocks
    }

    fn split_secondary<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for captures in self.secondary.captures_iter(text) {
            if let Some(gap) = captures.get(1) {
                blocks.push(&text[start..gap.start()]);
                start = gap.end();
            }
        }
        blocks.push(&text[start..]);
        blocks
    }

    fn accept(&self, blocks: Vec<&str>) -> Vec<String> {
        blocks
            .into_iter()
            .map(str::trim)
            .filter(|block| {
                let lower = block.to_lowercase();
                block.chars().count() > MIN_BLOCK_LEN
                    && lower.contains(&self.brand)
                    && ADDRESS_KEYWORDS.iter().any(|k| lower.contains(k))
            })
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    //! The splitter is a text heuristic; these cases pin its behaviour on
    //! representative listings rather than prove it correct.

    use super::*;

    const TWO_OUTLETS: &str = "McDonald's Bukit Bintang\n\
        Lot 1, Jalan Bukit Bintang, 55100 Kuala Lumpur\n\
        Tel: 03-21441234\n\
        Waze\n\
        McDonald's Jalan Ampang\n\
        No. 5, Jalan Ampang, 50450 Kuala Lumpur\n\
        Tel: 03-21665678\n\
        Waze";

    fn splitter() -> MultiOutletSplitter {
        MultiOutletSplitter::new("McDonald's", "Waze").expect("splitter")
    }

    /// `count` outlet listings; `capitalized` names match the brand-line split
    fn listings(count: usize, capitalized: bool) -> String {
        let word = if capitalized { "Outlet" } else { "outlet" };
        (1..=count)
            .map(|i| {
                format!("McDonald's {word} {i}\nLot {i}, Jalan Ampang, 50450 Kuala Lumpur\nWaze")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_heuristic_splits_two_outlets() {
        let blocks = splitter().split(TWO_OUTLETS);

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("McDonald's Bukit Bintang"));
        assert!(blocks[0].ends_with("Waze"));
        assert!(blocks[1].starts_with("McDonald's Jalan Ampang"));
    }

    #[test]
    fn test_heuristic_single_outlet_unchanged() {
        let text = "McDonald's KLCC\nLot 2.36.00 Jalan Ampang, Kuala Lumpur\nTel: 03-21662188\nWaze";
        assert_eq!(splitter().split(text), vec![text.to_string()]);
    }

    #[test]
    fn test_heuristic_secondary_split_on_anchor() {
        // Lowercase names defeat the brand-line split
        let text = "McDonald's bukit bintang\n\
            Lot 1, Jalan Bukit Bintang, 55100 Kuala Lumpur\n\
            Waze\n\
            McDonald's jalan ampang\n\
            No. 5, Jalan Ampang, 50450 Kuala Lumpur\n\
            Waze";
        let blocks = splitter().split(text);

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].ends_with("Waze"));
        assert!(blocks[1].starts_with("McDonald's jalan ampang"));
    }

    #[test]
    fn test_heuristic_short_blocks_rejected() {
        let text = "McDonald's A\nJalan 1\nMcDonald's B\nJalan 2";
        assert_eq!(splitter().split(text), vec![text.to_string()]);
    }

    #[test]
    fn test_heuristic_blocks_without_address_rejected() {
        let text = "McDonald's Promotions and news for the whole family this week\n\
            McDonald's Happy Meal toys now in all participating restaurants";
        assert_eq!(splitter().split(text).len(), 1);
    }

    #[test]
    fn test_heuristic_accepts_max_blocks() {
        let text = listings(MAX_BLOCKS, true);
        let blocks = splitter().split(&text);

        assert_eq!(blocks.len(), MAX_BLOCKS);
        assert!(blocks[0].starts_with("McDonald's Outlet 1\n"));
        assert!(blocks[MAX_BLOCKS - 1].starts_with("McDonald's Outlet 100\n"));
    }

    #[test]
    fn test_heuristic_too_many_blocks_keeps_text_whole() {
        let text = listings(MAX_BLOCKS + 1, true);
        assert_eq!(splitter().split(&text), vec![text.clone()]);
    }

    #[test]
    fn test_heuristic_anchor_split_accepts_max_blocks() {
        let text = listings(MAX_BLOCKS, false);
        assert_eq!(splitter().split(&text).len(), MAX_BLOCKS);
    }

    #[test]
    fn test_heuristic_anchor_split_too_many_blocks_keeps_text_whole() {
        let text = listings(MAX_BLOCKS + 1, false);
        assert_eq!(splitter().split(&text), vec![text.clone()]);
    }
}
