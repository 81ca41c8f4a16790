//! Outlet container discovery within the rendered results region.

use crate::actions::{ElementHandle, PageActions};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Markup prefix hashed when deduplicating containers.
const FINGERPRINT_PREFIX_CHARS: usize = 500;

/// Ordered selector strategies, relative to the results root.
const STRATEGIES: [(&str, &[&str]); 3] = [
    (
        "container-class",
        &[" .restaurant-item", " .outlet-item", " .location-item"],
    ),
    (
        "attribute-partial",
        &[" [class*=\"restaurant\"]", " [class*=\"outlet\"]"],
    ),
    (
        "structural",
        &[" > div > div", " [data-v-] > div", " > div > *"],
    ),
];

/// Finds the per-outlet containers in the results region
#[derive(Debug, Clone)]
pub struct ContainerLocator {
    results_selector: String,
    min_containers: usize,
}

impl ContainerLocator {
    pub fn new(results_selector: impl Into<String>, min_containers: usize) -> Self {
        Self {
            results_selector: results_selector.into(),
            min_containers,
        }
    }

    /// Selectors in the order they are tried
    pub fn candidate_selectors(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        STRATEGIES.iter().flat_map(move |(strategy, suffixes)| {
            suffixes
                .iter()
                .map(move |suffix| (*strategy, format!("{}{suffix}", self.results_selector)))
        })
    }

    /// Return deduplicated containers from the first selector whose match
    /// count exceeds the threshold. Empty when no selector qualifies.
    pub async fn locate<P>(&self, page: &P) -> Vec<Box<dyn ElementHandle>>
    where
        P: PageActions + ?Sized,
    {
        for (strategy, selector) in self.candidate_selectors() {
            let elements = match page.query_all(&selector).await {
                Ok(elements) => elements,
                Err(e) => {
                    tracing::debug!(selector = %selector, error = %e, "container query failed");
                    continue;
                }
            };

            if elements.len() > self.min_containers {
                let found = elements.len();
                let unique = dedupe(elements).await;
                tracing::info!(
                    strategy,
                    selector = %selector,
                    found,
                    unique = unique.len(),
                    "Outlet containers located"
                );
                return unique;
            }

            tracing::debug!(selector = %selector, found = elements.len(), "below container threshold");
        }

        tracing::warn!(
            results = %self.results_selector,
            "no container strategy matched enough elements"
        );
        Vec::new()
    }
}

/// Hash of the leading markup of an element
pub fn markup_fingerprint(markup: &str) -> String {
    let prefix: String = markup.chars().take(FINGERPRINT_PREFIX_CHARS).collect();
    let digest = Sha256::digest(prefix.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

async fn dedupe(elements: Vec<Box<dyn ElementHandle>>) -> Vec<Box<dyn ElementHandle>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(elements.len());

    for element in elements {
        match element.outer_html().await {
            Ok(markup) => {
                if seen.insert(markup_fingerprint(&markup)) {
                    unique.push(element);
                }
            }
            Err(e) => tracing::debug!(error = %e, "skipping unreadable container"),
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BrowserError, Result};
    use std::collections::HashMap;

    struct FakeElement(String);

    #[async_trait::async_trait]
    impl ElementHandle for FakeElement {
        async fn text(&self) -> Result<String> {
            Ok(self.0.clone())
        }

        async fn inner_html(&self) -> Result<String> {
            Ok(self.0.clone())
        }

        async fn outer_html(&self) -> Result<String> {
            Ok(format!("<div>{}</div>", self.0))
        }

        async fn find_all(&self, _selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
            Ok(Vec::new())
        }

        async fn click(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Page answering `query_all` from a selector → markup table
    struct FakePage(HashMap<String, Vec<String>>);

    impl FakePage {
        fn with(entries: &[(&str, Vec<String>)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
            )
        }
    }

    #[async_trait::async_trait]
    impl PageActions for FakePage {
        async fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn click(&self, _selector: &str) -> Result<()> {
            Ok(())
        }

        async fn select_option(&self, _selector: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn wait_for_selector(&self, _selector: &str, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }

        async fn wait_for_children(&self, _selector: &str, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }

        async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
            if selector.contains("[data-v-]") {
                return Err(BrowserError::SelectorNotFound(selector.to_string()));
            }
            Ok(self
                .0
                .get(selector)
                .map(|items| {
                    items
                        .iter()
                        .map(|m| Box::new(FakeElement(m.clone())) as Box<dyn ElementHandle>)
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn extract_text(&self, _selector: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn outlets(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("McDonald's Outlet {i}")).collect()
    }

    #[test]
    fn test_candidate_order() {
        let locator = ContainerLocator::new("#results", 10);
        let selectors: Vec<_> = locator.candidate_selectors().collect();

        assert_eq!(selectors.len(), 8);
        assert_eq!(selectors[0], ("container-class", "#results .restaurant-item".to_string()));
        assert_eq!(selectors[3].0, "attribute-partial");
        assert_eq!(selectors[7], ("structural", "#results > div > *".to_string()));
    }

    #[tokio::test]
    async fn test_first_strategy_over_threshold_wins() {
        let page = FakePage::with(&[
            ("#results .restaurant-item", outlets(5)),
            ("#results [class*=\"outlet\"]", outlets(12)),
            ("#results > div > div", outlets(40)),
        ]);
        let locator = ContainerLocator::new("#results", 10);

        let found = locator.locate(&page).await;
        assert_eq!(found.len(), 12);
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        let page = FakePage::with(&[
            ("#results .outlet-item", outlets(10)),
            ("#results > div > *", outlets(11)),
        ]);
        let locator = ContainerLocator::new("#results", 10);

        assert_eq!(locator.locate(&page).await.len(), 11);
    }

    #[tokio::test]
    async fn test_duplicate_markup_collapsed() {
        let mut items = outlets(11);
        items.extend(outlets(4));
        let page = FakePage::with(&[("#results .location-item", items)]);
        let locator = ContainerLocator::new("#results", 10);

        assert_eq!(locator.locate(&page).await.len(), 11);
    }

    #[tokio::test]
    async fn test_no_strategy_matches() {
        let page = FakePage::with(&[("#results .restaurant-item", outlets(3))]);
        let locator = ContainerLocator::new("#results", 10);

        assert!(locator.locate(&page).await.is_empty());
    }

    #[test]
    fn test_fingerprint_uses_prefix_only() {
        let shared = "x".repeat(600);
        let a = format!("{shared}tail-a");
        let b = format!("{shared}tail-b");
        assert_eq!(markup_fingerprint(&a), markup_fingerprint(&b));
        assert_ne!(markup_fingerprint("<div>a</div>"), markup_fingerprint("<div>b</div>"));
        assert_eq!(markup_fingerprint("abc").len(), 64);
    }
}
