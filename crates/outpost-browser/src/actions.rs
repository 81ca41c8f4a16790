use crate::error::{BrowserError, Result};

/// Host of the navigation service whose links carry outlet coordinates.
pub const NAVIGATION_HOST: &str = "waze.com";

/// App scheme the navigation service registers on mobile browsers.
pub const NAVIGATION_SCHEME: &str = "waze://";

/// A rendered DOM element
#[async_trait::async_trait]
pub trait ElementHandle: Send + Sync {
    /// Rendered text with line breaks between blocks
    async fn text(&self) -> Result<String>;

    /// Serialized markup of the element's children
    async fn inner_html(&self) -> Result<String>;

    /// Serialized markup including the element itself
    async fn outer_html(&self) -> Result<String>;

    /// Descendants matching a CSS selector
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>>;

    /// Scroll into view and click
    async fn click(&self) -> Result<()>;
}

/// Page-level browser actions
#[async_trait::async_trait]
pub trait PageActions: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Set a `<select>` value and fire its change event
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Wait until an element matching the selector has at least one child
    async fn wait_for_children(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// All elements matching a selector
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>>;

    /// Extract text from an element
    async fn extract_text(&self, selector: &str) -> Result<String>;
}

/// Tab and history control used while capturing navigation links
#[async_trait::async_trait]
pub trait TabHost: Send + Sync {
    /// URL of the main page
    async fn current_url(&self) -> Result<Option<String>>;

    /// Go back one history entry on the main page
    async fn go_back(&self) -> Result<()>;

    /// Number of open tabs
    async fn tab_count(&self) -> Result<usize>;

    /// Close every tab except the main page, returning the most relevant
    /// URL among them (a navigation URL if one was open)
    async fn close_extra_tabs(&self) -> Result<Option<String>>;
}

/// Everything the scrape loop needs from a browser page
pub trait BrowserPage: PageActions + TabHost {}

impl<T: PageActions + TabHost> BrowserPage for T {}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(ToString::to_string)
}

/// Whether a URL points at the navigation service
pub fn is_navigation_url(url: &str) -> bool {
    if url.to_ascii_lowercase().starts_with(NAVIGATION_SCHEME) {
        return true;
    }
    extract_domain(url).is_ok_and(|host| {
        let host = host.to_ascii_lowercase();
        host == NAVIGATION_HOST || host.ends_with(&format!(".{NAVIGATION_HOST}"))
    })
}
