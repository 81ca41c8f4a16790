//! Navigation-link capture.
//!
//! The locator page does not expose coordinates in markup. Each outlet has a
//! navigation control that, when clicked, sends the browser to the
//! navigation service with the coordinates embedded in the URL. The capture
//! clicks the control and resolves the resulting URL from, in order: the
//! request channel fed by [`BrowserSession::navigation_events`], a newly
//! opened tab, or an in-place navigation of the main page. Without a
//! request channel only the last two sources are consulted.
//!
//! [`BrowserSession::navigation_events`]: crate::BrowserSession::navigation_events

use crate::actions::{is_navigation_url, ElementHandle, TabHost};
use crate::error::Result;
use std::time::Duration;
use tokio::sync::mpsc;

/// Selectors tried when no anchor carries the navigation label.
const FALLBACK_SELECTORS: [&str; 4] = [
    "a[href*=\"waze\"]",
    "a[href*=\"navigate\"]",
    ".waze-link",
    "[class*=\"waze\"]",
];

/// Clicks navigation controls and records the URL each one produces
pub struct NavigationCapture {
    receiver: Option<mpsc::UnboundedReceiver<String>>,
    label: String,
    settle: Duration,
}

impl NavigationCapture {
    /// Create a capture over a channel of intercepted navigation URLs.
    ///
    /// `label` is the visible text of the control; `settle` is how long to
    /// wait after clicking before inspecting the result.
    pub fn new(receiver: mpsc::UnboundedReceiver<String>, label: &str, settle: Duration) -> Self {
        Self {
            receiver: Some(receiver),
            label: label.to_lowercase(),
            settle,
        }
    }

    /// Create a capture that only inspects new tabs and in-place navigation.
    pub fn without_requests(label: &str, settle: Duration) -> Self {
        Self {
            receiver: None,
            label: label.to_lowercase(),
            settle,
        }
    }

    /// Discard buffered URLs, returning the most recent one
    pub fn drain(&mut self) -> Option<String> {
        let receiver = self.receiver.as_mut()?;
        let mut latest = None;
        while let Ok(url) = receiver.try_recv() {
            latest = Some(url);
        }
        latest
    }

    /// Find the navigation control inside an outlet container
    pub async fn locate_control(
        &self,
        container: &dyn ElementHandle,
    ) -> Result<Option<Box<dyn ElementHandle>>> {
        for anchor in container.find_all("a").await? {
            let text = anchor.text().await.unwrap_or_default();
            if text.to_lowercase().contains(&self.label) {
                return Ok(Some(anchor));
            }
        }

        for selector in FALLBACK_SELECTORS {
            if let Some(control) = container.find_all(selector).await?.into_iter().next() {
                return Ok(Some(control));
            }
        }

        Ok(None)
    }

    /// Click the container's navigation control and return the URL it led to.
    ///
    /// Every failure degrades to `None`; the main page is restored when the
    /// click navigated it away.
    pub async fn capture<H>(&mut self, host: &H, container: &dyn ElementHandle) -> Option<String>
    where
        H: TabHost + ?Sized,
    {
        let control = match self.locate_control(container).await {
            Ok(Some(control)) => control,
            Ok(None) => {
                tracing::debug!("no navigation control in container");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "navigation control lookup failed");
                return None;
            }
        };

        if let Some(stale) = self.drain() {
            tracing::trace!(url = %stale, "discarded stale navigation request");
        }

        let baseline_tabs = host.tab_count().await.unwrap_or(1);
        let baseline_url = host.current_url().await.ok().flatten();

        if let Err(e) = control.click().await {
            tracing::warn!(error = %e, "navigation control click failed");
            return None;
        }

        tokio::time::sleep(self.settle).await;

        if let Some(url) = self.drain() {
            tracing::debug!(url = %url, source = "request", "navigation link captured");
            return Some(url);
        }

        if host.tab_count().await.unwrap_or(baseline_tabs) > baseline_tabs {
            match host.close_extra_tabs().await {
                Ok(Some(url)) if is_navigation_url(&url) => {
                    tracing::debug!(url = %url, source = "tab", "navigation link captured");
                    return Some(url);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "failed to inspect new tab"),
            }
        }

        if let Ok(Some(current)) = host.current_url().await {
            if Some(&current) != baseline_url.as_ref() && is_navigation_url(&current) {
                if let Err(e) = host.go_back().await {
                    tracing::warn!(error = %e, "failed to return to locator page");
                }
                tracing::debug!(url = %current, source = "redirect", "navigation link captured");
                return Some(current);
            }
        }

        tracing::debug!("navigation control produced no link");
        None
    }
}
