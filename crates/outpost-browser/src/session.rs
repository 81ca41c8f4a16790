//! Chromium-backed browser session.
//!
//! A [`BrowserSession`] owns the browser process, the CDP handler task, the
//! main page and any event-listener tasks. Call [`BrowserSession::close`] for
//! an orderly shutdown; dropping the session aborts the background tasks and
//! chromiumoxide kills the child process.

use crate::actions::{is_navigation_url, ElementHandle, PageActions, TabHost};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use chromiumoxide::cdp::browser_protocol::page::EventFrameRequestedNavigation;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use outpost_core::BrowserConfig;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Poll interval for selector and condition waits.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pause after `history.back()` so the previous document can restore.
const BACK_NAVIGATION_SETTLE: Duration = Duration::from_millis(1500);

/// Browser automation session
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    listeners: Vec<JoinHandle<()>>,
    navigation_timeout: Duration,
}

impl BrowserSession {
    /// Launch Chromium and open the main page
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let fingerprint = FingerprintConfig::from_config(config);

        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs))
            .arg(format!("--user-agent={}", fingerprint.user_agent))
            .arg("--disable-dev-shm-usage");
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable_path {
            builder = builder.chrome_executable(path);
        }
        let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chrome_config).await?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "browser handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };

        if let Err(e) = page
            .execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
            .await
        {
            tracing::debug!(error = %e, "timezone override not applied");
        }

        tracing::info!(
            headless = config.headless,
            width = fingerprint.viewport_width,
            height = fingerprint.viewport_height,
            "Browser session launched"
        );

        Ok(Self {
            browser,
            page,
            handler,
            listeners: Vec::new(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Subscribe to outbound requests and frame navigations that target the
    /// navigation service. URLs arrive on the returned channel in page order.
    pub async fn navigation_events(&mut self) -> Result<mpsc::UnboundedReceiver<String>> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut requests = self.page.event_listener::<EventRequestWillBeSent>().await?;
        let request_tx = tx.clone();
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = requests.next().await {
                let url = &event.request.url;
                if is_navigation_url(url) && request_tx.send(url.clone()).is_err() {
                    break;
                }
            }
        }));

        let mut frames = self
            .page
            .event_listener::<EventFrameRequestedNavigation>()
            .await?;
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = frames.next().await {
                if is_navigation_url(&event.url) && tx.send(event.url.clone()).is_err() {
                    break;
                }
            }
        }));

        Ok(rx)
    }

    /// Close the browser and stop all background tasks
    pub async fn close(mut self) -> Result<()> {
        for listener in self.listeners.drain(..) {
            listener.abort();
        }

        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "browser process wait failed");
        }
        self.handler.abort();
        tracing::info!("Browser session closed");

        result.map(|_| ()).map_err(Into::into)
    }

    async fn evaluate_bool(&self, script: String) -> Result<bool> {
        self.page
            .evaluate(script)
            .await?
            .into_value::<bool>()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    async fn poll_until<F, Fut>(&self, what: &str, timeout_ms: u64, mut check: F) -> Result<()>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = bool> + Send,
    {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if check().await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!("{what} after {timeout_ms}ms")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
        self.handler.abort();
    }
}

/// JSON-encode a string for safe interpolation into a script
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait::async_trait]
impl PageActions for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))?
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return false; \
             el.value = {val}; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return el.value === {val}; }})()",
            sel = js_string(selector),
            val = js_string(value),
        );
        if self.evaluate_bool(script).await? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(format!(
                "{selector} with option {value}"
            )))
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        self.poll_until(selector, timeout_ms, || async {
            self.page.find_element(selector).await.is_ok()
        })
        .await
    }

    async fn wait_for_children(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             return !!el && el.children.length > 0; }})()",
            js_string(selector)
        );
        self.poll_until(selector, timeout_ms, || {
            let script = script.clone();
            async move { self.evaluate_bool(script).await.unwrap_or(false) }
        })
        .await
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let elements = self.page.find_elements(selector).await?;
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromeElement(e)) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn extract_text(&self, selector: &str) -> Result<String> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl TabHost for BrowserSession {
    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn go_back(&self) -> Result<()> {
        self.page.evaluate("window.history.back()").await?;
        tokio::time::sleep(BACK_NAVIGATION_SETTLE).await;
        Ok(())
    }

    async fn tab_count(&self) -> Result<usize> {
        Ok(self.browser.pages().await?.len())
    }

    async fn close_extra_tabs(&self) -> Result<Option<String>> {
        let main = self.page.target_id().clone();
        let mut captured = None;

        for page in self.browser.pages().await? {
            if page.target_id() == &main {
                continue;
            }
            let url = page.url().await.ok().flatten();
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "failed to close extra tab");
            }
            if let Some(url) = url {
                if captured.is_none() || is_navigation_url(&url) {
                    captured = Some(url);
                }
            }
        }

        Ok(captured)
    }
}

/// chromiumoxide element behind the `ElementHandle` seam
struct ChromeElement(Element);

#[async_trait::async_trait]
impl ElementHandle for ChromeElement {
    async fn text(&self) -> Result<String> {
        Ok(self.0.inner_text().await?.unwrap_or_default())
    }

    async fn inner_html(&self) -> Result<String> {
        Ok(self.0.inner_html().await?.unwrap_or_default())
    }

    async fn outer_html(&self) -> Result<String> {
        Ok(self.0.outer_html().await?.unwrap_or_default())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let elements = self.0.find_elements(selector).await?;
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromeElement(e)) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn click(&self) -> Result<()> {
        self.0.click().await?;
        Ok(())
    }
}
