use crate::error::BrowserError;
use crate::scrapers::dom::{self, HtmlElement};
use crate::scrapers::traits::{BrowserPage, SessionProvider};
use anyhow::Context;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, info, warn};

/// `-1` while the document or a resource is still loading, otherwise the
/// number of fetched resources. The timing buffer is enlarged first so the
/// count keeps moving past the default limit of 250 entries.
const ACTIVITY_CHECK: &str = r#"(() => {
    performance.setResourceTimingBufferSize(10000);
    if (document.readyState !== 'complete') return -1;
    const entries = performance.getEntriesByType('resource');
    if (entries.some(e => e.responseEnd === 0)) return -1;
    return entries.length;
})()"#;
const OUTER_HTML: &str = "document.documentElement.outerHTML";

/// Extra time granted to Chrome's own waits so the outer timeout fires first
const TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Browser launch and page-settling options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeSettings {
    pub headless: bool,
    pub sandbox: bool,
    pub chrome_path: Option<PathBuf>,
    /// Give up waiting for network idle after this long
    pub idle_timeout: Duration,
    /// Resource count must stay unchanged for this long to count as idle
    pub idle_quiet: Duration,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chrome_path: None,
            idle_timeout: Duration::from_secs(30),
            idle_quiet: Duration::from_millis(500),
        }
    }
}

/// Session provider launching a dedicated headless Chrome for every crawl
pub struct ChromeSessionProvider {
    settings: ChromeSettings,
    /// Covers the longest navigation a crawl may attempt
    browser_idle_timeout: Duration,
}

impl ChromeSessionProvider {
    pub fn new(settings: ChromeSettings, navigation_timeout: Duration) -> Self {
        let browser_idle_timeout = navigation_timeout + settings.idle_timeout + TIMEOUT_GRACE;
        Self {
            settings,
            browser_idle_timeout,
        }
    }

    fn launch(settings: &ChromeSettings, idle_timeout: Duration) -> anyhow::Result<(Browser, Arc<Tab>)> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .sandbox(settings.sandbox)
            .path(settings.chrome_path.clone())
            .idle_browser_timeout(idle_timeout)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        Ok((browser, tab))
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    type Page = ChromePage;

    async fn acquire_page(&self) -> Result<ChromePage, BrowserError> {
        let settings = self.settings.clone();
        let idle_timeout = self.browser_idle_timeout;
        let (browser, tab) = task::spawn_blocking(move || Self::launch(&settings, idle_timeout))
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?
            .map_err(|e| BrowserError::Session(format!("{e:#}")))?;

        Ok(ChromePage {
            _browser: browser,
            tab,
            settings: self.settings.clone(),
            snapshot: Mutex::new(None),
        })
    }

    fn release_page(&self, page: ChromePage) {
        // Closing the tab and dropping the browser both wait on Chrome.
        run_blocking_teardown(move || {
            if let Err(e) = page.tab.close(false) {
                warn!("Failed to close browser tab: {}", e);
            }
            // Dropping the browser terminates the Chrome process.
            drop(page);
            debug!("Chrome session closed");
        });
    }
}

/// A Chrome tab whose DOM is read from a snapshot taken once the network is idle
pub struct ChromePage {
    _browser: Browser,
    tab: Arc<Tab>,
    settings: ChromeSettings,
    snapshot: Mutex<Option<Arc<str>>>,
}

impl ChromePage {
    fn set_snapshot(&self, html: Option<Arc<str>>) {
        match self.snapshot.lock() {
            Ok(mut slot) => *slot = html,
            Err(poisoned) => *poisoned.into_inner() = html,
        }
    }

    fn snapshot(&self, selector: &str) -> Result<Arc<str>, BrowserError> {
        let slot = self
            .snapshot
            .lock()
            .map_err(|_| BrowserError::Session("DOM snapshot lock poisoned".to_string()))?;
        slot.clone().ok_or_else(|| BrowserError::Query {
            selector: selector.to_string(),
            reason: "page has not settled yet; wait for network idle first".to_string(),
        })
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    type Element = HtmlElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.set_snapshot(None);

        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        let load = task::spawn_blocking(move || -> anyhow::Result<()> {
            tab.set_default_timeout(timeout + TIMEOUT_GRACE);
            tab.navigate_to(&target)?;
            tab.wait_until_navigated()?;
            Ok(())
        });

        match tokio::time::timeout(timeout, load).await {
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
            Ok(Err(join)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: join.to_string(),
            }),
            Ok(Ok(Err(e))) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("{e:#}"),
            }),
            Ok(Ok(Ok(()))) => {
                debug!("Navigated to {}", url);
                Ok(())
            }
        }
    }

    async fn wait_for_network_idle(&self) -> Result<(), BrowserError> {
        let tab = Arc::clone(&self.tab);
        let url = self.tab.get_url();
        let (limit, quiet) = (self.settings.idle_timeout, self.settings.idle_quiet);

        let html = task::spawn_blocking(move || settle(&tab, limit, quiet))
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?;

        match html {
            Ok(Some(html)) => {
                debug!("Captured {} bytes of rendered HTML", html.len());
                self.set_snapshot(Some(Arc::from(html)));
                Ok(())
            }
            Ok(None) => Err(BrowserError::NavigationTimeout { url, timeout: limit }),
            Err(e) => Err(BrowserError::Navigation {
                url,
                reason: format!("{e:#}"),
            }),
        }
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<HtmlElement>, BrowserError> {
        let html = self.snapshot(selector)?;
        dom::select_all(&html, selector)
    }

    async fn query_selector(
        &self,
        element: &HtmlElement,
        selector: &str,
    ) -> Result<Option<HtmlElement>, BrowserError> {
        element.select_first(selector)
    }

    async fn get_attribute(
        &self,
        element: &HtmlElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(element.attribute(name))
    }

    async fn inner_text(&self, element: &HtmlElement) -> Result<String, BrowserError> {
        Ok(element.inner_text())
    }
}

/// Runs `teardown` on the blocking pool when inside a tokio runtime, inline otherwise.
fn run_blocking_teardown<F>(teardown: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(teardown);
        }
        Err(_) => teardown(),
    }
}

/// Tracks activity check results until the page has been quiet long enough
#[derive(Debug)]
struct IdleTracker {
    quiet: Duration,
    last_count: Option<i64>,
    stable_since: Instant,
}

impl IdleTracker {
    fn new(quiet: Duration, now: Instant) -> Self {
        Self {
            quiet,
            last_count: None,
            stable_since: now,
        }
    }

    /// Records a check result; true once the count held still for `quiet`.
    fn observe(&mut self, count: i64, now: Instant) -> bool {
        if count < 0 || self.last_count != Some(count) {
            self.last_count = (count >= 0).then_some(count);
            self.stable_since = now;
            return false;
        }
        now.duration_since(self.stable_since) >= self.quiet
    }
}

/// Polls until the page is idle, then captures the DOM.
///
/// Returns `Ok(None)` when the page is still busy after `limit`.
fn settle(tab: &Tab, limit: Duration, quiet: Duration) -> anyhow::Result<Option<String>> {
    let started = Instant::now();
    let mut tracker = IdleTracker::new(quiet, started);

    while started.elapsed() < limit {
        let activity = tab.evaluate(ACTIVITY_CHECK, false).context("Failed to check page activity")?;
        let count = activity.value.and_then(|v| v.as_i64()).unwrap_or(-1);

        if tracker.observe(count, Instant::now()) {
            let html = tab
                .evaluate(OUTER_HTML, false)
                .context("Failed to capture page HTML")?
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            return Ok(Some(html));
        }

        thread::sleep(quiet / 4);
    }

    warn!("Page still loading after {}s", limit.as_secs());
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_needs_a_stable_count_for_the_quiet_window() {
        let start = Instant::now();
        let quiet = Duration::from_millis(500);
        let mut tracker = IdleTracker::new(quiet, start);

        assert!(!tracker.observe(12, start));
        assert!(!tracker.observe(12, start + Duration::from_millis(200)));
        assert!(!tracker.observe(14, start + Duration::from_millis(400)));
        assert!(!tracker.observe(14, start + Duration::from_millis(800)));
        assert!(tracker.observe(14, start + Duration::from_millis(900)));
    }

    #[test]
    fn in_flight_requests_restart_the_quiet_window() {
        let start = Instant::now();
        let mut tracker = IdleTracker::new(Duration::from_millis(500), start);

        assert!(!tracker.observe(30, start));
        assert!(!tracker.observe(-1, start + Duration::from_millis(600)));
        assert!(!tracker.observe(30, start + Duration::from_millis(700)));
        assert!(!tracker.observe(30, start + Duration::from_millis(1100)));
        assert!(tracker.observe(30, start + Duration::from_millis(1200)));
    }

    #[test]
    fn activity_check_lifts_the_resource_timing_limit() {
        assert!(ACTIVITY_CHECK.contains("setResourceTimingBufferSize"));
        assert!(ACTIVITY_CHECK.contains("responseEnd === 0"));
    }

    #[test]
    fn teardown_runs_inline_without_a_runtime() {
        let caller = thread::current().id();
        let (tx, rx) = std::sync::mpsc::channel();
        run_blocking_teardown(move || {
            let _ = tx.send(thread::current().id());
        });
        assert_eq!(rx.recv().expect("teardown ran"), caller);
    }

    #[tokio::test]
    async fn teardown_leaves_the_async_worker() {
        let caller = thread::current().id();
        let (tx, rx) = tokio::sync::oneshot::channel();
        run_blocking_teardown(move || {
            let _ = tx.send(thread::current().id());
        });
        let teardown_thread = rx.await.expect("teardown ran");
        assert_ne!(teardown_thread, caller);
    }
}
