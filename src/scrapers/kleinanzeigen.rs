use crate::error::CrawlError;
use crate::models::AdRecord;
use crate::scrapers::extract::extract_ads;
use crate::scrapers::search_url::{build_search_url, DEFAULT_CATEGORY_SLUG};
use crate::scrapers::traits::{BrowserPage, ListingSource, PageLease, SessionProvider};
use crate::scrapers::types::SearchFilters;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for loading a single result page
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    pub navigation_timeout: Duration,
    pub category_slug: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            category_slug: DEFAULT_CATEGORY_SLUG.to_string(),
        }
    }
}

/// Crawl `filters.page_count` result pages in order and collect their ads.
///
/// One page is acquired for the whole crawl and released on every exit
/// path. The first failing page aborts the crawl; no partial results are
/// returned.
pub async fn crawl<S>(
    provider: &S,
    filters: &SearchFilters,
    settings: &CrawlSettings,
) -> Result<Vec<AdRecord>, CrawlError>
where
    S: SessionProvider + ?Sized,
{
    let search = build_search_url(filters, &settings.category_slug)
        .ok_or(CrawlError::InvalidFilters)?;

    let page = PageLease::acquire(provider)
        .await
        .map_err(|source| CrawlError::Session { source })?;

    let mut ads = Vec::new();
    for index in filters.page_count.pages() {
        let url = search.page_url(index);
        info!("Opening result page {} of {}: {}", index, filters.page_count.get(), url);

        page.navigate(url.as_str(), settings.navigation_timeout)
            .await
            .map_err(|e| CrawlError::navigation(index, e))?;
        page.wait_for_network_idle()
            .await
            .map_err(|e| CrawlError::navigation(index, e))?;

        let found = extract_ads(&*page)
            .await
            .map_err(|source| CrawlError::Extraction { page: index, source })?;
        debug!("Result page {} yielded {} ads", index, found.len());
        ads.extend(found);
    }

    info!("Collected {} ads from {} result pages", ads.len(), filters.page_count.get());
    Ok(ads)
}

/// kleinanzeigen.de listing source backed by a browser session provider
pub struct KleinanzeigenScraper<S> {
    provider: Arc<S>,
    settings: CrawlSettings,
}

impl<S: SessionProvider> KleinanzeigenScraper<S> {
    /// Create a scraper with default crawl settings
    pub fn new(provider: Arc<S>) -> Self {
        Self::with_settings(provider, CrawlSettings::default())
    }

    pub fn with_settings(provider: Arc<S>, settings: CrawlSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }
}

#[async_trait]
impl<S: SessionProvider> ListingSource for KleinanzeigenScraper<S> {
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<AdRecord>, CrawlError> {
        crawl(self.provider.as_ref(), filters, &self.settings).await
    }

    fn source_name(&self) -> &'static str {
        "kleinanzeigen.de"
    }
}
