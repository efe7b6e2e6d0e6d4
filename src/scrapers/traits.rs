use crate::error::{BrowserError, CrawlError};
use crate::models::AdRecord;
use crate::scrapers::types::SearchFilters;
use async_trait::async_trait;
use std::ops::Deref;
use std::time::Duration;
use tracing::debug;

/// Common trait for listing sources the HTTP adapter can query
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Crawl the source for ads matching `filters`
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<AdRecord>, CrawlError>;

    /// Get the name of the source
    fn source_name(&self) -> &'static str;
}

/// A single browser page owned by one crawl.
///
/// DOM reads never fail because something is missing: an absent match is
/// `None` or an empty string. Errors mean the query itself broke.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    type Element: Send + Sync;

    /// Load `url`, giving up after `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Suspend until no network activity is observed
    async fn wait_for_network_idle(&self) -> Result<(), BrowserError>;

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Element>, BrowserError>;

    async fn query_selector(
        &self,
        element: &Self::Element,
        selector: &str,
    ) -> Result<Option<Self::Element>, BrowserError>;

    async fn get_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn inner_text(&self, element: &Self::Element) -> Result<String, BrowserError>;
}

/// Hands out isolated pages, one per crawl
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Page: BrowserPage;

    async fn acquire_page(&self) -> Result<Self::Page, BrowserError>;

    /// Tear the page down. Called exactly once per acquired page.
    fn release_page(&self, page: Self::Page);
}

/// Scoped ownership of an acquired page; dropping the lease releases it
pub struct PageLease<'a, S: SessionProvider + ?Sized> {
    provider: &'a S,
    page: Option<S::Page>,
}

impl<'a, S: SessionProvider + ?Sized> PageLease<'a, S> {
    pub async fn acquire(provider: &'a S) -> Result<Self, BrowserError> {
        let page = provider.acquire_page().await?;
        debug!("Acquired browser page");
        Ok(Self {
            provider,
            page: Some(page),
        })
    }
}

impl<S: SessionProvider + ?Sized> Deref for PageLease<'_, S> {
    type Target = S::Page;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the page out.
        match &self.page {
            Some(page) => page,
            None => unreachable!("page lease used after release"),
        }
    }
}

impl<S: SessionProvider + ?Sized> Drop for PageLease<'_, S> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            self.provider.release_page(page);
            debug!("Released browser page");
        }
    }
}
