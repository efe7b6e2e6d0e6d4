//! Error types shared by the crawl pipeline and its browser backends.

use std::time::Duration;

use thiserror::Error;

/// Failures reported by a browser session or one of its pages
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("navigation to {url} timed out after {}s", .timeout.as_secs())]
    NavigationTimeout { url: String, timeout: Duration },
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("DOM query `{selector}` failed: {reason}")]
    Query { selector: String, reason: String },
    #[error("browser session error: {0}")]
    Session(String),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::NavigationTimeout { .. })
    }
}

/// Outcome classes of a whole crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid search filters: category_id, location_id, postal_code and radius are required")]
    InvalidFilters,
    #[error("could not open a browser page: {source}")]
    Session {
        #[source]
        source: BrowserError,
    },
    #[error("result page {page} timed out: {source}")]
    NavigationTimeout {
        page: u32,
        #[source]
        source: BrowserError,
    },
    #[error("result page {page} could not be loaded: {source}")]
    Navigation {
        page: u32,
        #[source]
        source: BrowserError,
    },
    #[error("extracting ads from result page {page} failed: {source}")]
    Extraction {
        page: u32,
        #[source]
        source: BrowserError,
    },
}

impl CrawlError {
    /// Classifies a failure raised while loading a result page.
    pub fn navigation(page: u32, source: BrowserError) -> Self {
        if source.is_timeout() {
            CrawlError::NavigationTimeout { page, source }
        } else {
            CrawlError::Navigation { page, source }
        }
    }

    /// True when the caller can fix the request; everything else is a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CrawlError::InvalidFilters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_errors_are_classified_by_cause() {
        let timeout = CrawlError::navigation(
            2,
            BrowserError::NavigationTimeout {
                url: "https://example.test".to_string(),
                timeout: Duration::from_secs(120),
            },
        );
        assert!(matches!(timeout, CrawlError::NavigationTimeout { page: 2, .. }));
        assert!(timeout.to_string().contains("timed out after 120s"));

        let failed = CrawlError::navigation(
            3,
            BrowserError::Navigation {
                url: "https://example.test".to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            },
        );
        assert!(matches!(failed, CrawlError::Navigation { page: 3, .. }));
        assert!(!failed.is_client_error());
        assert!(CrawlError::InvalidFilters.is_client_error());
    }
}
