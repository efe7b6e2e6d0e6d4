//! Crawl kleinanzeigen.de search result pages with a headless browser and
//! turn every organic listing into an [`models::AdRecord`].

pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod server;

pub use error::{BrowserError, CrawlError};
pub use models::AdRecord;
