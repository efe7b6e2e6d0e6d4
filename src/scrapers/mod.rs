pub mod browser;
pub mod dom;
pub mod extract;
pub mod kleinanzeigen;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod search_url;
pub mod traits;
pub mod types;

pub use browser::{ChromeSessionProvider, ChromeSettings};
pub use kleinanzeigen::{crawl, CrawlSettings, KleinanzeigenScraper};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptedSession, ScriptedStep};
pub use search_url::{build_search_url, SearchUrl};
pub use traits::{BrowserPage, ListingSource, PageLease, SessionProvider};
pub use types::{PageCount, SearchFilters, SortOrder};
