use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Search filters for one crawl request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilters {
    /// Free-text keywords
    pub query: Option<String>,
    /// Category token such as `c161`
    pub category_id: Option<String>,
    /// Location token such as `l3843`
    pub location_id: Option<String>,
    /// Postal code the radius is centred on
    #[serde(alias = "plz")]
    pub postal_code: Option<String>,
    /// Search radius in kilometres
    pub radius: Option<u32>,
    /// Minimum price (EUR)
    pub min_price: Option<u64>,
    /// Maximum price (EUR)
    pub max_price: Option<u64>,
    /// Number of result pages to crawl
    #[serde(default)]
    pub page_count: PageCount,
    /// `"price"` sorts by ascending price, anything else keeps relevance
    pub sort: Option<String>,
}

impl SearchFilters {
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_param(self.sort.as_deref())
    }
}

/// Result ordering understood by the search page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Relevance,
    PriceAscending,
}

impl SortOrder {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("price") => SortOrder::PriceAscending,
            _ => SortOrder::Relevance,
        }
    }
}

/// Number of result pages to visit, always within `1..=20`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageCount(u32);

impl PageCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 20;

    pub fn new(count: u32) -> Result<Self, InvalidPageCount> {
        if (Self::MIN..=Self::MAX).contains(&count) {
            Ok(Self(count))
        } else {
            Err(InvalidPageCount(count))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// 1-based page indices in visiting order
    pub fn pages(self) -> RangeInclusive<u32> {
        1..=self.0
    }
}

impl Default for PageCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u32> for PageCount {
    type Error = InvalidPageCount;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageCount> for u32 {
    fn from(count: PageCount) -> Self {
        count.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPageCount(pub u32);

impl fmt::Display for InvalidPageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page_count must be between {} and {}, got {}",
            PageCount::MIN,
            PageCount::MAX,
            self.0
        )
    }
}

impl std::error::Error for InvalidPageCount {}
