//! Search URL construction for kleinanzeigen.de result pages.

use url::Url;

use crate::scrapers::types::{SearchFilters, SortOrder};

/// Origin of the listing site; relative ad links are resolved against it
pub const SITE_ORIGIN: &str = "https://www.kleinanzeigen.de";

/// Category slug used when no other one is configured
pub const DEFAULT_CATEGORY_SLUG: &str = "multimedia-elektronik";

const PRICE_SORT_SEGMENT: &str = "sortierung:preis";
const KEYWORDS_PARAM: &str = "keywords";
const PRICE_FROM_PARAM: &str = "price_from";
const PRICE_TO_PARAM: &str = "price_to";

/// Base search URL plus the query parameters shared by every result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUrl {
    base: Url,
    params: Vec<(&'static str, String)>,
}

/// Builds the search URL for `filters`.
///
/// Returns `None` when category, location, postal code or radius is missing;
/// blank strings count as missing. The keyword query is passed on verbatim.
pub fn build_search_url(filters: &SearchFilters, category_slug: &str) -> Option<SearchUrl> {
    let category_id = present(&filters.category_id)?;
    let location_id = present(&filters.location_id)?;
    let postal_code = present(&filters.postal_code)?;
    let radius = filters.radius?;

    let mut base = Url::parse(SITE_ORIGIN).ok()?;
    {
        let mut segments = base.path_segments_mut().ok()?;
        segments.clear();
        segments.push(&format!("s-{category_slug}"));
        segments.push(postal_code);
        if filters.sort_order() == SortOrder::PriceAscending {
            segments.push(PRICE_SORT_SEGMENT);
        }
        segments.push(&format!("{category_id}{location_id}r{radius}"));
    }

    let mut params = Vec::new();
    if let Some(query) = filters.query.as_deref().filter(|q| !q.is_empty()) {
        params.push((KEYWORDS_PARAM, query.to_string()));
    }
    if let Some(min_price) = filters.min_price {
        params.push((PRICE_FROM_PARAM, min_price.to_string()));
    }
    if let Some(max_price) = filters.max_price {
        params.push((PRICE_TO_PARAM, max_price.to_string()));
    }

    Some(SearchUrl { base, params })
}

impl SearchUrl {
    /// URL without page index or query string
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of the 1-based result page `page`
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&format!("s-seite:{page}"));
        }
        if !self.params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin_filters() -> SearchFilters {
        SearchFilters {
            category_id: Some("c161".to_string()),
            location_id: Some("l3331".to_string()),
            postal_code: Some("10115".to_string()),
            radius: Some(20),
            ..SearchFilters::default()
        }
    }

    #[test]
    fn missing_geographic_fields_make_url_invalid() {
        let complete = berlin_filters();
        assert!(build_search_url(&complete, DEFAULT_CATEGORY_SLUG).is_some());

        let without_category = SearchFilters { category_id: None, ..complete.clone() };
        let without_location = SearchFilters { location_id: None, ..complete.clone() };
        let without_postal = SearchFilters { postal_code: Some("  ".to_string()), ..complete.clone() };
        let without_radius = SearchFilters { radius: None, ..complete };
        for filters in [without_category, without_location, without_postal, without_radius] {
            assert_eq!(build_search_url(&filters, DEFAULT_CATEGORY_SLUG), None);
        }
    }

    #[test]
    fn base_url_combines_slug_postal_code_and_token() {
        let url = build_search_url(&berlin_filters(), DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert_eq!(
            url.base().as_str(),
            "https://www.kleinanzeigen.de/s-multimedia-elektronik/10115/c161l3331r20"
        );
    }

    #[test]
    fn price_sort_segment_precedes_category_token() {
        let filters = SearchFilters { sort: Some("price".to_string()), ..berlin_filters() };
        let url = build_search_url(&filters, DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert_eq!(
            url.base().as_str(),
            "https://www.kleinanzeigen.de/s-multimedia-elektronik/10115/sortierung:preis/c161l3331r20"
        );

        let filters = SearchFilters { sort: Some("newest".to_string()), ..berlin_filters() };
        let url = build_search_url(&filters, DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert!(!url.base().as_str().contains("sortierung"));
    }

    #[test]
    fn page_url_appends_index_and_ordered_query() {
        let filters = SearchFilters {
            query: Some("desk lamp".to_string()),
            min_price: Some(10),
            max_price: Some(50),
            ..berlin_filters()
        };
        let url = build_search_url(&filters, DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert_eq!(
            url.page_url(3).as_str(),
            "https://www.kleinanzeigen.de/s-multimedia-elektronik/10115/c161l3331r20/s-seite:3?keywords=desk+lamp&price_from=10&price_to=50"
        );
    }

    #[test]
    fn page_url_without_params_has_no_query_string() {
        let url = build_search_url(&berlin_filters(), DEFAULT_CATEGORY_SLUG).expect("valid filters");
        let page = url.page_url(1);
        assert_eq!(page.query(), None);
        assert!(!page.as_str().ends_with('?'));
        assert!(page.as_str().ends_with("/c161l3331r20/s-seite:1"));
    }

    #[test]
    fn keyword_query_is_encoded_without_trimming() {
        let filters = SearchFilters {
            query: Some(" lamp ".to_string()),
            ..berlin_filters()
        };
        let url = build_search_url(&filters, DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert_eq!(url.page_url(1).query(), Some("keywords=+lamp+"));

        let empty = SearchFilters { query: Some(String::new()), ..berlin_filters() };
        let url = build_search_url(&empty, DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert_eq!(url.page_url(1).query(), None);
    }

    #[test]
    fn query_values_are_escaped() {
        let filters = SearchFilters {
            query: Some("tv & radio=ok".to_string()),
            max_price: Some(0),
            ..berlin_filters()
        };
        let url = build_search_url(&filters, DEFAULT_CATEGORY_SLUG).expect("valid filters");
        assert_eq!(
            url.page_url(1).query(),
            Some("keywords=tv+%26+radio%3Dok&price_to=0")
        );
    }
}
