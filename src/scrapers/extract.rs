use crate::error::BrowserError;
use crate::models::AdRecord;
use crate::scrapers::search_url::SITE_ORIGIN;
use crate::scrapers::traits::BrowserPage;
use tracing::debug;

/// Organic listings only: top ads and "pro" badge placements are paid
const AD_ITEM_SELECTOR: &str = ".ad-listitem:not(.is-topad):not(.badge-hint-pro-small-srp)";
const ARTICLE_SELECTOR: &str = "article";
const TITLE_SELECTOR: &str = "h2.text-module-begin a.ellipsis";
const PRICE_SELECTOR: &str = "p.aditem-main--middle--price-shipping--price";
const DESCRIPTION_SELECTOR: &str = "p.aditem-main--middle--description";
const AD_ID_ATTR: &str = "data-adid";
const AD_HREF_ATTR: &str = "data-href";

/// Extract all ads from the page's current DOM, in encounter order.
pub async fn extract_ads<P>(page: &P) -> Result<Vec<AdRecord>, BrowserError>
where
    P: BrowserPage + ?Sized,
{
    let items = page.query_selector_all(AD_ITEM_SELECTOR).await?;
    debug!("Found {} listing candidates", items.len());

    let mut ads = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(article) = page.query_selector(item, ARTICLE_SELECTOR).await? else {
            debug!("Skipped candidate {}: no article element", idx);
            continue;
        };

        let id = page
            .get_attribute(&article, AD_ID_ATTR)
            .await?
            .unwrap_or_default();
        let href = page
            .get_attribute(&article, AD_HREF_ATTR)
            .await?
            .unwrap_or_default();
        if id.is_empty() || href.is_empty() {
            debug!("Skipped candidate {}: id='{}', href='{}'", idx, id, href);
            continue;
        }

        let title = text_or_default(page, &article, TITLE_SELECTOR).await?;
        let price = normalize_price(&text_or_default(page, &article, PRICE_SELECTOR).await?);
        let description = text_or_default(page, &article, DESCRIPTION_SELECTOR).await?;

        ads.push(AdRecord {
            id,
            url: absolute_url(&href),
            title,
            price,
            description,
        });
    }

    Ok(ads)
}

/// Text of the first `selector` match inside `element`, or "" if nothing matches
async fn text_or_default<P>(
    page: &P,
    element: &P::Element,
    selector: &str,
) -> Result<String, BrowserError>
where
    P: BrowserPage + ?Sized,
{
    match page.query_selector(element, selector).await? {
        Some(found) => page.inner_text(&found).await,
        None => {
            debug!("No match for {}", selector);
            Ok(String::new())
        }
    }
}

/// Strips the euro sign, the "VB" (negotiable) marker and thousands separators.
pub fn normalize_price(raw: &str) -> String {
    raw.replace('€', "")
        .replace("VB", "")
        .replace('.', "")
        .trim()
        .to_string()
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{SITE_ORIGIN}{href}")
    } else {
        format!("{SITE_ORIGIN}/{href}")
    }
}
