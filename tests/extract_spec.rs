mod common;

use std::time::Duration;

use common::{listing, results_page};
use kleinanzeigen_scout::error::BrowserError;
use kleinanzeigen_scout::models::AdRecord;
use kleinanzeigen_scout::scrapers::extract::extract_ads;
use kleinanzeigen_scout::scrapers::{
    BrowserPage, PageLease, ScriptedSession, ScriptedStep,
};

async fn extract_from(html: String) -> Result<Vec<AdRecord>, BrowserError> {
    let session = ScriptedSession::new(vec![ScriptedStep::Page(html)]);
    let page = PageLease::acquire(&session).await.expect("scripted page");
    page.navigate("https://www.kleinanzeigen.de/test", Duration::from_secs(1))
        .await
        .expect("scripted navigation");
    page.wait_for_network_idle().await.expect("scripted idle");
    extract_ads(&*page).await
}

#[tokio::test]
async fn extracts_records_in_dom_order() {
    let html = results_page(&[
        listing("2001", "Schreibtischlampe", "1.250 € VB", "Kaum benutzt"),
        listing("2002", "Stehlampe", "15 €", "Abholung in Mitte"),
    ]);

    let ads = extract_from(html).await.expect("extraction succeeds");

    assert_eq!(
        ads,
        vec![
            AdRecord {
                id: "2001".to_string(),
                url: "https://www.kleinanzeigen.de/s-anzeige/2001/2001-161-3331".to_string(),
                title: "Schreibtischlampe".to_string(),
                price: "1250".to_string(),
                description: "Kaum benutzt".to_string(),
            },
            AdRecord {
                id: "2002".to_string(),
                url: "https://www.kleinanzeigen.de/s-anzeige/2002/2002-161-3331".to_string(),
                title: "Stehlampe".to_string(),
                price: "15".to_string(),
                description: "Abholung in Mitte".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn promoted_listings_are_never_returned() {
    let top_ad = listing("9001", "Top Lampe", "99 €", "Gesponsert")
        .replacen("ad-listitem", "ad-listitem is-topad", 1);
    let pro_ad = listing("9002", "Pro Lampe", "49 €", "Händler")
        .replacen("ad-listitem", "ad-listitem badge-hint-pro-small-srp", 1);
    let html = results_page(&[top_ad, listing("2001", "Lampe", "5 €", "Alt"), pro_ad]);

    let ads = extract_from(html).await.expect("extraction succeeds");

    let ids: Vec<_> = ads.iter().map(|ad| ad.id.as_str()).collect();
    assert_eq!(ids, ["2001"]);
}

#[tokio::test]
async fn records_need_both_id_and_href() {
    let no_article = r#"<li class="ad-listitem"><div>Werbung</div></li>"#.to_string();
    let no_id = listing("", "Ohne ID", "1 €", "x");
    let no_href = listing("3003", "Ohne Link", "1 €", "x")
        .replace(r#"data-href="/s-anzeige/3003/3003-161-3331""#, "");
    let bare = r#"<li class="ad-listitem">
                    <article data-adid="3004" data-href="/s-anzeige/bare/3004"></article>
                  </li>"#
        .to_string();
    let html = results_page(&[no_article, no_id, no_href, bare]);

    let ads = extract_from(html).await.expect("extraction succeeds");

    assert_eq!(
        ads,
        vec![AdRecord {
            id: "3004".to_string(),
            url: "https://www.kleinanzeigen.de/s-anzeige/bare/3004".to_string(),
            ..AdRecord::default()
        }]
    );
}

#[tokio::test]
async fn empty_result_page_yields_no_records() {
    let ads = extract_from(results_page(&[])).await.expect("extraction succeeds");
    assert!(ads.is_empty());
}

#[tokio::test]
async fn broken_dom_is_an_extraction_error() {
    let session = ScriptedSession::new(vec![ScriptedStep::BrokenDom("target closed".to_string())]);
    let page = PageLease::acquire(&session).await.expect("scripted page");
    page.navigate("https://www.kleinanzeigen.de/test", Duration::from_secs(1))
        .await
        .expect("scripted navigation");
    page.wait_for_network_idle().await.expect("scripted idle");

    let err = extract_ads(&*page).await.expect_err("query must fail");
    assert!(matches!(err, BrowserError::Query { .. }));
}
