#![allow(dead_code)]

use kleinanzeigen_scout::scrapers::{PageCount, SearchFilters};

/// One organic result list item as the search page renders it
pub fn listing(id: &str, title: &str, price: &str, description: &str) -> String {
    format!(
        r#"<li class="ad-listitem lazyload-item">
             <article class="aditem" data-adid="{id}" data-href="/s-anzeige/{id}/{id}-161-3331">
               <div class="aditem-main">
                 <h2 class="text-module-begin"><a class="ellipsis" href="/s-anzeige/{id}">{title}</a></h2>
                 <p class="aditem-main--middle--price-shipping--price">{price}</p>
                 <p class="aditem-main--middle--description">{description}</p>
               </div>
             </article>
           </li>"#
    )
}

pub fn results_page(items: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Ergebnisse</title></head><body>
           <ul id="srchrslt-adtable" class="itemlist">{}</ul>
           </body></html>"#,
        items.concat()
    )
}

pub fn filters(page_count: u32) -> SearchFilters {
    SearchFilters {
        query: Some("lamp".to_string()),
        category_id: Some("c161".to_string()),
        location_id: Some("l3331".to_string()),
        postal_code: Some("10115".to_string()),
        radius: Some(20),
        page_count: PageCount::new(page_count).expect("page count in range"),
        ..SearchFilters::default()
    }
}
