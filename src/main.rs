use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use kleinanzeigen_scout::config::{BrowserArgs, Cli, Command, SearchArgs};
use kleinanzeigen_scout::models::AdRecord;
use kleinanzeigen_scout::scrapers::{
    ChromeSessionProvider, KleinanzeigenScraper, ListingSource, SearchFilters,
};
use kleinanzeigen_scout::server;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// What `search` writes to disk
#[derive(Debug, Serialize)]
struct SearchReport<'a> {
    scraped_at: DateTime<Utc>,
    filters: &'a SearchFilters,
    count: usize,
    ads: &'a [AdRecord],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let scraper = build_scraper(&cli.browser);

    match cli.command {
        Command::Serve(args) => {
            info!("🔍 Kleinanzeigen Scout - search API");
            server::serve(args.address(), Arc::new(scraper)).await?;
        }
        Command::Search(args) => run_search(&scraper, &args).await?,
    }

    Ok(())
}

fn build_scraper(args: &BrowserArgs) -> KleinanzeigenScraper<ChromeSessionProvider> {
    let settings = args.crawl_settings();
    let provider = ChromeSessionProvider::new(args.chrome_settings(), settings.navigation_timeout);
    KleinanzeigenScraper::with_settings(Arc::new(provider), settings)
}

async fn run_search(scraper: &impl ListingSource, args: &SearchArgs) -> anyhow::Result<()> {
    let filters = args.filters()?;

    info!("Starting crawl of {} result pages from {}...", filters.page_count.get(), scraper.source_name());
    let ads = scraper.search(&filters).await.context("Crawl failed")?;

    info!("✅ Scraped {} ads", ads.len());
    for (i, ad) in ads.iter().enumerate() {
        println!("{}. {} ({} €)", i + 1, ad.title, ad.price);
        println!("   ID: {}", ad.id);
        println!("   URL: {}", ad.url);
    }

    let report = SearchReport {
        scraped_at: Utc::now(),
        filters: &filters,
        count: ads.len(),
        ads: &ads,
    };
    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write(&args.output, json)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("💾 Saved ads to {}", args.output.display());

    Ok(())
}
