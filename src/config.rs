//! Command-line and environment configuration.

use crate::scrapers::search_url::DEFAULT_CATEGORY_SLUG;
use crate::scrapers::types::{PageCount, SearchFilters};
use crate::scrapers::{ChromeSettings, CrawlSettings};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "kleinanzeigen-scout", version)]
#[command(about = "Crawl kleinanzeigen.de search results with headless Chrome")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub browser: BrowserArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP search endpoint
    Serve(ServeArgs),
    /// Run a single crawl and save the ads as JSON
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Full listen address; takes precedence over --port
    #[arg(long, env = "KLEINANZEIGEN_BIND")]
    pub bind: Option<SocketAddr>,

    /// Port to listen on at 0.0.0.0
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

impl ServeArgs {
    pub fn address(&self) -> SocketAddr {
        self.bind
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }
}

#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// Run Chrome without a window (default)
    #[arg(long, global = true, overrides_with = "no_headless")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long, global = true, env = "KLEINANZEIGEN_NO_HEADLESS", overrides_with = "headless")]
    pub no_headless: bool,

    /// Disable the Chrome sandbox (needed in most containers)
    #[arg(long, global = true, env = "KLEINANZEIGEN_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Chrome/Chromium executable; auto-detected when omitted
    #[arg(long, global = true, env = "KLEINANZEIGEN_CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, global = true, env = "KLEINANZEIGEN_NAVIGATION_TIMEOUT_SECS", default_value_t = 120)]
    pub navigation_timeout_secs: u64,

    #[arg(long, global = true, env = "KLEINANZEIGEN_IDLE_TIMEOUT_SECS", default_value_t = 30)]
    pub idle_timeout_secs: u64,

    #[arg(long, global = true, env = "KLEINANZEIGEN_IDLE_QUIET_MS", default_value_t = 500)]
    pub idle_quiet_ms: u64,

    #[arg(long, global = true, env = "KLEINANZEIGEN_CATEGORY_SLUG", default_value = DEFAULT_CATEGORY_SLUG)]
    pub category_slug: String,
}

impl BrowserArgs {
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            category_slug: self.category_slug.clone(),
        }
    }

    pub fn chrome_settings(&self) -> ChromeSettings {
        ChromeSettings {
            headless: !self.no_headless,
            sandbox: !self.no_sandbox,
            chrome_path: self.chrome_path.clone(),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            idle_quiet: Duration::from_millis(self.idle_quiet_ms),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Free-text keywords
    #[arg(short, long)]
    pub query: Option<String>,
    /// Category token, e.g. c161
    #[arg(long)]
    pub category_id: Option<String>,
    /// Location token, e.g. l3331
    #[arg(long)]
    pub location_id: Option<String>,
    #[arg(long, alias = "plz")]
    pub postal_code: Option<String>,
    /// Radius in km
    #[arg(long)]
    pub radius: Option<u32>,
    #[arg(long)]
    pub min_price: Option<u64>,
    #[arg(long)]
    pub max_price: Option<u64>,
    /// Result pages to crawl (1-20)
    #[arg(long, default_value_t = 1, value_parser = parse_page_count)]
    pub page_count: u32,
    /// "price" sorts by ascending price
    #[arg(long)]
    pub sort: Option<String>,
    /// Where to write the JSON report
    #[arg(short, long, default_value = "scraped_ads.json")]
    pub output: PathBuf,
}

impl SearchArgs {
    pub fn filters(&self) -> anyhow::Result<SearchFilters> {
        Ok(SearchFilters {
            query: self.query.clone(),
            category_id: self.category_id.clone(),
            location_id: self.location_id.clone(),
            postal_code: self.postal_code.clone(),
            radius: self.radius,
            min_price: self.min_price,
            max_price: self.max_price,
            page_count: PageCount::new(self.page_count)?,
            sort: self.sort.clone(),
        })
    }
}

fn parse_page_count(value: &str) -> Result<u32, String> {
    let count: u32 = value.parse().map_err(|e| format!("{e}"))?;
    PageCount::new(count).map(PageCount::get).map_err(|e| e.to_string())
}
