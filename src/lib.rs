//! Bounded-depth, single-domain web reader.
//!
//! Starting from a seed URL, a [`Crawler`] drives one or more browser
//! sessions through every same-domain page within `max_depth` link hops and
//! returns a [`CrawlResult`] mapping each page URL to its title, headings,
//! paragraphs and lists.

pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{CrawlerConfig, TraversalOrder};
pub use crawlers::{BrowserEngine, Crawler, PageSession, WebDriverEngine};
pub use error::{CrawlError, Result};
pub use filter::{DomainMatch, FragmentPolicy};
pub use results::{CrawlFailure, CrawlReport, CrawlResult, FailureKind, PageContent};

use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Builder for a single crawl run
#[derive(Debug, Clone)]
pub struct SiteReader {
    config: CrawlerConfig,
    cancel: Option<CancellationToken>,
}

impl SiteReader {
    /// Create a reader for `start_url` with default settings
    pub fn new(start_url: &str) -> Self {
        Self {
            config: CrawlerConfig::new(start_url),
            cancel: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: CrawlerConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = CrawlerConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, config_str: &str) -> Result<Self> {
        let config = CrawlerConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Targets at this many hops from the seed or more are not fetched
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the number of browser sessions fetching in parallel
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the total timeout (maximum runtime)
    pub fn with_total_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.total_timeout_secs = Some(timeout_seconds);
        self
    }

    /// Stop scheduling new pages once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl through the configured WebDriver server
    pub async fn read(self) -> Result<CrawlReport> {
        let engine = WebDriverEngine::from_config(&self.config);
        ::log::debug!("Using WebDriver at {}", engine.webdriver_url());
        self.read_with(engine).await
    }

    /// Crawl through any browser engine
    pub async fn read_with<E: BrowserEngine>(self, engine: E) -> Result<CrawlReport> {
        let crawler = Crawler::new(self.config, engine)?;
        crawler
            .run_with_cancellation(self.cancel.unwrap_or_default())
            .await
    }
}

/// Read a site through the default WebDriver endpoint and return its pages
pub async fn read_website(url: &str, max_depth: usize) -> Result<CrawlResult> {
    let report = SiteReader::new(url).with_max_depth(max_depth).read().await?;
    Ok(report.into_result())
}
