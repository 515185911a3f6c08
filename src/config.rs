use crate::error::{CrawlError, Result};
use crate::filter::{DomainMatch, FragmentPolicy, UrlFilter, UrlFilterConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Order in which the frontier is drained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// Links found on a page are expanded before its siblings
    #[default]
    DepthFirst,
    /// Pages are fetched level by level
    BreadthFirst,
}

/// Configuration for a single crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// URL to start crawling from
    pub start_url: String,

    /// Targets at this depth or deeper are never fetched
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Number of browser sessions fetching in parallel
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds allowed for a single navigation
    #[serde(default = "default_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Seconds allowed for reading content and links from a loaded page
    #[serde(default = "default_timeout_secs")]
    pub extraction_timeout_secs: u64,

    /// Maximum runtime of the whole crawl (no limit when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timeout_secs: Option<u64>,

    #[serde(default)]
    pub traversal: TraversalOrder,

    /// How discovered link hosts are compared against the seed host
    #[serde(default)]
    pub domain_match: DomainMatch,

    /// What to do with links carrying a `#fragment`
    #[serde(default)]
    pub fragment_policy: FragmentPolicy,

    /// Regex patterns for URLs to include
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude, on top of the static asset defaults
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Only follow links whose path starts with this prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_path_prefix: Option<String>,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Ask the browser to run without a window
    #[serde(default = "default_headless")]
    pub headless: bool,
}

/// Default value for max_depth
fn default_max_depth() -> usize {
    3
}

/// Default value for max_concurrency
fn default_max_concurrency() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

impl CrawlerConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            max_depth: default_max_depth(),
            max_concurrency: default_max_concurrency(),
            navigation_timeout_secs: default_timeout_secs(),
            extraction_timeout_secs: default_timeout_secs(),
            total_timeout_secs: None,
            traversal: TraversalOrder::default(),
            domain_match: DomainMatch::default(),
            fragment_policy: FragmentPolicy::default(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            required_path_prefix: None,
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CrawlError::io(path, e))?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CrawlError::config(format!("invalid crawler config: {e}")))
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_secs.map(Duration::from_secs)
    }

    /// Parses the start URL, rejecting anything that is not an absolute http(s) URL with a host
    pub fn seed_url(&self) -> Result<Url> {
        let url = Url::parse(&self.start_url).map_err(|e| {
            CrawlError::config(format!("invalid start URL {:?}: {e}", self.start_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CrawlError::config(format!(
                "start URL must use http or https, got {:?}",
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(CrawlError::config(format!(
                "start URL {:?} has no host",
                self.start_url
            )));
        }
        Ok(url)
    }

    /// Checks every setting that would otherwise fail in the middle of a run
    pub fn validate(&self) -> Result<()> {
        self.seed_url()?;
        if self.max_concurrency == 0 {
            return Err(CrawlError::config("max_concurrency must be at least 1"));
        }
        if self.navigation_timeout_secs == 0 || self.extraction_timeout_secs == 0 {
            return Err(CrawlError::config("timeouts must be greater than zero"));
        }
        if self.total_timeout_secs == Some(0) {
            return Err(CrawlError::config("total_timeout_secs must be greater than zero"));
        }
        self.url_filter()?;
        Ok(())
    }

    /// Builds the link filter scoped to the seed's host
    pub fn url_filter(&self) -> Result<UrlFilter> {
        let seed = self.seed_url()?;
        let mut filter_config = UrlFilterConfig::for_seed(&seed);
        filter_config.domain_match = self.domain_match;
        filter_config.fragment_policy = self.fragment_policy;
        filter_config.required_path_prefix = self.required_path_prefix.clone();
        filter_config.include_patterns = self.include_patterns.clone();
        filter_config
            .exclude_patterns
            .extend(self.exclude_patterns.iter().cloned());

        UrlFilter::new(filter_config)
            .map_err(|e| CrawlError::config(format!("invalid URL pattern: {e}")))
    }
}
