use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use web_reader::{CrawlerConfig, DomainMatch, TraversalOrder};

#[derive(Parser, Debug)]
#[command(name = "web-reader")]
#[command(about = "Reads the text of every same-domain page reachable from a URL")]
#[command(version)]
pub struct Args {
    /// URL to start reading from (absolute, with scheme)
    pub url: String,

    /// JSON configuration file; command-line flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pages this many link hops from the start URL or more are not read
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Number of browser sessions reading in parallel
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// WebDriver server URL (WEBDRIVER_URL takes precedence)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Navigation timeout per page in seconds
    #[arg(long)]
    pub navigation_timeout: Option<u64>,

    /// Content extraction timeout per page in seconds
    #[arg(long)]
    pub extraction_timeout: Option<u64>,

    /// Total timeout in seconds (maximum runtime)
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// Traversal order
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// How link hosts are matched against the start URL's host
    #[arg(long, value_enum)]
    pub domain_match: Option<DomainMatchArg>,

    /// Show the browser window
    #[arg(long)]
    pub no_headless: bool,

    /// Where to write the JSON result (default: data/<url>_content.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Dfs,
    Bfs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DomainMatchArg {
    Exact,
    Subdomains,
    Substring,
}

impl From<OrderArg> for TraversalOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Dfs => TraversalOrder::DepthFirst,
            OrderArg::Bfs => TraversalOrder::BreadthFirst,
        }
    }
}

impl From<DomainMatchArg> for DomainMatch {
    fn from(arg: DomainMatchArg) -> Self {
        match arg {
            DomainMatchArg::Exact => DomainMatch::Exact,
            DomainMatchArg::Subdomains => DomainMatch::Subdomains,
            DomainMatchArg::Substring => DomainMatch::Substring,
        }
    }
}

impl Args {
    /// Apply command-line overrides on top of a base configuration
    pub fn apply(&self, mut config: CrawlerConfig) -> CrawlerConfig {
        config.start_url = self.url.clone();
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            config.webdriver_url = webdriver_url.clone();
        }
        if let Some(secs) = self.navigation_timeout {
            config.navigation_timeout_secs = secs;
        }
        if let Some(secs) = self.extraction_timeout {
            config.extraction_timeout_secs = secs;
        }
        if let Some(secs) = self.total_timeout {
            config.total_timeout_secs = Some(secs);
        }
        if let Some(order) = self.order {
            config.traversal = order.into();
        }
        if let Some(domain_match) = self.domain_match {
            config.domain_match = domain_match.into();
        }
        if self.no_headless {
            config.headless = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "web-reader",
            "https://example.com/",
            "--max-depth",
            "2",
            "-j",
            "4",
            "--order",
            "bfs",
            "--domain-match",
            "subdomains",
            "--no-headless",
        ]);
        let mut base = CrawlerConfig::new("https://from-file.example/");
        base.extraction_timeout_secs = 10;

        let config = args.apply(base);
        assert_eq!(config.start_url, "https://example.com/");
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.traversal, TraversalOrder::BreadthFirst);
        assert_eq!(config.domain_match, DomainMatch::Subdomains);
        assert_eq!(config.extraction_timeout_secs, 10);
        assert!(!config.headless);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = Args::parse_from(["web-reader", "https://example.com/"]);
        let config = args.apply(CrawlerConfig::new("https://example.com/"));
        assert_eq!(config.max_depth, 3);
        assert!(config.headless);
        assert!(args.output.is_none());
    }
}
