use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// How a link's host is compared with the seed host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainMatch {
    /// Parsed host must equal the seed host
    #[default]
    Exact,
    /// Parsed host must equal the seed host or end with `.<seed host>`
    Subdomains,
    /// Seed host may appear anywhere in the link text.
    /// Accepts hosts like `example.com.evil.com`; kept for parity with older crawls.
    Substring,
}

/// What to do with links that carry a `#fragment`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentPolicy {
    /// Drop the fragment and keep the link
    #[default]
    Strip,
    /// Drop the whole link
    Skip,
}

/// Configuration for URL filtering in crawlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host every followed link must belong to
    pub seed_host: String,

    /// Further hosts treated like the seed host, such as the one a seed redirects to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_aliases: Vec<String>,

    #[serde(default)]
    pub domain_match: DomainMatch,

    #[serde(default)]
    pub fragment_policy: FragmentPolicy,

    /// Path prefix restriction (if None, all paths are allowed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_path_prefix: Option<String>,

    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Static assets never carry page text
pub const DEFAULT_EXCLUDE_PATTERN: &str =
    r"(?i)\.(jpg|jpeg|png|gif|webp|css|js|ico|woff|woff2|ttf|eot|svg|pdf|zip|mp4|mp3)$";

impl UrlFilterConfig {
    /// Scope a filter to the host of the seed URL
    pub fn for_seed(seed: &Url) -> Self {
        Self {
            seed_host: seed_host(seed),
            host_aliases: Vec::new(),
            domain_match: DomainMatch::default(),
            fragment_policy: FragmentPolicy::default(),
            required_path_prefix: None,
            include_patterns: Vec::new(),
            exclude_patterns: vec![DEFAULT_EXCLUDE_PATTERN.to_string()],
        }
    }
}

/// Host of a URL with its explicit port, if any (the `netloc` without credentials)
fn seed_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// URL filter that uses regex patterns and other rules to determine which URLs to crawl
#[derive(Debug, Clone)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            include_regexes,
            exclude_regexes,
        })
    }

    pub fn config(&self) -> &UrlFilterConfig {
        &self.config
    }

    /// A copy of this filter that also accepts the host of `url`, or `None`
    /// when that host is already in scope
    pub fn allowing_host_of(&self, url: &Url) -> Option<Self> {
        if url.host_str().is_none() || self.is_in_domain_scope(url) {
            return None;
        }
        let mut filter = self.clone();
        filter.config.host_aliases.push(seed_host(url));
        Some(filter)
    }

    /// Resolve a raw `href` against the page it was found on and return the
    /// normalized URL if it may join the frontier.
    pub fn accept(&self, href: &str, base: &Url) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let resolved = base.join(href).ok()?;

        if self.config.fragment_policy == FragmentPolicy::Skip && resolved.fragment().is_some() {
            ::log::trace!("Skipping link with fragment: {}", resolved);
            return None;
        }

        if !self.should_crawl(&resolved) {
            ::log::trace!("URL filter rejected: {}", resolved);
            return None;
        }

        Some(normalize_url(&resolved).to_string())
    }

    /// Determine if a URL should be crawled based on all filtering rules
    pub fn should_crawl(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_in_domain_scope(url) {
            return false;
        }

        if !self.is_in_path_scope(url) {
            return false;
        }

        // Exclusions take precedence over inclusions
        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url_str))
    }

    /// Check if a URL is within the allowed domain scope
    fn is_in_domain_scope(&self, url: &Url) -> bool {
        std::iter::once(&self.config.seed_host)
            .chain(&self.config.host_aliases)
            .filter(|allowed| !allowed.is_empty())
            .any(|allowed| self.host_matches(url, allowed))
    }

    fn host_matches(&self, url: &Url, allowed: &str) -> bool {
        match self.config.domain_match {
            DomainMatch::Exact => seed_host(url) == allowed,
            DomainMatch::Subdomains => {
                let host = seed_host(url);
                host == allowed || host.ends_with(&format!(".{allowed}"))
            }
            DomainMatch::Substring => url.as_str().to_ascii_lowercase().contains(allowed),
        }
    }

    /// Check if a URL is within the required path scope
    fn is_in_path_scope(&self, url: &Url) -> bool {
        match &self.config.required_path_prefix {
            Some(prefix) => url.path().starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// Reduce a URL to scheme, host, port and path; query and fragment are dropped
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);
    normalized
}
