use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

/// Structured text read from one page.
///
/// Every field is always present; empty sets serialize as `[]`, a missing
/// title as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub title: String,

    /// Distinct non-empty texts of `h1`, `h2` and `h3` elements
    #[serde(default)]
    pub headings: BTreeSet<String>,

    /// Distinct non-empty texts of `p` elements
    #[serde(default)]
    pub paragraphs: BTreeSet<String>,

    /// Distinct non-empty texts of `ul` and `ol` elements
    #[serde(default)]
    pub lists: BTreeSet<String>,
}

/// Mapping from normalized page URL to its content.
///
/// Serializes as a plain JSON object keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawlResult {
    pages: BTreeMap<String, PageContent>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: String, content: PageContent) {
        self.pages.insert(url, content);
    }

    pub fn get(&self, url: &str) -> Option<&PageContent> {
        self.pages.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Write the result as indented UTF-8 JSON, creating parent directories as needed
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CrawlError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| CrawlError::io(path, e))
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CrawlError::io(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Which step of a page visit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NavigationTimeout,
    Navigation,
    ExtractionTimeout,
    Extraction,
}

/// A page that was visited but failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlFailure {
    pub url: String,
    pub depth: usize,
    pub kind: FailureKind,
    pub message: String,
}

impl CrawlFailure {
    /// Record a per-page error; run-level errors yield `None`
    pub fn from_error(error: &CrawlError, depth: usize) -> Option<Self> {
        let (url, kind) = match error {
            CrawlError::Navigation { url, .. } => (url, FailureKind::Navigation),
            CrawlError::NavigationTimeout { url, .. } => (url, FailureKind::NavigationTimeout),
            CrawlError::Extraction { url, .. } => (url, FailureKind::Extraction),
            CrawlError::ExtractionTimeout { url, .. } => (url, FailureKind::ExtractionTimeout),
            _ => return None,
        };
        Some(Self {
            url: url.clone(),
            depth,
            kind,
            message: error.to_string(),
        })
    }
}

/// Everything a finished run knows about itself
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub pages: CrawlResult,
    /// Every URL a fetch was attempted for, successful or not
    pub visited: BTreeSet<String>,
    pub failures: Vec<CrawlFailure>,
    /// Number of navigation attempts issued
    pub fetch_attempts: usize,
    pub elapsed: Duration,
    /// The run stopped early because its cancellation token was tripped
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn into_result(self) -> CrawlResult {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CrawlResult {
        let mut result = CrawlResult::new();
        result.insert(
            "https://example.com/".to_string(),
            PageContent {
                title: "Home".to_string(),
                headings: BTreeSet::from(["Welcome".to_string()]),
                paragraphs: BTreeSet::from(["Ünïcode text".to_string()]),
                lists: BTreeSet::new(),
            },
        );
        result.insert("https://example.com/empty".to_string(), PageContent::default());
        result
    }

    #[test]
    fn test_json_is_keyed_by_url_with_all_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        let empty = &value["https://example.com/empty"];
        assert_eq!(empty["title"], "");
        assert_eq!(empty["headings"], serde_json::json!([]));
        assert_eq!(empty["paragraphs"], serde_json::json!([]));
        assert_eq!(empty["lists"], serde_json::json!([]));
        assert_eq!(value["https://example.com/"]["headings"][0], "Welcome");
    }

    #[test]
    fn test_missing_fields_default_on_load() {
        let result: CrawlResult =
            serde_json::from_str(r#"{"https://example.com/": {"title": "Only a title"}}"#).unwrap();
        let page = result.get("https://example.com/").unwrap();
        assert_eq!(page.title, "Only a title");
        assert!(page.headings.is_empty() && page.paragraphs.is_empty() && page.lists.is_empty());
    }

    #[test]
    fn test_failure_from_per_page_errors_only() {
        let err = CrawlError::NavigationTimeout {
            url: "https://example.com/slow".to_string(),
            timeout: Duration::from_secs(30),
        };
        let failure = CrawlFailure::from_error(&err, 2).unwrap();
        assert_eq!(failure.url, "https://example.com/slow");
        assert_eq!(failure.depth, 2);
        assert_eq!(failure.kind, FailureKind::NavigationTimeout);

        let err = CrawlError::extraction("https://example.com/x", "stale element");
        assert_eq!(
            CrawlFailure::from_error(&err, 0).map(|f| f.kind),
            Some(FailureKind::Extraction)
        );

        assert!(CrawlFailure::from_error(&CrawlError::EngineInit("down".into()), 0).is_none());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("example.com_content.json");

        let result = sample();
        result.save_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"https://example.com/\""));
        assert!(text.contains("Ünïcode text"));

        assert_eq!(CrawlResult::load_json(&path).unwrap(), result);
    }
}
