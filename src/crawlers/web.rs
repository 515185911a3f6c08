use crate::config::CrawlerConfig;
use crate::crawlers::crawler::{BrowserEngine, PageSession};
use crate::error::{CrawlError, SessionError};
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Common local WebDriver endpoints tried when the configured one refuses
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // GeckoDriver / Selenium default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
    "http://localhost:9222", // Chrome debug port default
];

/// Browser engine backed by a WebDriver server (ChromeDriver, GeckoDriver, Selenium)
#[derive(Debug, Clone)]
pub struct WebDriverEngine {
    webdriver_url: String,
    headless: bool,
    /// Server-side bound on a navigation; without it a page the crawler gave up
    /// on keeps the session busy for the driver's default of 300 seconds
    page_load_timeout: Option<Duration>,
    script_timeout: Option<Duration>,
}

impl WebDriverEngine {
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
            page_load_timeout: None,
            script_timeout: None,
        }
    }

    /// Ask the WebDriver server to abandon page loads and scripts after these limits
    pub fn with_timeouts(mut self, page_load: Duration, script: Duration) -> Self {
        self.page_load_timeout = Some(page_load);
        self.script_timeout = Some(script);
        self
    }

    /// Engine for a crawl config, honoring a non-empty `WEBDRIVER_URL` override
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let webdriver_url = std::env::var("WEBDRIVER_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| config.webdriver_url.clone());
        Self::new(webdriver_url, config.headless)
            .with_timeouts(config.navigation_timeout(), config.extraction_timeout())
    }

    pub fn webdriver_url(&self) -> &str {
        &self.webdriver_url
    }

    /// Session capabilities: return from navigation at DOMContentLoaded, optionally headless
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert("pageLoadStrategy".to_string(), json!("eager"));

        let mut timeouts = serde_json::Map::new();
        if let Some(page_load) = self.page_load_timeout {
            timeouts.insert("pageLoad".to_string(), json!(page_load.as_millis() as u64));
        }
        if let Some(script) = self.script_timeout {
            timeouts.insert("script".to_string(), json!(script.as_millis() as u64));
        }
        if !timeouts.is_empty() {
            caps.insert("timeouts".to_string(), serde_json::Value::Object(timeouts));
        }

        if self.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    async fn connect(&self, webdriver_url: &str) -> Result<Client, fantoccini::error::NewSessionError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        builder.connect(webdriver_url).await
    }

    /// Connects to the configured WebDriver instance, falling back to common local ports
    async fn connect_to_webdriver(&self) -> Result<Client, CrawlError> {
        let first_error = match self.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(client);
            }
            Err(e) => {
                ::log::warn!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                e.to_string()
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS {
            if url == self.webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(client);
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(CrawlError::EngineInit(format!(
            "no WebDriver server accepted a session (tried {} and fallbacks): {}",
            self.webdriver_url, first_error
        )))
    }
}

impl BrowserEngine for WebDriverEngine {
    type Session = WebDriverSession;

    async fn open_session(&self) -> Result<WebDriverSession, CrawlError> {
        let client = self.connect_to_webdriver().await?;
        Ok(WebDriverSession { client })
    }
}

/// One WebDriver session driving a single browser window
pub struct WebDriverSession {
    client: Client,
}

impl PageSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.client.goto(url).await.map_err(SessionError::from)
    }

    async fn source(&mut self) -> Result<String, SessionError> {
        self.client.source().await.map_err(SessionError::from)
    }

    async fn current_url(&mut self) -> Result<Url, SessionError> {
        self.client.current_url().await.map_err(SessionError::from)
    }

    async fn close(self) -> Result<(), SessionError> {
        self.client.close().await.map_err(SessionError::from)
    }
}
