//! In-memory browser engine for crawl tests.

use crate::crawlers::crawler::{BrowserEngine, PageSession};
use crate::error::{CrawlError, SessionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

#[derive(Debug, Clone)]
pub struct MockPage {
    html: String,
    reachable: bool,
    load_delay: Duration,
    read_delay: Duration,
    final_url: Option<String>,
    url_available: bool,
}

impl MockPage {
    pub fn html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            reachable: true,
            load_delay: Duration::ZERO,
            read_delay: Duration::ZERO,
            final_url: None,
            url_available: true,
        }
    }

    /// A page whose navigation always fails, like a DNS error
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::html("")
        }
    }

    /// A page linking to each of `urls`
    pub fn linking(title: &str, urls: &[&str]) -> Self {
        let anchors: String = urls
            .iter()
            .map(|u| format!("<a href=\"{u}\">{u}</a>"))
            .collect();
        Self::html(&format!(
            "<html><head><title>{title}</title></head><body><h1>{title}</h1><p>About {title}.</p>{anchors}</body></html>"
        ))
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn redirected_to(mut self, url: &str) -> Self {
        self.final_url = Some(url.to_string());
        self
    }

    /// Reading the session's current URL fails once this page is loaded
    pub fn with_url_unavailable(mut self) -> Self {
        self.url_available = false;
        self
    }
}

#[derive(Debug, Default)]
struct SiteState {
    gotos: HashMap<String, usize>,
    opened: usize,
    closed: usize,
}

#[derive(Debug, Default)]
struct SiteInner {
    pages: HashMap<String, MockPage>,
    /// Opening more sessions than this fails
    max_sessions: Option<usize>,
    state: Mutex<SiteState>,
}

/// Cloneable handle; clones share pages and counters
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    inner: Arc<SiteInner>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner_mut(&mut self) -> &mut SiteInner {
        Arc::get_mut(&mut self.inner).expect("configure the site before sharing it")
    }

    pub fn page(mut self, url: &str, page: MockPage) -> Self {
        self.inner_mut().pages.insert(url.to_string(), page);
        self
    }

    pub fn max_sessions(mut self, limit: usize) -> Self {
        self.inner_mut().max_sessions = Some(limit);
        self
    }

    pub fn goto_count(&self, url: &str) -> usize {
        let state = self.inner.state.lock().unwrap();
        state.gotos.get(url).copied().unwrap_or(0)
    }

    pub fn total_gotos(&self) -> usize {
        self.inner.state.lock().unwrap().gotos.values().sum()
    }

    pub fn opened(&self) -> usize {
        self.inner.state.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.inner.state.lock().unwrap().closed
    }
}

impl BrowserEngine for MockSite {
    type Session = MockSession;

    async fn open_session(&self) -> Result<MockSession, CrawlError> {
        let mut state = self.inner.state.lock().unwrap();
        if self.inner.max_sessions.is_some_and(|max| state.opened >= max) {
            return Err(CrawlError::EngineInit("no more browser sessions".to_string()));
        }
        state.opened += 1;
        Ok(MockSession {
            site: Arc::clone(&self.inner),
            current: None,
            busy_until: None,
        })
    }
}

/// Commands run one at a time, like a WebDriver session: a navigation whose
/// caller gave up keeps the browser busy until the page would have loaded.
pub struct MockSession {
    site: Arc<SiteInner>,
    current: Option<(String, MockPage)>,
    busy_until: Option<Instant>,
}

impl MockSession {
    async fn wait_until_idle(&mut self) {
        if let Some(until) = self.busy_until {
            tokio::time::sleep_until(until).await;
            self.busy_until = None;
        }
    }
}

impl PageSession for MockSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.wait_until_idle().await;
        {
            let mut state = self.site.state.lock().unwrap();
            *state.gotos.entry(url.to_string()).or_default() += 1;
        }
        self.current = None;

        let page = match self.site.pages.get(url) {
            Some(page) if page.reachable => page.clone(),
            _ => return Err(SessionError::new("net::ERR_NAME_NOT_RESOLVED")),
        };
        let loaded_at = Instant::now() + page.load_delay;
        self.busy_until = Some(loaded_at);
        tokio::time::sleep_until(loaded_at).await;
        self.busy_until = None;

        let final_url = page.final_url.clone().unwrap_or_else(|| url.to_string());
        self.current = Some((final_url, page));
        Ok(())
    }

    async fn source(&mut self) -> Result<String, SessionError> {
        self.wait_until_idle().await;
        let (_, page) = self
            .current
            .as_ref()
            .ok_or_else(|| SessionError::new("no page loaded"))?;
        let (html, delay) = (page.html.clone(), page.read_delay);
        tokio::time::sleep(delay).await;
        Ok(html)
    }

    async fn current_url(&mut self) -> Result<Url, SessionError> {
        self.wait_until_idle().await;
        let (url, page) = self
            .current
            .as_ref()
            .ok_or_else(|| SessionError::new("no page loaded"))?;
        if !page.url_available {
            return Err(SessionError::new("no such window"));
        }
        Url::parse(url).map_err(|e| SessionError::new(e.to_string()))
    }

    async fn close(self) -> Result<(), SessionError> {
        self.site.state.lock().unwrap().closed += 1;
        Ok(())
    }
}
