use crate::error::{CrawlError, SessionError};
use std::future::Future;
use url::Url;

/// A browser engine that can hand out page sessions.
///
/// Each session is one browsing context with a single page, owned by one
/// crawl worker for the whole run.
pub trait BrowserEngine: Send + Sync + 'static {
    type Session: PageSession;

    /// Open a new browsing context. Failing here at startup is fatal to the run.
    fn open_session(&self) -> impl Future<Output = Result<Self::Session, CrawlError>> + Send;
}

/// A single live page that can be navigated and read
pub trait PageSession: Send + 'static {
    /// Navigate to `url`, returning once the DOM has been parsed
    fn goto(&mut self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Serialized form of the current DOM
    fn source(&mut self) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// URL of the loaded document, after redirects
    fn current_url(&mut self) -> impl Future<Output = Result<Url, SessionError>> + Send;

    /// Tear the session down
    fn close(self) -> impl Future<Output = Result<(), SessionError>> + Send;
}
