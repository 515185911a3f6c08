//! Crawl orchestration.
//!
//! A run opens one page session per worker, seeds the frontier with the
//! normalized start URL and lets the workers drain it. Every target goes
//! through fetch, content extraction and link discovery exactly once; a
//! failure in any step is recorded for that URL and the run carries on.
//!
//! A navigation that times out may leave the browser busy with the abandoned
//! page, so the worker swaps its session for a fresh one before going on.
//!
//! The run ends when the frontier is empty and no worker has a page in
//! flight, or when the cancellation token trips. Cancellation stops new
//! fetches; pages already in flight finish or hit their own timeouts. All
//! sessions are closed before the run returns, whatever the outcome.

use crate::config::CrawlerConfig;
use crate::crawlers::crawler::{BrowserEngine, PageSession};
use crate::crawlers::fetch;
use crate::crawlers::frontier::{CrawlTarget, Frontier, LinkSet};
use crate::error::{CrawlError, Result};
use crate::filter::{UrlFilter, normalize_url};
use crate::results::{CrawlFailure, CrawlReport, CrawlResult, PageContent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Crawls one site through a browser engine
pub struct Crawler<E: BrowserEngine> {
    config: CrawlerConfig,
    engine: Arc<E>,
}

/// Mutable state shared by all workers of a run
struct CrawlState {
    frontier: Frontier,
    /// Widened once if the seed redirects to another host
    filter: Arc<UrlFilter>,
    in_flight: usize,
    fetch_attempts: usize,
    pages: CrawlResult,
    failures: Vec<CrawlFailure>,
}

struct Shared {
    state: Mutex<CrawlState>,
    /// Signalled whenever a target completes, so idle workers re-check the frontier
    wakeup: Notify,
    cancel: CancellationToken,
    navigation_timeout: Duration,
    extraction_timeout: Duration,
}

/// What visiting one target produced
struct Visit {
    content: Option<PageContent>,
    links: LinkSet,
    failure: Option<CrawlError>,
    /// Replacement filter accepting the host the seed redirected to
    widened_filter: Option<UrlFilter>,
}

impl<E: BrowserEngine> Crawler<E> {
    /// Validate the configuration and bind it to an engine
    pub fn new(config: CrawlerConfig, engine: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl until the frontier is exhausted or the configured total timeout elapses
    pub async fn run(&self) -> Result<CrawlReport> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Crawl until the frontier is exhausted or `cancel` trips
    pub async fn run_with_cancellation(&self, cancel: CancellationToken) -> Result<CrawlReport> {
        let start_time = Instant::now();
        let seed = normalize_url(&self.config.seed_url()?).to_string();
        let filter = self.config.url_filter()?;

        ::log::info!(
            "Starting crawl of {} (max depth {}, {} worker(s), {:?} order)",
            seed,
            self.config.max_depth,
            self.config.max_concurrency,
            self.config.traversal
        );
        if self.config.max_depth == 0 {
            ::log::warn!("max_depth is 0, no page will be fetched");
        }

        let sessions = self.open_sessions().await?;

        // Cancelling the run's own token must not cancel the caller's
        let cancel = cancel.child_token();
        let deadline = self.config.total_timeout().map(|limit| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                ::log::warn!("Total timeout of {:?} reached, stopping crawl", limit);
                token.cancel();
            })
        });

        let mut frontier = Frontier::new(self.config.traversal, self.config.max_depth);
        frontier.push(CrawlTarget::seed(seed.clone()));

        let shared = Arc::new(Shared {
            state: Mutex::new(CrawlState {
                frontier,
                filter: Arc::new(filter),
                in_flight: 0,
                fetch_attempts: 0,
                pages: CrawlResult::new(),
                failures: Vec::new(),
            }),
            wakeup: Notify::new(),
            cancel,
            navigation_timeout: self.config.navigation_timeout(),
            extraction_timeout: self.config.extraction_timeout(),
        });

        let mut workers = JoinSet::new();
        for (worker_id, session) in sessions.into_iter().enumerate() {
            workers.spawn(run_worker(
                worker_id,
                session,
                Arc::clone(&self.engine),
                Arc::clone(&shared),
            ));
        }

        let mut finished = Vec::with_capacity(self.config.max_concurrency);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(session) => finished.push(session),
                Err(e) => {
                    // The panicked worker's target stays in flight forever; stop the others
                    ::log::error!("Crawl worker failed: {}", e);
                    shared.cancel.cancel();
                }
            }
        }

        let cancelled = shared.cancel.is_cancelled();
        if let Some(deadline) = deadline {
            deadline.abort();
        }
        close_sessions(finished).await;

        let mut state = shared.state.lock().await;
        let frontier = std::mem::replace(&mut state.frontier, Frontier::new(self.config.traversal, 0));
        let visited = frontier.into_visited().into_sorted();
        let report = CrawlReport {
            pages: std::mem::take(&mut state.pages),
            visited,
            fetch_attempts: state.fetch_attempts,
            failures: std::mem::take(&mut state.failures),
            elapsed: start_time.elapsed(),
            cancelled,
        };

        ::log::info!(
            "Crawl of {} complete - {} pages, {} visited, {} failures in {:.2} seconds{}",
            seed,
            report.pages.len(),
            report.visited.len(),
            report.failures.len(),
            report.elapsed.as_secs_f64(),
            if cancelled { " (cancelled)" } else { "" }
        );

        Ok(report)
    }

    /// Open one session per worker; on failure close what was opened and give up
    async fn open_sessions(&self) -> Result<Vec<E::Session>> {
        let mut sessions = Vec::with_capacity(self.config.max_concurrency);
        for worker_id in 0..self.config.max_concurrency {
            match self.engine.open_session().await {
                Ok(session) => {
                    ::log::debug!("Worker {} opened a browser session", worker_id);
                    sessions.push(session);
                }
                Err(e) => {
                    ::log::error!("Worker {} could not open a browser session: {}", worker_id, e);
                    close_sessions(sessions).await;
                    return Err(match e {
                        CrawlError::EngineInit(_) => e,
                        other => CrawlError::EngineInit(other.to_string()),
                    });
                }
            }
        }
        Ok(sessions)
    }
}

async fn close_sessions<S: PageSession>(sessions: Vec<S>) {
    for session in sessions {
        if let Err(e) = session.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }
    }
}

/// Processes targets until the frontier is drained or the run is cancelled,
/// then hands the session back for teardown.
async fn run_worker<E: BrowserEngine>(
    worker_id: usize,
    mut session: E::Session,
    engine: Arc<E>,
    shared: Arc<Shared>,
) -> E::Session {
    ::log::debug!("Worker {} starting processing loop", worker_id);

    while let Some((target, filter)) = next_target(worker_id, &shared).await {
        let visit = visit(worker_id, &mut session, &target, &filter, &shared).await;
        let stalled = matches!(visit.failure, Some(CrawlError::NavigationTimeout { .. }));
        complete_target(&shared, &target, visit).await;

        if stalled && !shared.cancel.is_cancelled() {
            session =
                replace_session(worker_id, session, engine.as_ref(), shared.navigation_timeout)
                    .await;
        }
    }

    ::log::debug!("Worker {} completed processing loop", worker_id);
    session
}

/// Open a fresh session in place of one stuck behind a timed-out navigation.
/// If no new session can be had, the old one is kept.
async fn replace_session<E: BrowserEngine>(
    worker_id: usize,
    stalled: E::Session,
    engine: &E,
    close_limit: Duration,
) -> E::Session {
    let fresh = match engine.open_session().await {
        Ok(fresh) => fresh,
        Err(e) => {
            ::log::warn!("Worker {} keeps its stalled browser session: {}", worker_id, e);
            return stalled;
        }
    };
    ::log::info!("Worker {} replaced its browser session after a navigation timeout", worker_id);

    match tokio::time::timeout(close_limit, stalled.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => ::log::warn!("Failed to close stalled browser session: {}", e),
        Err(_) => ::log::warn!("Gave up closing stalled browser session after {:?}", close_limit),
    }
    fresh
}

/// Claims the next target, waiting while other workers may still discover links
async fn next_target(worker_id: usize, shared: &Shared) -> Option<(CrawlTarget, Arc<UrlFilter>)> {
    loop {
        let notified = shared.wakeup.notified();
        tokio::pin!(notified);
        {
            let mut state = shared.state.lock().await;
            // Register before inspecting the state so a completion in between is not missed
            notified.as_mut().enable();

            if shared.cancel.is_cancelled() {
                ::log::debug!("Worker {} stopping, crawl cancelled", worker_id);
                return None;
            }
            if let Some(target) = state.frontier.pop() {
                state.in_flight += 1;
                state.fetch_attempts += 1;
                ::log::trace!("Worker {} claimed {} (depth {})", worker_id, target.url, target.depth);
                return Some((target, Arc::clone(&state.filter)));
            }
            if state.in_flight == 0 {
                return None;
            }
        }

        tokio::select! {
            _ = notified => {}
            _ = shared.cancel.cancelled() => {}
        }
    }
}

/// Fetch, extract and discover links for one target
async fn visit<S: PageSession>(
    worker_id: usize,
    session: &mut S,
    target: &CrawlTarget,
    filter: &UrlFilter,
    shared: &Shared,
) -> Visit {
    let started = Instant::now();
    let url = target.url.as_str();
    ::log::debug!("Worker {} fetching {} (depth {})", worker_id, url, target.depth);

    if let Err(e) = fetch::fetch(session, url, shared.navigation_timeout).await {
        log_failure(&e, target, started);
        return Visit {
            content: None,
            links: LinkSet::new(),
            failure: Some(e),
            widened_filter: None,
        };
    }

    let content = match fetch::extract_content(session, url, shared.extraction_timeout).await {
        Ok(content) => content,
        Err(e) => {
            log_failure(&e, target, started);
            return Visit {
                content: None,
                links: LinkSet::new(),
                failure: Some(e),
                widened_filter: None,
            };
        }
    };

    let widened_filter = if target.depth == 0 {
        seed_redirect_filter(session, target, filter, shared).await
    } else {
        None
    };
    let filter = widened_filter.as_ref().unwrap_or(filter);

    let (links, failure) =
        match fetch::discover_links(session, url, filter, shared.extraction_timeout).await {
            Ok(links) => (links, None),
            Err(e) => {
                log_failure(&e, target, started);
                (LinkSet::new(), Some(e))
            }
        };

    ::log::info!(
        "Read {} (depth {}): {} headings, {} paragraphs, {} lists, {} links in {:.2} seconds",
        url,
        target.depth,
        content.headings.len(),
        content.paragraphs.len(),
        content.lists.len(),
        links.len(),
        started.elapsed().as_secs_f64()
    );

    Visit {
        content: Some(content),
        links,
        failure,
        widened_filter,
    }
}

/// When the seed lands on another host (`example.com` to `www.example.com`),
/// links on that host count as same-domain for the rest of the run
async fn seed_redirect_filter<S: PageSession>(
    session: &mut S,
    target: &CrawlTarget,
    filter: &UrlFilter,
    shared: &Shared,
) -> Option<UrlFilter> {
    let landed = match fetch::landed_url(session, &target.url, shared.extraction_timeout).await {
        Ok(landed) => landed,
        Err(e) => {
            ::log::debug!("Could not read where {} landed: {}", target.url, e);
            return None;
        }
    };
    let widened = filter.allowing_host_of(&landed)?;
    ::log::info!(
        "Seed {} redirected to {}, following links on that host too",
        target.url,
        landed
    );
    Some(widened)
}

fn log_failure(error: &CrawlError, target: &CrawlTarget, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    match error {
        CrawlError::NavigationTimeout { .. } | CrawlError::ExtractionTimeout { .. } => {
            ::log::warn!("Timeout at depth {} after {:.2} seconds: {}", target.depth, elapsed, error);
        }
        _ => {
            ::log::error!("Error at depth {} after {:.2} seconds: {}", target.depth, elapsed, error);
        }
    }
}

/// Record a finished target and fold its links into the frontier
async fn complete_target(shared: &Shared, target: &CrawlTarget, visit: Visit) {
    {
        let mut state = shared.state.lock().await;
        state.in_flight -= 1;

        if let Some(filter) = visit.widened_filter {
            state.filter = Arc::new(filter);
        }
        if let Some(content) = visit.content {
            state.pages.insert(target.url.clone(), content);
        }
        if let Some(failure) = visit
            .failure
            .as_ref()
            .and_then(|e| CrawlFailure::from_error(e, target.depth))
        {
            state.failures.push(failure);
        }

        if !shared.cancel.is_cancelled() {
            let queued = state.frontier.extend(target, visit.links);
            ::log::debug!(
                "Queued {} new link(s) from {}, {} pending",
                queued,
                target.url,
                state.frontier.pending_len()
            );
        }
    }
    shared.wakeup.notify_waiters();
}
