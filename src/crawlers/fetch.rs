//! Page fetcher and content extractor.
//!
//! Both work against a [`PageSession`] and bound every browser round trip
//! with their own timeout.

use crate::crawlers::crawler::PageSession;
use crate::crawlers::frontier::LinkSet;
use crate::error::{CrawlError, Result, SessionError};
use crate::filter::UrlFilter;
use crate::parsers::html;
use crate::results::PageContent;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Navigate the session to `url`
pub async fn fetch<S: PageSession>(session: &mut S, url: &str, limit: Duration) -> Result<()> {
    match timeout(limit, session.goto(url)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CrawlError::navigation(url, e)),
        Err(_) => Err(CrawlError::NavigationTimeout {
            url: url.to_string(),
            timeout: limit,
        }),
    }
}

/// Read title, headings, paragraphs and lists from the loaded page
pub async fn extract_content<S: PageSession>(
    session: &mut S,
    url: &str,
    limit: Duration,
) -> Result<PageContent> {
    let source = read_source(session, url, limit).await?;
    Ok(html::parse_content(&source))
}

/// Collect same-domain links from the loaded page, normalized and deduplicated
pub async fn discover_links<S: PageSession>(
    session: &mut S,
    url: &str,
    filter: &UrlFilter,
    limit: Duration,
) -> Result<LinkSet> {
    let (base, source) = match timeout(limit, async {
        let base = session.current_url().await?;
        let source = session.source().await?;
        Ok::<_, SessionError>((base, source))
    })
    .await
    {
        Ok(Ok(read)) => read,
        Ok(Err(e)) => return Err(CrawlError::extraction(url, e)),
        Err(_) => {
            return Err(CrawlError::ExtractionTimeout {
                url: url.to_string(),
                timeout: limit,
            });
        }
    };

    let links = html::parse_links(&source);
    // A <base href> replaces the document URL for relative links
    let base = match links.base.as_deref().map(|href| base.join(href)) {
        Some(Ok(declared)) => declared,
        Some(Err(e)) => {
            ::log::debug!("Ignoring invalid <base href> on {}: {}", url, e);
            base
        }
        None => base,
    };
    Ok(resolve_links(&links.hrefs, &base, filter))
}

/// URL the session ended up on after navigating to `url`, redirects included
pub async fn landed_url<S: PageSession>(
    session: &mut S,
    url: &str,
    limit: Duration,
) -> Result<Url> {
    match timeout(limit, session.current_url()).await {
        Ok(Ok(landed)) => Ok(landed),
        Ok(Err(e)) => Err(CrawlError::extraction(url, e)),
        Err(_) => Err(CrawlError::ExtractionTimeout {
            url: url.to_string(),
            timeout: limit,
        }),
    }
}

async fn read_source<S: PageSession>(session: &mut S, url: &str, limit: Duration) -> Result<String> {
    match timeout(limit, session.source()).await {
        Ok(Ok(source)) => Ok(source),
        Ok(Err(e)) => Err(CrawlError::extraction(url, e)),
        Err(_) => Err(CrawlError::ExtractionTimeout {
            url: url.to_string(),
            timeout: limit,
        }),
    }
}

/// Resolve raw hrefs against `base` and keep the ones the filter accepts
pub fn resolve_links(hrefs: &[String], base: &Url, filter: &UrlFilter) -> LinkSet {
    hrefs
        .iter()
        .filter_map(|href| filter.accept(href, base))
        .collect()
}
