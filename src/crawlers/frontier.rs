use crate::config::TraversalOrder;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Normalized same-domain links discovered on one page
pub type LinkSet = BTreeSet<String>;

/// A URL scheduled for fetching, with its distance in hops from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: String,
    pub depth: usize,
}

impl CrawlTarget {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
        }
    }

    /// A target one hop further than `self`
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
        }
    }
}

/// URLs already fetched, or claimed for fetching, during one run
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn should_visit(&self, url: &str) -> bool {
        !self.urls.contains(url)
    }

    /// Returns `true` if the URL was not visited before
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_sorted(self) -> BTreeSet<String> {
        self.urls.into_iter().collect()
    }
}

/// Pending crawl targets plus the visited set guarding them.
///
/// A target is claimed by [`Frontier::pop`], which checks and marks the URL
/// in one step; callers hold exclusive access (`&mut self`) for both.
#[derive(Debug)]
pub struct Frontier {
    order: TraversalOrder,
    max_depth: usize,
    pending: VecDeque<CrawlTarget>,
    visited: VisitedSet,
}

impl Frontier {
    pub fn new(order: TraversalOrder, max_depth: usize) -> Self {
        Self {
            order,
            max_depth,
            pending: VecDeque::new(),
            visited: VisitedSet::default(),
        }
    }

    /// Queue a target unless it is too deep or already visited
    pub fn push(&mut self, target: CrawlTarget) -> bool {
        if target.depth >= self.max_depth {
            ::log::trace!(
                "Not queuing {} at depth {} (max depth {})",
                target.url,
                target.depth,
                self.max_depth
            );
            return false;
        }
        if !self.visited.should_visit(&target.url) {
            ::log::trace!("Skipping already visited link: {}", target.url);
            return false;
        }
        self.pending.push_back(target);
        true
    }

    /// Fold the links of a page into the frontier, returning how many were queued.
    ///
    /// Depth-first pops from the back, so children are added in reverse to be
    /// expanded in link order before the parent's siblings.
    pub fn extend(&mut self, parent: &CrawlTarget, links: LinkSet) -> usize {
        let children: Vec<CrawlTarget> = links.into_iter().map(|url| parent.child(url)).collect();
        let mut queued = 0;
        match self.order {
            TraversalOrder::DepthFirst => {
                for child in children.into_iter().rev() {
                    queued += usize::from(self.push(child));
                }
            }
            TraversalOrder::BreadthFirst => {
                for child in children {
                    queued += usize::from(self.push(child));
                }
            }
        }
        queued
    }

    /// Claim the next unvisited target, marking it visited
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        loop {
            let target = match self.order {
                TraversalOrder::DepthFirst => self.pending.pop_back()?,
                TraversalOrder::BreadthFirst => self.pending.pop_front()?,
            };
            // The same URL may be queued from several parents before it is claimed
            if self.visited.mark_visited(&target.url) {
                return Some(target);
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop whatever is still pending and hand back the visited set
    pub fn into_visited(self) -> VisitedSet {
        self.visited
    }
}
