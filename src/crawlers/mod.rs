pub mod crawler;
pub mod fetch;
pub mod frontier;
pub mod orchestrator;
pub mod web;

#[cfg(test)]
pub(crate) mod mock;

pub use crawler::{BrowserEngine, PageSession};
pub use frontier::{CrawlTarget, Frontier, LinkSet, VisitedSet};
pub use orchestrator::Crawler;
pub use web::{WebDriverEngine, WebDriverSession};
