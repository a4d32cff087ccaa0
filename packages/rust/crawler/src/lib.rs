//! Scrape capability, HTTP implementation, and source counting.
//!
//! This crate provides:
//! - [`Scraper`] — the `scrape(url) -> page` capability tools depend on
//! - [`HttpScraper`] — a `reqwest`-backed implementation with SSRF guards
//! - [`CountingScraper`] / [`SourceCounter`] — a decorator that counts every
//!   successfully consulted source for end-of-run reporting

mod counting;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use reviewcrew_shared::Result;

pub use counting::{CountingScraper, SourceCounter};
pub use http::HttpScraper;

/// A fetched page, converted for agent consumption.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code from fetch.
    pub status_code: u16,
    /// Page title, if one was found.
    pub title: Option<String>,
    /// Page content as Markdown.
    pub markdown: String,
    /// SHA-256 of the raw response body.
    pub content_hash: String,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Whether `markdown` was cut to the configured length.
    pub truncated: bool,
}

/// Anything that can fetch a URL and return its content.
///
/// Errors from the underlying source must be distinguishable (see
/// [`ReviewCrewError::is_upstream`](reviewcrew_shared::ReviewCrewError::is_upstream)).
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &Url) -> Result<ScrapedPage>;
}

#[async_trait]
impl<S: Scraper + ?Sized> Scraper for Arc<S> {
    async fn scrape(&self, url: &Url) -> Result<ScrapedPage> {
        (**self).scrape(url).await
    }
}
