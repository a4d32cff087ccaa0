//! Source counting for scrape capabilities.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use reviewcrew_shared::Result;

use crate::{ScrapedPage, Scraper};

/// Count of successful scrapes during one run.
///
/// Cloning shares the underlying count, so the run context can keep one
/// handle for reporting while scrapers hold others.
#[derive(Debug, Clone, Default)]
pub struct SourceCounter(Arc<AtomicUsize>);

impl SourceCounter {
    /// A fresh counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one consulted source. Returns the new total.
    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current total.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Decorates a [`Scraper`], counting each successful call.
///
/// Calls are forwarded unchanged. Failures are returned as-is and leave the
/// counter untouched.
#[derive(Debug, Clone)]
pub struct CountingScraper<S> {
    inner: S,
    counter: SourceCounter,
}

impl<S: Scraper> CountingScraper<S> {
    pub fn new(inner: S, counter: SourceCounter) -> Self {
        Self { inner, counter }
    }

    /// The shared counter this scraper increments.
    pub fn counter(&self) -> &SourceCounter {
        &self.counter
    }

    /// Number of successful scrapes so far.
    pub fn total_sources(&self) -> usize {
        self.counter.get()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: Scraper> Scraper for CountingScraper<S> {
    async fn scrape(&self, url: &Url) -> Result<ScrapedPage> {
        let page = self.inner.scrape(url).await?;
        let total = self.counter.increment();
        debug!(%url, total_sources = total, "source counted");
        Ok(page)
    }
}
