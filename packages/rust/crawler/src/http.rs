//! HTTP scrape capability backed by `reqwest`.
//!
//! Fetches a single page, guards against SSRF targets, and converts the HTML
//! into Markdown the collector agent can read.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::redirect::Policy;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};
use url::Url;

use reviewcrew_shared::{Result, ReviewCrewError, ScrapeConfig};

use crate::{ScrapedPage, Scraper};

/// User-Agent string for scrape requests.
const USER_AGENT: &str = concat!("ReviewCrew/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// Marker appended when content is cut to `max_content_chars`.
const TRUNCATION_MARKER: &str = "\n\n[content truncated]\n";

/// Plain HTTP(S) page scraper.
#[derive(Debug, Clone)]
pub struct HttpScraper {
    client: Client,
    timeout: Duration,
    /// Cap on returned Markdown length in characters (0 = unlimited).
    max_content_chars: usize,
    /// Allow localhost/private IPs (for integration tests with mock servers).
    allow_localhost: bool,
}

impl HttpScraper {
    /// Create a scraper from the `[scrape]` config section.
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: build_client(timeout, false)?,
            timeout,
            max_content_chars: config.max_content_chars,
            allow_localhost: false,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Allow scraping localhost/private IPs (for integration tests).
    #[cfg(test)]
    pub fn allow_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self.client = build_client(self.timeout, true).expect("test HTTP client");
        self
    }
}

fn build_client(timeout: Duration, allow_private: bool) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(redirect_policy(allow_private))
        .timeout(timeout)
        .build()
        .map_err(|e| ReviewCrewError::upstream(format!("failed to build HTTP client: {e}")))
}

/// Follow at most [`MAX_REDIRECTS`] hops, re-checking every hop target.
fn redirect_policy(allow_private: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error(format!("too many redirects (limit {MAX_REDIRECTS})"))
        } else if !allow_private && is_ssrf_target(attempt.url()) {
            let target = attempt.url().to_string();
            warn!(target = %target, "SSRF protection: redirect blocked");
            attempt.error(format!("redirect to non-public URL {target} refused"))
        } else {
            attempt.follow()
        }
    })
}

#[async_trait]
impl Scraper for HttpScraper {
    #[instrument(skip_all, fields(url = %url))]
    async fn scrape(&self, url: &Url) -> Result<ScrapedPage> {
        if !self.allow_localhost && is_ssrf_target(url) {
            warn!("SSRF protection: blocked");
            return Err(ReviewCrewError::validation(format!(
                "refusing to scrape non-public URL {url}"
            )));
        }

        debug!("fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ReviewCrewError::upstream(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviewCrewError::upstream(format!("{url}: HTTP {status}")));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ReviewCrewError::upstream(format!("{url}: body read failed: {e}")))?;

        let content_hash = compute_hash(&body);
        let page = reviewcrew_markdown::page_to_markdown(&body, &final_url)?;
        let (markdown, truncated) = truncate_chars(page.markdown, self.max_content_chars);

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            words = page.word_count,
            truncated,
            "page scraped"
        );

        Ok(ScrapedPage {
            url: final_url,
            status_code: status.as_u16(),
            title: page.title,
            markdown,
            content_hash,
            fetched_at: Utc::now(),
            truncated,
        })
    }
}

/// Cut `text` to at most `max` characters (0 = no limit), on a char boundary.
fn truncate_chars(text: String, max: usize) -> (String, bool) {
    if max == 0 {
        return (text, false);
    }
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
        None => (text, false),
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
        }
    }
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
