//! `ScrapeWebsiteTool`: fetch a page for the collector agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use reviewcrew_crawler::Scraper;
use reviewcrew_shared::{Result, ReviewCrewError};

use super::{Tool, parse_args};

const NAME: &str = "ScrapeWebsiteTool";

const DESCRIPTION: &str = "Read a website's content. Pass the full URL of the page to read; \
    the page text is returned as Markdown.";

#[derive(Debug, Deserialize)]
struct Args {
    website_url: String,
}

/// Tool front for any [`Scraper`], normally a counting one.
#[derive(Clone)]
pub struct ScrapeWebsiteTool {
    scraper: Arc<dyn Scraper>,
}

impl ScrapeWebsiteTool {
    pub fn new(scraper: Arc<dyn Scraper>) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "website_url": {
                    "type": "string",
                    "description": "Mandatory website url to read the file"
                }
            },
            "required": ["website_url"]
        })
    }

    async fn call(&self, args: Value) -> Result<String> {
        let args: Args = match args {
            Value::String(url) => Args { website_url: url },
            other => parse_args(NAME, other)?,
        };
        let url = Url::parse(args.website_url.trim()).map_err(|e| {
            ReviewCrewError::validation(format!("{NAME}: invalid URL '{}': {e}", args.website_url))
        })?;

        let page = self.scraper.scrape(&url).await?;

        let mut reply = format!("Source: {}\n", page.url);
        if let Some(title) = &page.title {
            reply.push_str(&format!("Title: {title}\n"));
        }
        reply.push('\n');
        reply.push_str(&page.markdown);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reviewcrew_crawler::{CountingScraper, ScrapedPage, SourceCounter};

    struct StaticScraper;

    #[async_trait]
    impl Scraper for StaticScraper {
        async fn scrape(&self, url: &Url) -> Result<ScrapedPage> {
            if url.path() == "/down" {
                return Err(ReviewCrewError::upstream("HTTP 502"));
            }
            Ok(ScrapedPage {
                url: url.to_string(),
                status_code: 200,
                title: Some("RAXE300 review".into()),
                markdown: "Rating: 4.5/5\n".into(),
                content_hash: String::new(),
                fetched_at: Utc::now(),
                truncated: false,
            })
        }
    }

    fn counting_tool() -> (ScrapeWebsiteTool, SourceCounter) {
        let counter = SourceCounter::new();
        let scraper = CountingScraper::new(StaticScraper, counter.clone());
        (ScrapeWebsiteTool::new(Arc::new(scraper)), counter)
    }

    #[tokio::test]
    async fn returns_page_markdown_and_counts() {
        let (tool, counter) = counting_tool();
        let reply = tool
            .call(json!({"website_url": "https://tech.example/raxe300"}))
            .await
            .unwrap();

        assert_eq!(
            reply,
            "Source: https://tech.example/raxe300\nTitle: RAXE300 review\n\nRating: 4.5/5\n"
        );
        assert_eq!(counter.get(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_propagates_uncounted() {
        let (tool, counter) = counting_tool();
        let err = tool.call(json!({"website_url": "https://tech.example/down"})).await.unwrap_err();
        assert!(err.is_upstream());
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test]
    async fn bad_url_is_validation_error() {
        let (tool, counter) = counting_tool();
        let err = tool.call(json!("not a url")).await.unwrap_err();
        assert!(matches!(err, ReviewCrewError::Validation { .. }));
        assert_eq!(counter.get(), 0);
    }
}
