//! HTML-to-Markdown conversion for scraped review pages.

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use reviewcrew_shared::{Result, ReviewCrewError};

use crate::cleanup;

/// Readable content extracted from a fetched page.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page title from the first `<h1>`, falling back to `<title>`.
    pub title: Option<String>,
    /// Cleaned Markdown body.
    pub markdown: String,
    /// Approximate word count of the Markdown body.
    pub word_count: usize,
}

/// Convert a full HTML document to clean Markdown.
///
/// The main content container is picked first so site chrome (navigation,
/// cookie banners, footers) doesn't drown the review text.
#[instrument(skip(html), fields(url = %source_url))]
pub fn page_to_markdown(html: &str, source_url: &str) -> Result<PageContent> {
    let doc = Html::parse_document(html);
    let title = extract_title(&doc);
    let content_html = extract_content_html(&doc).unwrap_or_else(|| html.to_string());

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec![
            "script", "style", "nav", "header", "footer", "aside", "form", "iframe", "noscript",
            "svg", "button",
        ])
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| ReviewCrewError::parse(format!("htmd conversion failed: {e}")))?;

    let base_url = Url::parse(source_url).ok();
    let markdown = cleanup::run_pipeline(&raw_markdown, base_url.as_ref());
    let word_count = markdown.split_whitespace().count();

    debug!(
        raw_len = raw_markdown.len(),
        final_len = markdown.len(),
        word_count,
        "page conversion complete"
    );

    Ok(PageContent {
        title,
        markdown,
        word_count,
    })
}

/// Find the main content container, most specific first.
fn extract_content_html(doc: &Html) -> Option<String> {
    let selectors = [
        "[itemprop=\"reviewBody\"]", // schema.org review markup
        ".review-content",
        "article",
        "main",
        "[role=\"main\"]",
        "#content",
        ".content",
        "body",
    ];

    selectors.iter().find_map(|sel_str| {
        let selector = Selector::parse(sel_str).ok()?;
        doc.select(&selector).next().map(|el| el.inner_html())
    })
}

fn extract_title(doc: &Html) -> Option<String> {
    ["h1", "title"].iter().find_map(|sel_str| {
        let selector = Selector::parse(sel_str).ok()?;
        doc.select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    })
}
