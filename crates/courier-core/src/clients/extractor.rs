//! Web page content extraction

use crate::constants::PAGE_TEXT_CONTEXT_LIMIT;
use crate::error::{CourierError, Result};
use crate::types::PageContent;
use kuchiki::traits::*;
use kuchiki::NodeRef;
use reqwest::Client as HttpClient;

pub struct PageExtractor {
    http_client: HttpClient,
}

impl PageExtractor {
    pub fn new() -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(CourierError::Http)?;

        Ok(Self { http_client })
    }

    /// Fetch a page and extract its title and readable body text
    pub async fn extract(&self, url: &str) -> Result<PageContent> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CourierError::Fetch(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CourierError::Fetch(format!(
                "Fetching {} returned {}",
                url,
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| CourierError::Fetch(format!("Failed to read {}: {}", url, e)))?;

        let content = Self::extract_from_html(&html);
        log::info!(
            "Extracted '{}' ({} chars of text) from {}",
            content.title,
            content.text.len(),
            url
        );
        Ok(content)
    }

    /// Pull the title and visible text out of an HTML document
    pub fn extract_from_html(html: &str) -> PageContent {
        let document = kuchiki::parse_html().one(html);

        let title = document
            .select_first("title")
            .map(|node| node.text_contents())
            .unwrap_or_default()
            .trim()
            .to_string();

        remove_elements_by_selector(&document, "script, style, noscript, iframe, svg");

        let body_text = document
            .select_first("body")
            .map(|node| node.text_contents())
            .unwrap_or_else(|_| document.text_contents());

        let mut text = normalize_whitespace(&body_text);
        if text.len() > PAGE_TEXT_CONTEXT_LIMIT {
            let mut cut = PAGE_TEXT_CONTEXT_LIMIT;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }

        PageContent { title, text }
    }
}

fn remove_elements_by_selector(document: &NodeRef, selector: &str) {
    if let Ok(nodes) = document.select(selector) {
        let nodes: Vec<_> = nodes.collect();
        for node in nodes {
            node.as_node().detach();
        }
    }
}

/// Collapse runs of whitespace so DOM text reads like page text
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_and_text() {
        let html = r#"<html>
            <head><title> Example Page </title><style>body { color: red }</style></head>
            <body>
                <h1>Hello</h1>
                <script>var tracked = true;</script>
                <p>World   and
                more</p>
            </body>
        </html>"#;

        let content = PageExtractor::extract_from_html(html);
        assert_eq!(content.title, "Example Page");
        assert_eq!(content.text, "Hello World and more");
        assert!(!content.text.contains("tracked"));
    }

    #[test]
    fn test_extract_handles_missing_title_and_body() {
        let content = PageExtractor::extract_from_html("just some text");
        assert_eq!(content.title, "");
        assert!(content.text.contains("just some text"));
    }

    #[test]
    fn test_text_is_truncated_to_context_limit() {
        let body: String = "word ".repeat(PAGE_TEXT_CONTEXT_LIMIT);
        let html = format!("<html><head><title>T</title></head><body>{}</body></html>", body);

        let content = PageExtractor::extract_from_html(&html);
        assert!(content.text.len() <= PAGE_TEXT_CONTEXT_LIMIT);
    }
}
