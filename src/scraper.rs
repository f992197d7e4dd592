use std::str::FromStr;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is a valid regex"));

// Elements whose text never belongs to the readable content
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

// Elements that start and end a line of extracted text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table",
    "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

/// How fetched markup is turned into plain text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StripMode {
    /// Replace every `<...>` tag with a single space.
    #[default]
    Pattern,
    /// Parse the document and keep only readable text nodes.
    Document,
}

impl StripMode {
    pub fn apply(self, html: &str) -> String {
        match self {
            StripMode::Pattern => strip_tags(html),
            StripMode::Document => extract_text(html),
        }
    }
}

impl FromStr for StripMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(StripMode::Pattern),
            "document" => Ok(StripMode::Document),
            other => Err(format!("Unknown markup stripping mode: {}", other)),
        }
    }
}

/// Retrieves a remote resource as plain text.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP with a client shared across requests.
pub struct HttpFetcher {
    client: Client,
    strip_mode: StripMode,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, strip_mode: StripMode) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self { client, strip_mode })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.fetch_timeout, config.strip_mode)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !is_textual(content_type) {
                return Err(FetchError::NonText(content_type.to_string()));
            }
        }

        let html = response.text().await.map_err(FetchError::from_reqwest)?;
        debug!(url, bytes = html.len(), "fetched remote content");

        Ok(self.strip_mode.apply(&html))
    }
}

fn is_textual(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.is_empty()
        || mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime.ends_with("/xml")
        || mime.ends_with("/json")
        || mime.ends_with("+json")
}

/// Replaces every markup tag with a single space. Everything else,
/// including script bodies and entities, is left as it was.
pub fn strip_tags(html: &str) -> String {
    TAG_PATTERN.replace_all(html, " ").into_owned()
}

/// Parser-based text extraction: text outside scripts and styles, with a
/// line per block-level element. Inline markup does not break lines and
/// whitespace runs within a line collapse to one space.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::with_capacity(html.len() / 2);
    collect_text(document.root_element(), &mut text);
    normalize_lines(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(chunk) => out.push_str(chunk),
            Node::Element(inner) => {
                let name = inner.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(inner) = ElementRef::wrap(child) {
                    collect_text(inner, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn normalize_lines(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        for (i, word) in words.enumerate() {
            if i > 0 {
                result.push(' ');
            }
            result.push_str(word);
        }
    }

    result
}
