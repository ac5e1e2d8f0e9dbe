use async_trait::async_trait;
use hd_core::{Error, Extractor, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Containers tried in order; the first with any paragraph text wins.
const CONTAINERS: &[&str] = &["article", "main", "body"];

pub const DEFAULT_MAX_CHARS: usize = 8000;

/// Readability-style body extraction over plain HTTP.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    client: Client,
    max_chars: usize,
}

impl HtmlExtractor {
    pub fn new(max_chars: usize) -> Self {
        Self {
            client: Client::new(),
            max_chars,
        }
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Extraction(format!("Invalid selector {}: {}", css, e)))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn paragraphs(container: ElementRef<'_>, p: &Selector) -> Vec<String> {
    container
        .select(p)
        .map(|el| normalize(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

/// Main text of an HTML page, at most `max_chars` characters.
pub fn extract_readable_text(html: &str, max_chars: usize) -> Result<String> {
    let document = Html::parse_document(html);
    let p = selector("p")?;

    for css in CONTAINERS {
        let container = selector(css)?;
        let texts: Vec<String> = document
            .select(&container)
            .flat_map(|el| paragraphs(el, &p))
            .collect();
        if !texts.is_empty() {
            return Ok(truncate_chars(texts.join("\n"), max_chars));
        }
    }

    // No paragraphs anywhere; take whatever text the body has.
    let body = selector("body")?;
    let text = document
        .select(&body)
        .next()
        .map(|el| normalize(&el.text().collect::<String>()))
        .unwrap_or_default();
    Ok(truncate_chars(text, max_chars))
}

#[async_trait]
impl Extractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("Unsupported scheme: {}", url)));
        }

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Extraction(format!("{} returned {}", url, status)));
        }

        let html = response.text().await?;
        let text = extract_readable_text(&html, self.max_chars)?;
        debug!("Extracted {} chars from {}", text.chars().count(), url);
        Ok(text)
    }
}
