//! URL → readable text.
//!
//! HTML pages are parsed with `scraper`; script, style, and page chrome
//! (`nav`, `header`, `footer`) are skipped. Twitter/X status links go through
//! the post lookup API when a bearer token is configured, since the public
//! page is rendered client-side.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use scraper::{Html, Node, Selector};
use url::Url;
use veracity_common::{ExtractedContent, ExtractorConfig, Result, VeracityError};
use veracity_http::{HttpClient, HttpError, RequestOpts};
use veracity_social::twitter::{TwitterApi, is_twitter_host, tweet_id_from_url};

/// Appended to text cut at `max_chars`.
pub const TRUNCATION_MARKER: &str = "... [content truncated]";

const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "template", "svg", "iframe",
];

/// Fetches a URL and returns its readable text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &Url) -> Result<ExtractedContent>;
}

#[async_trait]
impl<T: ContentExtractor + ?Sized> ContentExtractor for Arc<T> {
    async fn extract(&self, url: &Url) -> Result<ExtractedContent> {
        (**self).extract(url).await
    }
}

pub struct WebExtractor {
    http: HttpClient,
    user_agent: String,
    max_chars: usize,
    twitter: Option<TwitterApi>,
}

impl WebExtractor {
    /// Build from config. A `twitter_bearer` enables API lookup for status links.
    pub fn new(cfg: &ExtractorConfig) -> Result<Self> {
        let http = HttpClient::unanchored()
            .map_err(|e| VeracityError::Config(format!("extractor http client: {e}")))?
            .with_timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .with_retries(0);
        let twitter = match cfg.twitter_bearer.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Some(TwitterApi::new(token.to_string())?),
            _ => None,
        };
        Ok(Self {
            http,
            user_agent: cfg.user_agent.clone(),
            max_chars: cfg.max_chars,
            twitter,
        })
    }

    /// Replace the Twitter/X client (tests point it at a mock server).
    pub fn with_twitter(mut self, api: TwitterApi) -> Self {
        self.twitter = Some(api);
        self
    }

    async fn extract_post(&self, api: &TwitterApi, url: &Url, id: &str) -> Result<ExtractedContent> {
        let post = api
            .post(id)
            .await
            .map_err(|e| VeracityError::Extraction(format!("{e:#}")))?;
        let title = post.author_handle.as_ref().map(|h| format!("@{h}"));
        let (text, truncated) = clip(post.text.trim(), self.max_chars);
        if text.is_empty() {
            return Err(VeracityError::Extraction(format!("post {id} has no text")));
        }
        Ok(ExtractedContent {
            url: post
                .status_url
                .map(|u| u.to_string())
                .unwrap_or_else(|| url.to_string()),
            title,
            content_hash: blake3::hash(post.text.as_bytes()).to_hex().to_string(),
            text,
            truncated,
        })
    }

    async fn extract_page(&self, url: &Url) -> Result<ExtractedContent> {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,text/plain;q=0.9,*/*;q=0.5"),
        );
        let opts = RequestOpts {
            headers: Some(headers),
            allow_absolute: true,
            ..Default::default()
        };
        let resp = self
            .http
            .get_text(url.as_str(), opts)
            .await
            .map_err(|e| fetch_error(url, e))?;

        let content_type = resp
            .content_type
            .as_deref()
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or_default();
        let (title, body_text) = if content_type.is_empty() || content_type.contains("html") {
            parse_html(&resp.body)
        } else if content_type.starts_with("text/") {
            (None, collapse_whitespace(&resp.body))
        } else {
            return Err(VeracityError::Extraction(format!(
                "unsupported content type {content_type} at {url}"
            )));
        };

        if body_text.is_empty() {
            return Err(VeracityError::Extraction(format!(
                "no readable text found at {url}"
            )));
        }
        let (text, truncated) = clip(&body_text, self.max_chars);
        Ok(ExtractedContent {
            url: resp.url.to_string(),
            title,
            text,
            content_hash: blake3::hash(&resp.raw).to_hex().to_string(),
            truncated,
        })
    }
}

#[async_trait]
impl ContentExtractor for WebExtractor {
    async fn extract(&self, url: &Url) -> Result<ExtractedContent> {
        let started = Instant::now();
        tracing::info!(target: "web.extract", url = %url, "extract.start");

        let outcome = match (&self.twitter, tweet_id_from_url(url)) {
            (Some(api), Some(id)) if is_twitter_host(url) => self.extract_post(api, url, &id).await,
            _ => self.extract_page(url).await,
        };

        match &outcome {
            Ok(content) => tracing::info!(
                target: "web.extract",
                url = %url,
                chars = content.text.chars().count(),
                truncated = content.truncated,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "extract.success"
            ),
            Err(e) => tracing::warn!(
                target: "web.extract",
                url = %url,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "extract.error"
            ),
        }
        outcome
    }
}

fn fetch_error(url: &Url, e: HttpError) -> VeracityError {
    if e.is_timeout() {
        VeracityError::Timeout
    } else {
        VeracityError::Extraction(format!("failed to fetch {url}: {e}"))
    }
}

/// Title and visible body text of an HTML document.
///
/// The title comes from `<title>`, falling back to `og:title`.
pub fn parse_html(html: &str) -> (Option<String>, String) {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "title").or_else(|| {
        selector("meta[property=\"og:title\"]")
            .and_then(|sel| doc.select(&sel).next())
            .and_then(|el| el.value().attr("content"))
            .map(collapse_whitespace)
            .filter(|t| !t.is_empty())
    });

    let root = selector("body")
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());

    let mut out = String::with_capacity(html.len() / 4);
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    (title, collapse_whitespace(&out))
}

/// Plain text of an HTML fragment such as a search snippet with `<strong>` marks.
pub fn fragment_text(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return fragment.trim().to_string();
    }
    let frag = Html::parse_fragment(fragment);
    collapse_whitespace(&frag.root_element().text().collect::<String>())
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    let el = doc.select(&sel).next()?;
    let text = collapse_whitespace(&el.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to `max_chars` characters, appending the truncation marker.
fn clip(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (format!("{}{TRUNCATION_MARKER}", &text[..idx]), true),
        None => (text.to_string(), false),
    }
}
