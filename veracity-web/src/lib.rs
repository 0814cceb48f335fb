//! Evidence retrieval and content acquisition.
//!
//! - [`EvidenceSource`]: one search query in, a capped list of [`Source`] out
//!   (`serper` and `brave` providers)
//! - [`extract::ContentExtractor`]: URL in, readable text out (`scraper`
//!   based HTML extraction, Twitter/X posts through `veracity-social`)
//! - [`detect_urls`]: find http(s) links inside free text
//!
//! Searches are not retried, deduplicated, or re-ranked. An empty list is a
//! valid answer.

pub mod brave;
pub mod extract;
pub mod serper;

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use url::Url;
use veracity_common::{Result, SearchConfig, Source, VeracityError};
use veracity_http::HttpError;

pub use extract::{ContentExtractor, WebExtractor};

/// Web search backend used to gather evidence for a claim.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Run one query and return at most `limit` results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Source>>;

    fn name(&self) -> &str;
}

/// Backend for deployments without a search key; always returns no evidence.
pub struct NoEvidence;

#[async_trait]
impl EvidenceSource for NoEvidence {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<Source>> {
        tracing::debug!(query_len = query.len(), "search.disabled");
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Build the configured provider.
pub fn build_evidence_source(config: &SearchConfig) -> Result<Arc<dyn EvidenceSource>> {
    match config {
        SearchConfig::Serper {
            auth_token,
            endpoint,
            ..
        } => {
            require_token("serper", auth_token)?;
            Ok(Arc::new(serper::SerperClient::with_base_url(
                endpoint,
                auth_token.clone(),
            )?))
        }
        SearchConfig::Brave {
            auth_token,
            endpoint,
            ..
        } => {
            require_token("brave", auth_token)?;
            Ok(Arc::new(brave::BraveApi::with_base_url(
                endpoint,
                auth_token.clone(),
            )?))
        }
        SearchConfig::None => Ok(Arc::new(NoEvidence)),
    }
}

fn require_token(provider: &str, token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(VeracityError::Config(format!(
            "search.auth_token is empty for provider {provider}"
        )));
    }
    Ok(())
}

pub(crate) fn search_error(provider: &str, e: HttpError) -> VeracityError {
    if e.is_timeout() {
        VeracityError::Timeout
    } else {
        VeracityError::Search(format!("{provider} search failed: {e}"))
    }
}

/// Keep results that carry a title or a snippet, up to `limit`.
pub(crate) fn keep_useful(hits: impl IntoIterator<Item = Source>, limit: usize) -> Vec<Source> {
    hits.into_iter()
        .filter(|s| !(s.title.trim().is_empty() && s.snippet.trim().is_empty()))
        .take(limit)
        .collect()
}

/// All distinct http(s) URLs in `text`, in order of appearance.
///
/// Trailing sentence punctuation is not part of the link.
///
/// ```
/// let urls = veracity_web::detect_urls("see https://example.com/a. and http://x.org)");
/// let urls: Vec<_> = urls.iter().map(|u| u.as_str()).collect();
/// assert_eq!(urls, ["https://example.com/a", "http://x.org/"]);
/// ```
pub fn detect_urls(text: &str) -> Vec<Url> {
    let Ok(re) = Regex::new(r#"https?://[^\s<>"'`]+"#) else {
        return Vec::new();
    };
    let mut out: Vec<Url> = Vec::new();
    for m in re.find_iter(text) {
        let raw = m
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '}', '*', '_']);
        if let Ok(url) = Url::parse(raw) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    out
}
