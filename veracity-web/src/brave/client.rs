use super::types::WebSearchApiResponse;
use crate::extract::fragment_text;
use crate::{EvidenceSource, keep_useful, search_error};
use async_trait::async_trait;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use veracity_common::{Result, Source, VeracityError, default_brave_endpoint};
use veracity_http::{Auth, HttpClient, RequestOpts};

/// Brave caps `count` at 20 per page.
const BRAVE_MAX_COUNT: usize = 20;

/// Minimal client for Brave Search API (web vertical).
#[derive(Clone)]
pub struct BraveApi {
    http: HttpClient,
    token: String,
}

impl BraveApi {
    pub fn new(subscription_token: String) -> Result<Self> {
        Self::with_base_url(&default_brave_endpoint(), subscription_token)
    }

    pub fn with_base_url(base: &str, subscription_token: String) -> Result<Self> {
        let http = HttpClient::new(base)
            .map_err(|e| VeracityError::Config(format!("brave endpoint: {e}")))?
            .with_timeout(Duration::from_secs(15))
            .with_retries(0);
        Ok(Self {
            http,
            token: subscription_token,
        })
    }

    pub async fn simple_query_search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<WebSearchApiResponse> {
        let count = count.clamp(1, BRAVE_MAX_COUNT);
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("q", Cow::Borrowed(query)),
            ("count", count.to_string().into()),
            ("result_filter", "web".into()),
            ("safesearch", "moderate".into()),
        ];
        let query_snippet: String = query.chars().take(160).collect();
        let started = Instant::now();
        tracing::info!(
            target: "web.brave",
            query = %query_snippet,
            "brave.simple_query.start"
        );

        let opts = RequestOpts {
            auth: Some(
                Auth::header("x-subscription-token", &self.token)
                    .map_err(|e| VeracityError::Config(e.to_string()))?,
            ),
            query: Some(params),
            ..Default::default()
        };
        match self.http.get_json("res/v1/web/search", opts).await {
            Ok(resp) => {
                tracing::info!(
                    target: "web.brave",
                    query = %query_snippet,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "brave.simple_query.success"
                );
                Ok(resp)
            }
            Err(e) => {
                tracing::warn!(
                    target: "web.brave",
                    query = %query_snippet,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "brave.simple_query.error"
                );
                Err(search_error("brave", e))
            }
        }
    }
}

#[async_trait]
impl EvidenceSource for BraveApi {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Source>> {
        let resp = self.simple_query_search(query, limit).await?;
        let hits = resp
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| Source {
                title: fragment_text(&r.title),
                snippet: r.description.as_deref().map(fragment_text).unwrap_or_default(),
                link: r.url,
            });
        Ok(keep_useful(hits, limit))
    }

    fn name(&self) -> &str {
        "brave"
    }
}
