use super::types::{SerperRequest, SerperResponse};
use crate::{EvidenceSource, keep_useful, search_error};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use veracity_common::{Result, Source, VeracityError, default_serper_endpoint};
use veracity_http::{Auth, HttpClient, RequestOpts};

/// Client for `POST https://google.serper.dev/search`.
#[derive(Clone)]
pub struct SerperClient {
    http: HttpClient,
    token: String,
}

impl SerperClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(&default_serper_endpoint(), api_key)
    }

    pub fn with_base_url(base: &str, api_key: String) -> Result<Self> {
        let http = HttpClient::new(base)
            .map_err(|e| VeracityError::Config(format!("serper endpoint: {e}")))?
            .with_timeout(Duration::from_secs(15))
            .with_retries(0);
        Ok(Self {
            http,
            token: api_key,
        })
    }

    pub async fn raw_search(&self, query: &str, num: usize) -> Result<SerperResponse> {
        let started = Instant::now();
        tracing::info!(target: "web.serper", query_len = query.len(), num, "serper.search.start");

        let opts = RequestOpts {
            auth: Some(
                Auth::header("x-api-key", &self.token)
                    .map_err(|e| VeracityError::Config(e.to_string()))?,
            ),
            ..Default::default()
        };
        let req = SerperRequest { q: query, num };
        match self.http.post_json_opts("search", &req, opts).await {
            Ok(resp) => {
                tracing::info!(
                    target: "web.serper",
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "serper.search.success"
                );
                Ok(resp)
            }
            Err(e) => {
                tracing::warn!(
                    target: "web.serper",
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "serper.search.error"
                );
                Err(search_error("serper", e))
            }
        }
    }
}

#[async_trait]
impl EvidenceSource for SerperClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Source>> {
        let resp = self.raw_search(query, limit).await?;
        let hits = resp.organic.into_iter().map(|o| Source {
            title: o.title,
            snippet: o.snippet,
            link: o.link,
        });
        let kept = keep_useful(hits, limit);
        tracing::debug!(target: "web.serper", hits = kept.len(), "serper.search.kept");
        Ok(kept)
    }

    fn name(&self) -> &str {
        "serper"
    }
}
