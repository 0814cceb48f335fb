//! Minimal wrapper around the Twitter/X post lookup API.
//!
//! Handles bearer auth and field selection before delegating to the shared
//! HTTP client. Retries are disabled; callers surface failures directly.
use crate::twitter::extract::{PostText, post_text};
use crate::twitter::types::LookupResponse;
use anyhow::{Context, Result, anyhow};
use std::time::Duration;
use veracity_http::{Auth, HttpClient, RequestOpts};

const TWITTER_API_BASE: &str = "https://api.twitter.com/";

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn new(bearer_token: String) -> Result<Self> {
        Self::with_base_url(TWITTER_API_BASE, bearer_token)
    }

    pub fn with_base_url(base: &str, bearer_token: String) -> Result<Self> {
        let http = HttpClient::new(base)
            .context("twitter base url")?
            .with_timeout(Duration::from_secs(10))
            .with_retries(0);
        Ok(Self {
            http,
            bearer: bearer_token,
        })
    }

    /// Raw `GET /2/tweets/{id}` with author expansion.
    pub async fn lookup(&self, id: &str) -> Result<LookupResponse> {
        let params: Vec<(&str, std::borrow::Cow<'_, str>)> = vec![
            ("tweet.fields", "created_at,author_id,lang,public_metrics,note_tweet".into()),
            ("expansions", "author_id".into()),
            ("user.fields", "username,name".into()),
        ];

        let resp: LookupResponse = self
            .http
            .get_json(
                &format!("2/tweets/{id}"),
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
            .with_context(|| format!("twitter lookup failed for post {id}"))?;

        tracing::debug!(target: "social.twitter", post_id = id, found = resp.data.is_some(), "twitter.lookup.done");
        Ok(resp)
    }

    /// Text of one post, or an error naming why it is unavailable.
    pub async fn post(&self, id: &str) -> Result<PostText> {
        let resp = self.lookup(id).await?;
        post_text(&resp).ok_or_else(|| {
            let detail = resp
                .errors
                .as_ref()
                .and_then(|errs| errs.first())
                .and_then(|e| e.detail.clone().or_else(|| e.title.clone()))
                .unwrap_or_else(|| "no data returned".to_string());
            anyhow!("post {id} unavailable: {detail}")
        })
    }
}
