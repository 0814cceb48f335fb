//! Minimal HTTP client with safe logging, retries, and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - Redacts sensitive query params and headers and never logs secret values
//! - Retries 429/5xx with exponential backoff and `Retry-After` support.
//!   The budget defaults to 2. The search, page and model clients in this
//!   workspace set `with_retries(0)`: a fact-check turn makes one attempt
//!   per stage and reports the failure.
//! - JSON helpers for provider APIs and [`HttpClient::get_text`] for pages
//! - Optional *raw* request/response logging via `VERACITY_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), veracity_http::HttpError> {
//! let client = veracity_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", veracity_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/header/query/none), not the secret.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! headers, body snippets (truncated), retries, final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `VERACITY_HTTP_RAW=1`.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use uuid::Uuid;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "VERACITY_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

const REDACTED: &str = "<redacted>";

fn is_secret_param(name: &str) -> bool {
    const NAMES: [&str; 10] = [
        "access_token",
        "authorization",
        "auth",
        "key",
        "api_key",
        "apikey",
        "token",
        "secret",
        "client_secret",
        "bearer",
    ];
    NAMES.iter().any(|n| n.eq_ignore_ascii_case(name))
}

fn is_secret_header(name: &str) -> bool {
    const NAMES: [&str; 5] = [
        "authorization",
        "x-api-key",
        "x-subscription-token",
        "x-goog-api-key",
        "cookie",
    ];
    NAMES.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// Query pairs as they may appear in logs.
fn redact_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<(String, String)> {
    pairs
        .map(|(k, v)| {
            let shown = if is_secret_param(k) { REDACTED } else { v };
            (k.to_string(), shown.to_string())
        })
        .collect()
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let shown = if *k == AUTHORIZATION {
                format!("Bearer {REDACTED}")
            } else if is_secret_header(k.as_str()) {
                REDACTED.to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (k.as_str().to_string(), shown)
        })
        .collect()
}

/// Copy of `url` with secret query values replaced.
fn redact_url(url: &Url) -> Url {
    let mut out = url.clone();
    if url.query().is_none() {
        return out;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let shown = redact_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    out.query_pairs_mut().clear().extend_pairs(shown);
    out
}

/// Shell-quoted curl line for reproducing a request, secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    fn quote(s: &str) -> String {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
    let mut cmd = format!("curl -X{method}");
    for (name, val) in redact_headers(headers) {
        cmd.push_str(&format!(" -H {}", quote(&format!("{name}: {val}"))));
    }
    match body.map(std::str::from_utf8) {
        Some(Ok(text)) => {
            let cut = floor_char_boundary(text, RAW_MAX_BODY);
            let shown = if cut < text.len() {
                format!("{}…", &text[..cut])
            } else {
                text.to_string()
            };
            cmd.push_str(&format!(" -d {}", quote(&shown)));
        }
        Some(Err(_)) => {
            let len = body.map_or(0, <[u8]>::len);
            cmd.push_str(&format!(" --data-binary @- # ({len} bytes)"));
        }
        None => {}
    }
    cmd.push_str(&format!(" {}", quote(redact_url(url).as_str())));
    cmd
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// True when the request hit the client-side timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Network(msg) if msg.contains("timed out"))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use veracity_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header (Serper: X-API-KEY, Brave: X-Subscription-Token)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param (Gemini: key)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

impl Auth<'_> {
    /// Header auth with the value marked sensitive.
    pub fn header(name: &'static str, secret: &str) -> Result<Auth<'static>, HttpError> {
        let mut value = HeaderValue::from_str(secret.trim())
            .map_err(|e| HttpError::Build(format!("invalid {name} header: {e}")))?;
        value.set_sensitive(true);
        Ok(Auth::Header {
            name: HeaderName::from_static(name),
            value,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
            Auth::Query { .. } => "query",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use veracity_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(0),
///     auth: Some(Auth::Query {
///         name: "key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.allow_absolute == false);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("q", "term".into())]
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// Decoded body of a non-JSON GET.
#[derive(Debug, Clone)]
pub struct TextResponse {
    /// Final URL after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
    pub raw: Vec<u8>,
}

struct RawResponse {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
    req_id: String,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use veracity_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        Ok(Self {
            base: Some(base),
            ..Self::unanchored()?
        })
    }

    /// Client without a base URL; every request path must be absolute.
    ///
    /// Used for fetching arbitrary user-supplied pages.
    pub fn unanchored() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base: None,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use veracity_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget (2) returned by [`HttpClient::new`].
    /// Zero sends each request once.
    ///
    /// ```no_run
    /// use veracity_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com")?.with_retries(0);
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// POST JSON using optional Bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let auth = bearer.map(Auth::Bearer);
        let opts = RequestOpts {
            auth,
            ..Default::default()
        };
        self.request_json_internal(Method::POST, path, Some(body), opts)
            .await
    }

    /// GET JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json_internal::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json_internal(Method::POST, path, Some(body), opts)
            .await
    }

    /// GET a document and decode it as text (lossy UTF-8).
    pub async fn get_text(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<TextResponse, HttpError> {
        let raw = self
            .send_with_retry::<()>(Method::GET, path, None, opts)
            .await?;
        let content_type = raw
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(TextResponse {
            url: raw.url,
            status: raw.status,
            content_type,
            body: String::from_utf8_lossy(&raw.bytes).into_owned(),
            raw: raw.bytes,
        })
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        match &self.base {
            Some(base) => base.join(path).map_err(|e| HttpError::Url(e.to_string())),
            None => Url::parse(path).map_err(|e| HttpError::Url(e.to_string())),
        }
    }

    async fn request_json_internal<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let raw = self.send_with_retry(method, path, body, opts).await?;
        serde_json::from_slice::<T>(&raw.bytes).map_err(|e| {
            let snippet = snip_body(&raw.bytes);
            tracing::warn!(
                req_id=%raw.req_id,
                serde_line=e.line(),
                serde_col=e.column(),
                serde_err=%e,
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// Fold options, auth and body into a request that can be replayed.
    fn prepare<'a, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'a>,
    ) -> Result<Prepared<'a>, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path, opts.allow_absolute)?;
        let auth_kind = opts.auth.as_ref().map_or("none", Auth::kind);
        let mut query = opts.query.unwrap_or_default();
        let mut headers = opts.headers.unwrap_or_default();
        let mut bearer = None;
        match opts.auth {
            Some(Auth::Bearer(token)) => bearer = Some(clean_bearer(token)?),
            Some(Auth::Header { name, value }) => {
                headers.insert(name, value);
            }
            Some(Auth::Query { name, value }) => query.push((name, value)),
            Some(Auth::None) | None => {}
        }
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(format!("body encode: {e}")))?;

        Ok(Prepared {
            method,
            url,
            query,
            headers,
            bearer,
            body,
            timeout: opts.timeout.unwrap_or(self.default_timeout),
            retries: opts.retries.unwrap_or(self.max_retries),
            auth_kind,
            req_id: Uuid::new_v4().simple().to_string(),
        })
    }

    /// Replays the request on network errors, 429 and 5xx while the retry
    /// budget lasts. Any other non-2xx is returned as `HttpError::Api`.
    async fn send_with_retry<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let req = self.prepare(method, path, body, opts)?;
        let mut attempt = 0usize;
        loop {
            let failure = match self.send_once(&req, attempt).await {
                Ok(raw) => return Ok(raw),
                Err(failure) => failure,
            };
            let (error, delay) = match failure {
                Failure::Retryable {
                    error,
                    retry_after,
                    throttled,
                } if attempt < req.retries => {
                    let floor = if throttled {
                        THROTTLE_FLOOR
                    } else {
                        Duration::ZERO
                    };
                    let next = attempt + 1;
                    (error, retry_after.unwrap_or_else(|| backoff(next).max(floor)))
                }
                Failure::Retryable { error, .. } | Failure::Fatal(error) => {
                    tracing::warn!(
                        req_id=%req.req_id,
                        attempts=attempt + 1,
                        status=?error.status(),
                        error=%error,
                        "http.error"
                    );
                    return Err(error);
                }
            };
            attempt += 1;
            tracing::warn!(
                req_id=%req.req_id,
                attempt,
                max_retries=req.retries,
                backoff_ms=delay.as_millis() as u64,
                error=%error,
                "http.retrying"
            );
            sleep(delay).await;
        }
    }

    async fn send_once(&self, req: &Prepared<'_>, attempt: usize) -> Result<RawResponse, Failure> {
        let mut rb = self
            .inner
            .request(req.method.clone(), req.url.clone())
            .timeout(req.timeout)
            .headers(req.headers.clone());
        if !req.query.is_empty() {
            rb = rb.query(&req.query);
        }
        if let Some(bytes) = &req.body {
            rb = rb
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }
        if let Some(token) = &req.bearer {
            rb = rb.bearer_auth(token);
        }

        tracing::debug!(
            req_id=%req.req_id,
            attempt=attempt + 1,
            max_retries=req.retries,
            method=%req.method,
            host_path=%format!("{}{}", req.url.host_str().unwrap_or("-"), req.url.path()),
            query=?redact_pairs(req.query.iter().map(|(k, v)| (*k, v.as_ref()))),
            timeout_ms=req.timeout.as_millis() as u64,
            auth_kind=req.auth_kind,
            has_body=req.body.is_some(),
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&req.method, &req.url, &req.headers, req.body.as_deref());
            tracing::debug!(target: "http.raw", req_id=%req.req_id, %curl, "request");
        }

        let started = Instant::now();
        let resp = rb.send().await.map_err(Failure::network)?;
        let status = resp.status();
        let url = resp.url().clone();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(Failure::network)?.to_vec();
        let duration_ms = started.elapsed().as_millis() as u64;
        let upstream_id = upstream_request_id(&headers);

        tracing::debug!(
            req_id=%req.req_id,
            %status,
            duration_ms,
            body_len=bytes.len(),
            x_request_id=%upstream_id,
            content_type=?headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            "http.response.headers"
        );
        if raw_enabled() {
            let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
            tracing::info!(
                target: "http.raw",
                req_id=%req.req_id,
                %status,
                duration_ms,
                headers=?redact_headers(&headers),
                body=%String::from_utf8_lossy(shown),
                truncated=bytes.len() > RAW_MAX_BODY
            );
        }
        tracing::trace!(req_id=%req.req_id, body_snippet=%snip_body(&bytes), "http.response.body_snippet");

        if status.is_success() {
            return Ok(RawResponse {
                url,
                status,
                headers,
                bytes,
                req_id: req.req_id.clone(),
            });
        }

        let retry_after = retry_after(&headers);
        let error = HttpError::Api {
            status,
            message: error_message(&bytes),
            request_id: upstream_id,
        };
        let throttled = status == StatusCode::TOO_MANY_REQUESTS;
        if throttled || status.is_server_error() {
            Err(Failure::Retryable {
                error,
                retry_after,
                throttled,
            })
        } else {
            Err(Failure::Fatal(error))
        }
    }
}

/// A request with auth and body resolved, ready to send any number of times.
struct Prepared<'a> {
    method: Method,
    url: Url,
    query: Vec<(&'a str, Cow<'a, str>)>,
    headers: HeaderMap,
    bearer: Option<String>,
    body: Option<Vec<u8>>,
    timeout: Duration,
    retries: usize,
    auth_kind: &'static str,
    req_id: String,
}

enum Failure {
    Retryable {
        error: HttpError,
        retry_after: Option<Duration>,
        throttled: bool,
    },
    Fatal(HttpError),
}

impl Failure {
    fn network(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Failure::Retryable {
            error: HttpError::Network(message),
            retry_after: None,
            throttled: false,
        }
    }
}

// ==============================
// Helpers
// ==============================

/// Minimum wait after a 429 that carried no `Retry-After`.
const THROTTLE_FLOOR: Duration = Duration::from_millis(1100);

fn backoff(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200 * 2u64.pow(exp))
}

fn upstream_request_id(headers: &HeaderMap) -> String {
    ["x-request-id", "x-correlation-id"]
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Best human-readable message from an error body.
///
/// Understands `{"error":{"message"}}` (OpenAI, Gemini), Twitter's
/// `{"errors":[...]}` and flat `message`/`detail`/`error` fields.
fn error_message(body: &[u8]) -> String {
    const POINTERS: [&str; 7] = [
        "/error/message",
        "/errors/0/message",
        "/errors/0/detail",
        "/errors/0/title",
        "/message",
        "/detail",
        "/error",
    ];
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| {
            POINTERS
                .iter()
                .filter_map(|p| v.pointer(p)?.as_str())
                .find(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| snip_body(body))
}

fn retry_after(h: &HeaderMap) -> Option<Duration> {
    let secs: u64 = h.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs))
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).into_owned();
    if snip.len() > 500 {
        snip.truncate(floor_char_boundary(&snip, 500));
        snip.push_str("...");
    }
    snip
}

/// Strip quotes and stray whitespace that creep into pasted tokens.
fn clean_bearer(raw: &str) -> Result<String, HttpError> {
    let token: String = raw
        .trim()
        .trim_matches(['"', '\''])
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if !token.is_ascii() || token.bytes().any(|b| b.is_ascii_control()) {
        return Err(HttpError::Build(
            "bearer token must be printable ASCII".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_tokens_lose_quotes_and_whitespace() {
        assert_eq!(clean_bearer(" \"ab c\n\" ").unwrap(), "abc");
        assert!(clean_bearer("clé").is_err());
    }

    #[test]
    fn error_body_prefers_structured_fields() {
        let nested = br#"{"error":{"code":429,"message":"quota exhausted"}}"#;
        assert_eq!(error_message(nested), "quota exhausted");

        let tw = br#"{"errors":[{"title":"Not Found Error","detail":"no tweet"}]}"#;
        assert_eq!(error_message(tw), "no tweet");

        let plain = b"upstream exploded";
        assert_eq!(error_message(plain), "upstream exploded");
    }

    #[test]
    fn redacts_secret_query_and_headers() {
        let url = Url::parse("https://x.test/v1?key=s3cret&q=moon").unwrap();
        let shown = redact_url(&url).to_string();
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("q=moon"));

        let mut h = HeaderMap::new();
        h.insert("x-api-key", HeaderValue::from_static("s3cret"));
        h.insert("accept", HeaderValue::from_static("text/html"));
        let red = redact_headers(&h);
        assert!(red.iter().all(|(_, v)| v != "s3cret"));
        assert!(red.iter().any(|(k, v)| k == "accept" && v == "text/html"));
    }

    #[test]
    fn snip_body_respects_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= 503);
    }

    #[test]
    fn unanchored_client_requires_absolute_paths() {
        let client = HttpClient::unanchored().unwrap();
        assert!(client.resolve("relative/path", false).is_err());
        assert_eq!(
            client.resolve("https://a.test/x", true).unwrap().as_str(),
            "https://a.test/x"
        );
    }

    #[test]
    fn anchored_client_joins_base() {
        let client = HttpClient::new("https://google.serper.dev/").unwrap();
        assert_eq!(
            client.resolve("search", false).unwrap().as_str(),
            "https://google.serper.dev/search"
        );
    }
}
