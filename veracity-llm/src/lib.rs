//! Provider-agnostic LLM integration for Veracity.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for Gemini, OpenAI, and Ollama. On top of the
//! trait it builds the fact-check verdict generator ([`verdict`]) and the
//! trending misinformation digest ([`trending`]). [`ensure_llm_ready`]
//! initializes a client from a [`veracity_common::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use veracity_common::{LlmConfig, Result};
//! use veracity_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = LlmConfig::Gemini {
//!     model: "gemini-2.5-flash".into(),
//!     auth_token: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
//!     temperature: None,
//!     max_tokens: None,
//!     endpoint: veracity_common::default_gemini_endpoint(),
//! };
//! let client = ensure_llm_ready(&cfg).await?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;
pub mod traits;
pub mod trending;
pub mod verdict;

use std::sync::Arc;

use reqwest::StatusCode;
use traits::LlmClient;
use veracity_common::{LlmConfig, VeracityError};
use veracity_http::HttpError;

/// Default model recommendations for fact-checking
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Build the configured client. Ollama additionally verifies the server and
/// pulls the model when missing.
pub async fn ensure_llm_ready(
    config: &LlmConfig,
) -> veracity_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        #[cfg(feature = "gemini")]
        LlmConfig::Gemini {
            auth_token,
            model,
            endpoint,
            ..
        } => {
            require_token("gemini", auth_token)?;
            let client =
                gemini::GeminiClient::with_base_url(endpoint, auth_token.clone(), model.clone())?;
            Ok(Arc::new(client))
        }
        #[cfg(feature = "openai")]
        LlmConfig::Openai {
            auth_token,
            model,
            endpoint,
            ..
        } => {
            require_token("openai", auth_token)?;
            let client =
                openai::OpenAiClient::with_base_url(endpoint, auth_token.clone(), model.clone())?;
            Ok(Arc::new(client))
        }
        #[cfg(feature = "ollama")]
        LlmConfig::Ollama {
            endpoint, model, ..
        } => {
            let client = ollama::OllamaClient::new(endpoint.clone(), model.clone()).await?;
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(VeracityError::Config("No LLM configured".to_string())),
        #[allow(unreachable_patterns)]
        _ => Err(VeracityError::Config("LLM provider not enabled".to_string())),
    }
}

#[allow(dead_code)]
fn require_token(provider: &str, token: &str) -> veracity_common::Result<()> {
    if token.trim().is_empty() {
        return Err(VeracityError::Config(format!(
            "llm.auth_token is empty for provider {provider}"
        )));
    }
    Ok(())
}

/// Map transport errors onto the shared error type with provider-friendly
/// wording for the common statuses.
pub(crate) fn http_to_veracity(e: HttpError) -> VeracityError {
    if e.is_timeout() {
        return VeracityError::Timeout;
    }
    match e.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => {
            VeracityError::Agent("Rate limit exceeded".to_string())
        }
        Some(StatusCode::UNAUTHORIZED) => VeracityError::Agent("Invalid API key".to_string()),
        Some(StatusCode::FORBIDDEN) => VeracityError::Agent("API access forbidden".to_string()),
        _ => VeracityError::Agent(e.to_string()),
    }
}
