//! Common types and utilities shared across Veracity crates.
//!
//! This crate defines the fact-check domain model, provider configuration,
//! observability helpers, and the shared error type used throughout the
//! Veracity workspace. It stays dependency-light so that every crate can
//! depend on it.
//!
//! # Overview
//!
//! - [`types`]: conversation turns, verdicts, sources and results
//! - [`history`]: the bounded rolling conversation history
//! - [`LlmConfig`], [`SearchConfig`], [`ExtractorConfig`], [`AgentConfig`]:
//!   provider and pipeline configuration
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`VeracityError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use veracity_common::{AgentConfig, history::MAX_HISTORY_TURNS};
//!
//! let cfg = AgentConfig::default();
//! assert_eq!(cfg.history_turns, MAX_HISTORY_TURNS);
//! assert_eq!(cfg.max_statements, 5);
//! ```
use serde::{Deserialize, Serialize};

pub mod history;
pub mod observability;
pub mod types;

pub use history::ConversationHistory;
pub use types::{
    AgentReply, ConversationTurn, ExtractedContent, FactCheckResult, Role, Source,
    StatementResult, Verdict,
};

/// Configuration for the generative model provider.
///
/// The tag is `provider`; see the `veracity-llm` crate for the concrete
/// clients each variant builds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Gemini {
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default = "default_gemini_endpoint")]
        endpoint: String,
    },
    Openai {
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
    },
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    None,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::None
    }
}

impl LlmConfig {
    /// Sampling temperature requested by the operator, if any.
    pub fn temperature(&self) -> Option<f32> {
        match self {
            Self::Gemini { temperature, .. }
            | Self::Openai { temperature, .. }
            | Self::Ollama { temperature, .. } => *temperature,
            Self::None => None,
        }
    }

    /// Output token ceiling requested by the operator, if any.
    pub fn max_tokens(&self) -> Option<u32> {
        match self {
            Self::Gemini { max_tokens, .. }
            | Self::Openai { max_tokens, .. }
            | Self::Ollama { max_tokens, .. } => *max_tokens,
            Self::None => None,
        }
    }
}

pub fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/".into()
}
pub fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/".into()
}
pub fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}

/// Web search provider used to gather evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum SearchConfig {
    Serper {
        auth_token: String,
        #[serde(default = "default_max_results")]
        max_results: usize,
        #[serde(default = "default_serper_endpoint")]
        endpoint: String,
    },
    Brave {
        auth_token: String,
        #[serde(default = "default_max_results")]
        max_results: usize,
        #[serde(default = "default_brave_endpoint")]
        endpoint: String,
    },
    /// No provider: every query yields an empty evidence list.
    None,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::None
    }
}

impl SearchConfig {
    pub fn max_results(&self) -> usize {
        match self {
            Self::Serper { max_results, .. } | Self::Brave { max_results, .. } => *max_results,
            Self::None => default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    5
}
pub fn default_serper_endpoint() -> String {
    "https://google.serper.dev/".into()
}
pub fn default_brave_endpoint() -> String {
    "https://api.search.brave.com/".into()
}

/// Content extraction limits for URL inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Extracted text beyond this many characters is cut off.
    pub max_chars: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Enables API lookup for twitter.com / x.com status links.
    pub twitter_bearer: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_chars: 5000,
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into(),
            twitter_bearer: None,
        }
    }
}

/// Orchestration knobs for the fact-check pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Rolling history size per chat (user and assistant turns).
    pub history_turns: usize,
    /// Statements checked per URL report.
    pub max_statements: usize,
    /// Upper bound for a single statement chunk when splitting text.
    pub statement_max_len: usize,
    /// Search queries are cut to this many characters.
    pub query_max_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_turns: history::MAX_HISTORY_TURNS,
            max_statements: 5,
            statement_max_len: 512,
            query_max_chars: 150,
        }
    }
}

impl AgentConfig {
    /// Turns kept per chat and sent with a prompt. Values above
    /// [`history::MAX_HISTORY_TURNS`] are capped.
    pub fn history_limit(&self) -> usize {
        self.history_turns.min(history::MAX_HISTORY_TURNS)
    }
}

/// Error types used across the Veracity system.
#[derive(thiserror::Error, Debug)]
pub enum VeracityError {
    /// The model provider failed to complete a requested operation.
    #[error("Agent error: {0}")]
    Agent(String),

    /// The search provider failed.
    #[error("Search error: {0}")]
    Search(String),

    /// A URL could not be fetched or yielded no readable text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A lower-level component reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`VeracityError`].
pub type Result<T> = std::result::Result<T, VeracityError>;
