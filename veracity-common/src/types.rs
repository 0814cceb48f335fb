//! Fact-check domain model shared by the pipeline, the server and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Claim summaries in URL reports are cut to this many characters.
pub const CLAIM_SUMMARY_CHARS: usize = 100;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            // Clients built against chat-style APIs send these for replies.
            "assistant" | "model" | "ai" => Ok(Role::Assistant),
            other => Err(format!("unknown conversation role `{other}`")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a chat's rolling history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Categorical judgment on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    True,
    False,
    Unverifiable,
    /// No judgment could be made (unparseable output, failures, chit-chat).
    #[default]
    None,
}

impl Verdict {
    /// Lenient label parsing for model output. Unknown labels map to `None`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "TRUE" => Verdict::True,
            "FALSE" => Verdict::False,
            "UNVERIFIABLE" => Verdict::Unverifiable,
            _ => Verdict::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::Unverifiable => "UNVERIFIABLE",
            Verdict::None => "NONE",
        }
    }

    /// TRUE or FALSE; the labels that need evidence behind them.
    pub fn is_decisive(&self) -> bool {
        matches!(self, Verdict::True | Verdict::False)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single search hit used as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Structured verdict for one claim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FactCheckResult {
    pub verdict: Verdict,
    /// 0..=100, higher means more certain.
    pub confidence_score: u8,
    pub agent_response: String,
    pub evidence_summary: String,
    pub sources: Vec<Source>,
}

impl FactCheckResult {
    /// Text stored in conversation history for this result.
    pub fn history_text(&self) -> String {
        match self.verdict {
            Verdict::None => self.agent_response.clone(),
            label => format!("[{label}] {}", self.agent_response),
        }
    }
}

/// One row of a URL report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub statement: String,
    pub claim: String,
    pub verdict: Verdict,
    pub confidence_score: u8,
    pub analysis: String,
    pub evidence_summary: String,
    pub sources: Vec<Source>,
}

impl StatementResult {
    pub fn from_result(statement: impl Into<String>, result: FactCheckResult) -> Self {
        let statement = statement.into();
        Self {
            claim: summarize_claim(&statement),
            statement,
            verdict: result.verdict,
            confidence_score: result.confidence_score,
            analysis: result.agent_response,
            evidence_summary: result.evidence_summary,
            sources: result.sources,
        }
    }

    /// Entry for a statement whose evidence or verdict step failed.
    pub fn failed(statement: impl Into<String>, error: impl fmt::Display) -> Self {
        let statement = statement.into();
        Self {
            claim: summarize_claim(&statement),
            statement,
            verdict: Verdict::None,
            confidence_score: 0,
            analysis: format!("Error: {error}"),
            evidence_summary: String::new(),
            sources: Vec::new(),
        }
    }
}

fn summarize_claim(statement: &str) -> String {
    if statement.chars().count() > CLAIM_SUMMARY_CHARS {
        let head: String = statement.chars().take(CLAIM_SUMMARY_CHARS).collect();
        format!("{head}...")
    } else {
        statement.to_string()
    }
}

/// Readable text pulled out of a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    /// blake3 hex digest of the fetched body.
    pub content_hash: String,
    pub truncated: bool,
}

/// Outcome of one conversational turn.
///
/// Serialized untagged so transports see either a verdict object or a plain
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentReply {
    Verdict(FactCheckResult),
    Message(String),
}

impl AgentReply {
    pub fn as_result(&self) -> Option<&FactCheckResult> {
        match self {
            AgentReply::Verdict(result) => Some(result),
            AgentReply::Message(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AgentReply::Message(_))
    }
}
