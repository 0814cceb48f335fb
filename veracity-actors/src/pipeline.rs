//! The fact-check pipeline: extract → split → search → verdict.
//!
//! [`FactChecker`] owns no conversation state. Callers pass the history in and
//! decide what to append afterwards (see [`crate::session`]).

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use url::Url;
use veracity_common::history::recent;
use veracity_common::{
    AgentConfig, AgentReply, ConversationTurn, FactCheckResult, Result, Source, StatementResult,
    VeracityError,
};
use veracity_llm::traits::LlmClient;
use veracity_llm::trending::{trending_misinformation, MisinformationItem};
use veracity_llm::verdict::{evidence_digest, generate_verdict, GenerationOpts};
use veracity_web::{detect_urls, ContentExtractor, EvidenceSource};

use crate::splitter::{ClaimSplitter, SentenceSplitter};

/// Prefix of every user-facing failure message.
pub const ERROR_PREFIX: &str = "Sorry, I encountered an error: ";

pub fn error_message(err: &VeracityError) -> String {
    format!("{ERROR_PREFIX}{err}")
}

/// Result of one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub reply: AgentReply,
    /// Evidence digest shown alongside the verdict; empty on failure.
    pub search_evidence: String,
}

/// Statement-by-statement report for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlReport {
    pub extracted_content: String,
    pub results: Vec<StatementResult>,
}

pub struct FactChecker {
    llm: Arc<dyn LlmClient + Send + Sync>,
    evidence: Arc<dyn EvidenceSource>,
    extractor: Arc<dyn ContentExtractor>,
    splitter: Arc<dyn ClaimSplitter>,
    settings: AgentConfig,
    max_results: usize,
    generation: GenerationOpts,
}

impl FactChecker {
    pub fn new(
        llm: Arc<dyn LlmClient + Send + Sync>,
        evidence: Arc<dyn EvidenceSource>,
        extractor: Arc<dyn ContentExtractor>,
        settings: AgentConfig,
    ) -> Self {
        let splitter = Arc::new(SentenceSplitter::new(settings.statement_max_len));
        Self {
            llm,
            evidence,
            extractor,
            splitter,
            settings,
            max_results: 5,
            generation: GenerationOpts::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn ClaimSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n.max(1);
        self
    }

    pub fn with_generation(mut self, opts: GenerationOpts) -> Self {
        self.generation = opts;
        self
    }

    pub fn settings(&self) -> &AgentConfig {
        &self.settings
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient + Send + Sync> {
        &self.llm
    }

    /// One conversational turn. Failures come back as a `Message` reply.
    pub async fn converse(&self, message: &str, history: &[ConversationTurn]) -> TurnOutcome {
        let started = Instant::now();
        tracing::info!(
            message_len = message.len(),
            history = history.len(),
            "factcheck.converse.start"
        );
        match self.try_converse(message, history).await {
            Ok((result, evidence)) => {
                tracing::info!(
                    verdict = %result.verdict,
                    confidence = result.confidence_score,
                    sources = evidence.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "factcheck.converse.done"
                );
                TurnOutcome {
                    search_evidence: evidence_digest(&evidence),
                    reply: AgentReply::Verdict(result),
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "factcheck.converse.error"
                );
                TurnOutcome {
                    reply: AgentReply::Message(error_message(&e)),
                    search_evidence: String::new(),
                }
            }
        }
    }

    async fn try_converse(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<(FactCheckResult, Vec<Source>)> {
        let claim = self.resolve_claim(message).await?;
        let query = search_query(&claim, self.settings.query_max_chars);
        let evidence = self.evidence.search(&query, self.max_results).await?;
        let history = recent(history, self.settings.history_limit());
        let result = generate_verdict(
            self.llm.as_ref(),
            &claim,
            &evidence,
            history,
            self.generation,
        )
        .await?;
        Ok((result, evidence))
    }

    /// The message itself, or the text behind every URL it mentions.
    async fn resolve_claim(&self, message: &str) -> Result<String> {
        let urls = detect_urls(message);
        if urls.is_empty() {
            return Ok(message.trim().to_string());
        }

        let mut texts = Vec::with_capacity(urls.len());
        let mut last_err = None;
        for url in &urls {
            match self.extractor.extract(url).await {
                Ok(content) => texts.push(content.text),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "factcheck.url.skipped");
                    last_err = Some(e);
                }
            }
        }
        match (texts.is_empty(), last_err) {
            (false, _) => Ok(texts.join("\n\n")),
            (true, Some(e)) => Err(e),
            (true, None) => Err(VeracityError::Extraction("no readable content".into())),
        }
    }

    /// Check every statement extracted from `url`.
    ///
    /// Only extraction failure fails the report; a failing statement is
    /// recorded with verdict `NONE` and the error as its analysis.
    pub async fn check_url(&self, url: &Url) -> Result<UrlReport> {
        let started = Instant::now();
        tracing::info!(url = %url, "factcheck.url.start");

        let content = self.extractor.extract(url).await?;
        let statements = self.splitter.split(&content.text);
        let total = statements.len();

        let mut results = Vec::new();
        for statement in statements.into_iter().take(self.settings.max_statements) {
            let entry = match self.check_statement(&statement).await {
                Ok(result) => StatementResult::from_result(statement, result),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "factcheck.statement.error");
                    StatementResult::failed(statement, &e)
                }
            };
            results.push(entry);
        }

        tracing::info!(
            url = %url,
            statements = total,
            checked = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "factcheck.url.done"
        );
        Ok(UrlReport {
            extracted_content: content.text,
            results,
        })
    }

    async fn check_statement(&self, statement: &str) -> Result<FactCheckResult> {
        let query = search_query(statement, self.settings.query_max_chars);
        let evidence = self.evidence.search(&query, self.max_results).await?;
        generate_verdict(self.llm.as_ref(), statement, &evidence, &[], self.generation).await
    }

    /// Top misinformation items for `topic` in `area`.
    pub async fn trending(&self, topic: &str, area: &str) -> Result<Vec<MisinformationItem>> {
        trending_misinformation(self.llm.as_ref(), topic, area).await
    }
}

/// Whitespace-collapsed claim cut to `max_chars` characters.
pub fn search_query(claim: &str, max_chars: usize) -> String {
    let collapsed = claim.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((idx, _)) => collapsed[..idx].trim_end().to_string(),
        None => collapsed,
    }
}
