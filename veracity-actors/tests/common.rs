#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use url::Url;
use veracity_actors::splitter::{ClaimSplitter, SentenceSplitter};
use veracity_actors::FactChecker;
use veracity_common::observability::{LogConfig, LogFormat};
use veracity_common::{AgentConfig, ExtractedContent, Result, Source, VeracityError};
use veracity_llm::traits::{LlmClient, LlmResponse};
use veracity_web::{ContentExtractor, EvidenceSource};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "veracity-tests",
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".into(),
            ..LogConfig::default()
        };
        veracity_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub const FALSE_VERDICT: &str = r#"{"agent_response": "No. Lemon water does not cure cancer.", "verdict": "FALSE", "confidence_score": 95, "evidence_summary": "Oncology sources agree."}"#;

/// Replays queued answers, then repeats the last one; records every prompt.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    last: Mutex<Option<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering(reply: &str) -> Arc<Self> {
        let llm = Self::default();
        llm.push_ok(reply);
        Arc::new(llm)
    }

    pub fn push_ok(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_err(&self, err: &str) {
        self.replies.lock().unwrap().push_back(Err(err.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(Ok(text)) => {
                *self.last.lock().unwrap() = Some(text.clone());
                text
            }
            Some(Err(e)) => return Err(VeracityError::Agent(e)),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| FALSE_VERDICT.to_string()),
        };
        Ok(LlmResponse {
            text,
            model: Some("scripted".into()),
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Fixed search results; records the queries it was asked.
#[derive(Default)]
pub struct StaticEvidence {
    pub sources: Vec<Source>,
    pub failure: Option<String>,
    pub queries: Mutex<Vec<String>>,
}

impl StaticEvidence {
    pub fn with(sources: Vec<Source>) -> Arc<Self> {
        Arc::new(Self {
            sources,
            ..Default::default()
        })
    }

    pub fn failing(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(msg.to_string()),
            ..Default::default()
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceSource for StaticEvidence {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Source>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(msg) = &self.failure {
            return Err(VeracityError::Search(msg.clone()));
        }
        Ok(self.sources.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

pub fn oncology_sources() -> Vec<Source> {
    vec![
        Source {
            title: "Cancer myths".into(),
            snippet: "Lemon water does not treat cancer.".into(),
            link: "https://oncology.example/myths".into(),
        },
        Source {
            title: "Diet and cancer".into(),
            snippet: "No food cures cancer.".into(),
            link: "https://health.example/diet".into(),
        },
    ]
}

/// Serves canned page text by URL; unknown URLs fail.
#[derive(Default)]
pub struct FakeExtractor {
    pages: HashMap<String, String>,
}

impl FakeExtractor {
    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        let key = Url::parse(url).unwrap().to_string();
        self.pages.insert(key, text.to_string());
        self
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, url: &Url) -> Result<ExtractedContent> {
        match self.pages.get(url.as_str()) {
            Some(text) => Ok(ExtractedContent {
                url: url.to_string(),
                title: None,
                text: text.clone(),
                content_hash: fake_hash(text),
                truncated: false,
            }),
            None => Err(VeracityError::Extraction(format!("failed to fetch {url}"))),
        }
    }
}

fn fake_hash(text: &str) -> String {
    format!("{:016x}", text.len())
}

/// Delegates to the sentence splitter and keeps every input it saw.
#[derive(Default)]
pub struct RecordingSplitter {
    pub inputs: Mutex<Vec<String>>,
}

impl ClaimSplitter for RecordingSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        SentenceSplitter::new(512).split(text)
    }
}

pub fn checker(
    llm: Arc<ScriptedLlm>,
    evidence: Arc<StaticEvidence>,
    extractor: FakeExtractor,
) -> FactChecker {
    FactChecker::new(llm, evidence, Arc::new(extractor), AgentConfig::default())
}
