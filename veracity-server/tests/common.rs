#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;
use veracity_actors::{ChatSessions, FactChecker};
use veracity_common::{AgentConfig, ExtractedContent, Result, Source, VeracityError};
use veracity_llm::traits::{LlmClient, LlmResponse};
use veracity_server::AppState;
use veracity_web::{ContentExtractor, EvidenceSource};

pub const FALSE_VERDICT: &str = r#"{"agent_response": "No. Lemon water does not cure cancer.", "verdict": "FALSE", "confidence_score": 95, "evidence_summary": "Oncology sources agree."}"#;

pub const TRENDING_TEXT: &str = "Misinformation: 5G towers spread viruses\nSource: Chain messages\n\n\
                                 Misinformation: Boiled garlic water cures malaria\nSource: Home remedy groups";

/// Queue of canned answers; the last one repeats. Every prompt is kept.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering(reply: &str) -> Arc<Self> {
        let llm = Self::default();
        llm.push_ok(reply);
        Arc::new(llm)
    }

    pub fn failing(err: &str) -> Arc<Self> {
        let llm = Self::default();
        llm.push_err(err);
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

pub struct StaticEvidence(pub Vec<Source>);

#[async_trait]
impl EvidenceSource for StaticEvidence {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<Source>> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

pub fn oncology_sources() -> Vec<Source> {
    vec![Source {
        title: "Cancer myths".into(),
        snippet: "Lemon water does not treat cancer.".into(),
        link: "https://oncology.example/myths".into(),
    }]
}

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
                content_hash: String::new(),
                truncated: false,
            }),
            None => Err(VeracityError::Extraction(format!("failed to fetch {url}"))),
        }
    }
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub task: JoinHandle<anyhow::Result<()>>,
    pub http: reqwest::Client,
}

impl TestServer {
    pub async fn start(llm: Arc<ScriptedLlm>, extractor: FakeExtractor) -> Self {
        let checker = FactChecker::new(
            llm,
            Arc::new(StaticEvidence(oncology_sources())),
            Arc::new(extractor),
            AgentConfig::default(),
        );
        let shutdown = CancellationToken::new();
        let sessions = ChatSessions::new(Arc::new(checker), 8, shutdown.child_token());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(veracity_server::serve(
            AppState::new(sessions),
            listener,
            shutdown.clone(),
        ));
        Self {
            addr,
            shutdown,
            task,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}
