use crate::http_to_veracity;
use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use veracity_common::{Result, VeracityError};
use veracity_http::{HttpClient, RequestOpts};

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

#[derive(Debug, Deserialize)]
struct LocalModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    eval_count: Option<u32>,
}

/// Ollama client for local model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
pub struct OllamaClient {
    client: HttpClient,
    model: String,
}

impl OllamaClient {
    /// Create a new client and verify server/model availability.
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let client = HttpClient::new(&base)
            .map_err(|e| VeracityError::Agent(format!("Failed to create HTTP client: {e}")))?
            .with_timeout(Duration::from_secs(60))
            .with_retries(0);

        let ollama_client = Self { client, model };

        ollama_client.ping_server().await?;
        ollama_client.ensure_model_available().await?;

        Ok(ollama_client)
    }

    async fn ping_server(&self) -> Result<()> {
        self.client
            .get_json::<JsonValue>("api/tags", RequestOpts::default())
            .await
            .map(|_| ())
            .map_err(|_| VeracityError::Agent(OLLAMA_CONNECTION_ERROR.to_string()))
    }

    async fn ensure_model_available(&self) -> Result<()> {
        let models = self.fetch_available_models().await?;

        if !models.contains(&self.model) {
            tracing::info!(model = %self.model, "ollama.pull.start");
            self.pull_model(&self.model).await?;
        }

        Ok(())
    }

    async fn fetch_available_models(&self) -> Result<Vec<String>> {
        let tags: TagsResponse = self
            .client
            .get_json("api/tags", RequestOpts::default())
            .await
            .map_err(|e| VeracityError::Agent(format!("Failed to fetch models: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        // Pulls download gigabytes; the generation timeout does not apply.
        let opts = RequestOpts {
            timeout: Some(Duration::from_secs(1800)),
            ..Default::default()
        };
        let body = PullRequest {
            model,
            stream: false,
        };
        self.client
            .post_json_opts::<_, JsonValue>("api/pull", &body, opts)
            .await
            .map_err(|e| VeracityError::Agent(format!("Failed to pull model: {e}")))?;
        tracing::info!(model, "ollama.pull.done");
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system: system_prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };
        let resp: GenerateResponse = self
            .client
            .post_json("api/generate", None, &body)
            .await
            .map_err(http_to_veracity)?;

        Ok(LlmResponse {
            text: resp.response,
            model: Some(self.model.clone()),
            tokens_used: resp.eval_count,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        self.ping_server().await.map(|_| true).or(Ok(false))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
