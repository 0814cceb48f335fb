use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use veracity_common::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// System prompt used for verdict generation.
    fn default_fact_check_system_prompt(&self) -> &str {
        r#"You are a real-time AI fact-checker.

Steps:
1. Analyze the user claim.
2. Compare it with the verified, real-time search evidence provided.
3. If the evidence strongly supports the claim, mark it TRUE.
4. If the evidence contradicts the claim, mark it FALSE.
5. If the evidence is insufficient or conflicting, mark it UNVERIFIABLE.

Return results strictly as JSON with these fields:

{
 "agent_response": "<short conversational reply>",
 "verdict": "TRUE | FALSE | UNVERIFIABLE",
 "confidence_score": "<0-100>",
 "evidence_summary": "<short summary of evidence>"
}

Be concise and confident. Do not add text outside the JSON object."#
    }
}
