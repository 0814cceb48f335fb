//! Verdict generation: prompt assembly, the model call, and defensive parsing
//! of the model's JSON answer into a [`FactCheckResult`].
//!
//! Parsing never fails. Output that cannot be read as the expected object
//! degrades to a `NONE` verdict carrying the raw model text.

use regex::Regex;
use serde_json::{Map, Value};
use veracity_common::{ConversationTurn, FactCheckResult, Result, Source, Verdict};

use crate::traits::LlmClient;

/// Evidence digest used when a search returned nothing.
pub const NO_EVIDENCE: &str = "No reliable real-time data found.";

/// Sampling knobs forwarded to the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOpts {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// `title: snippet` per line, or [`NO_EVIDENCE`].
pub fn evidence_digest(evidence: &[Source]) -> String {
    if evidence.is_empty() {
        return NO_EVIDENCE.to_string();
    }
    evidence
        .iter()
        .map(|s| format!("{}: {}", s.title, s.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(claim: &str, evidence: &[Source], history: &[ConversationTurn]) -> String {
    let evidence_block = if evidence.is_empty() {
        NO_EVIDENCE.to_string()
    } else {
        evidence
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}: {} ({})", i + 1, s.title, s.snippet, s.link))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let history_block = history
        .iter()
        .map(|t| format!("{}: {}", t.role.as_str().to_ascii_uppercase(), t.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "User Claim:\n{claim}\n\nSearch Evidence:\n{evidence_block}\n\nConversation History:\n{history_block}\n\nNow respond in the required JSON format."
    )
}

/// Ask the model for a verdict on `claim`.
///
/// Provider errors propagate; everything after a successful call is
/// infallible.
pub async fn generate_verdict(
    llm: &dyn LlmClient,
    claim: &str,
    evidence: &[Source],
    history: &[ConversationTurn],
    opts: GenerationOpts,
) -> Result<FactCheckResult> {
    let prompt = build_prompt(claim, evidence, history);
    tracing::debug!(
        model = llm.model_name(),
        evidence = evidence.len(),
        history = history.len(),
        "verdict.generate.start"
    );
    let resp = llm
        .generate(
            &prompt,
            Some(llm.default_fact_check_system_prompt()),
            opts.max_tokens,
            opts.temperature,
        )
        .await?;
    let result = parse_verdict(&resp.text, evidence);
    tracing::info!(
        model = llm.model_name(),
        verdict = %result.verdict,
        confidence = result.confidence_score,
        tokens_used = ?resp.tokens_used,
        "verdict.generate.done"
    );
    Ok(result)
}

/// Parse model output into a well-formed result. `sources` always comes from
/// `evidence`, never from the model.
pub fn parse_verdict(raw: &str, evidence: &[Source]) -> FactCheckResult {
    let text = raw.trim();
    let digest = evidence_digest(evidence);

    let Some(obj) = extract_object(text) else {
        tracing::debug!(raw_len = text.len(), "verdict.parse.fallback");
        return FactCheckResult {
            verdict: Verdict::None,
            confidence_score: 0,
            agent_response: text.to_string(),
            evidence_summary: digest,
            sources: evidence.to_vec(),
        };
    };

    let mut verdict = obj
        .get("verdict")
        .and_then(Value::as_str)
        .map(Verdict::from_label)
        .unwrap_or(Verdict::None);
    if evidence.is_empty() && verdict.is_decisive() {
        verdict = Verdict::Unverifiable;
    }

    let evidence_summary = non_empty_str(&obj, "evidence_summary");
    let agent_response = non_empty_str(&obj, "agent_response")
        .or_else(|| evidence_summary.clone())
        .unwrap_or_else(|| text.to_string());

    FactCheckResult {
        verdict,
        confidence_score: obj.get("confidence_score").map(coerce_confidence).unwrap_or(0),
        agent_response,
        evidence_summary: evidence_summary.unwrap_or(digest),
        sources: evidence.to_vec(),
    }
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Number, numeric string, or `"85%"`; rounded and clamped to 0..=100.
fn coerce_confidence(v: &Value) -> u8 {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(x) if x.is_finite() => x.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Try the reply as-is, then with an outer fence removed, then the first
/// fenced block. Each candidate falls back to its outermost `{...}` slice.
/// Fences inside a JSON string (a code sample in `agent_response`) must not
/// cut the object short, so the whole reply goes first.
fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let text = text.trim();
    [Some(text), outer_fence(text), first_fence(text)]
        .into_iter()
        .flatten()
        .find_map(|candidate| as_object(candidate).or_else(|| as_object(brace_slice(candidate)?)))
}

fn as_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Body of a fence wrapping the whole reply, up to the last closing fence.
fn outer_fence(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)\A```(?:json|JSON)?[^\n]*\n(.*)```\s*\z").ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

fn first_fence(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::LlmResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use veracity_common::VeracityError;

    fn evidence() -> Vec<Source> {
        vec![Source {
            title: "WHO".into(),
            snippet: "No evidence lemon water cures cancer".into(),
            link: "https://who.int/x".into(),
        }]
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"agent_response\":\"Nope.\",\"verdict\":\"FALSE\",\"confidence_score\":\"92\",\"evidence_summary\":\"WHO says no.\"}\n```";
        let r = parse_verdict(raw, &evidence());
        assert_eq!(r.verdict, Verdict::False);
        assert_eq!(r.confidence_score, 92);
        assert_eq!(r.agent_response, "Nope.");
        assert_eq!(r.evidence_summary, "WHO says no.");
        assert_eq!(r.sources, evidence());
    }

    #[test]
    fn code_fence_inside_the_answer_keeps_the_object_whole() {
        let bare = r#"{"agent_response":"The viral script is harmless:\n```python\nprint('lemon')\n```\nIt does not cure anything.","verdict":"FALSE","confidence_score":90,"evidence_summary":"No trial supports it."}"#;
        let r = parse_verdict(bare, &evidence());
        assert_eq!(r.verdict, Verdict::False);
        assert_eq!(r.confidence_score, 90);
        assert!(r.agent_response.contains("print('lemon')"));
        assert_eq!(r.evidence_summary, "No trial supports it.");

        let fenced = format!("```json\n{bare}\n```");
        let r = parse_verdict(&fenced, &evidence());
        assert_eq!(r.verdict, Verdict::False);
        assert!(r.agent_response.ends_with("It does not cure anything."));
    }

    #[test]
    fn parses_object_embedded_in_prose() {
        let raw = "Sure! Here you go: {\"agent_response\":\"Yes.\",\"verdict\":\"true\",\"confidence_score\":\"85%\"} hope that helps";
        let r = parse_verdict(raw, &evidence());
        assert_eq!(r.verdict, Verdict::True);
        assert_eq!(r.confidence_score, 85);
        assert_eq!(r.evidence_summary, "WHO: No evidence lemon water cures cancer");
    }

    #[test]
    fn non_json_output_degrades_to_none() {
        let raw = "I think this claim is probably false.";
        let r = parse_verdict(raw, &[]);
        assert_eq!(r.verdict, Verdict::None);
        assert_eq!(r.confidence_score, 0);
        assert_eq!(r.agent_response, raw);
        assert_eq!(r.evidence_summary, NO_EVIDENCE);
        assert!(r.sources.is_empty());
    }

    #[test]
    fn empty_evidence_downgrades_decisive_labels() {
        let raw = r#"{"agent_response":"It's true.","verdict":"TRUE","confidence_score":99}"#;
        let r = parse_verdict(raw, &[]);
        assert_eq!(r.verdict, Verdict::Unverifiable);
        assert_eq!(r.confidence_score, 99);
    }

    #[test]
    fn confidence_is_clamped_and_coerced() {
        assert_eq!(coerce_confidence(&serde_json::json!(150)), 100);
        assert_eq!(coerce_confidence(&serde_json::json!(-3)), 0);
        assert_eq!(coerce_confidence(&serde_json::json!(72.6)), 73);
        assert_eq!(coerce_confidence(&serde_json::json!(" 40 % ")), 40);
        assert_eq!(coerce_confidence(&serde_json::json!("high")), 0);
        assert_eq!(coerce_confidence(&serde_json::json!(null)), 0);
    }

    #[test]
    fn missing_agent_response_falls_back() {
        let raw = r#"{"verdict":"UNKNOWN","evidence_summary":"mixed reports"}"#;
        let r = parse_verdict(raw, &evidence());
        assert_eq!(r.verdict, Verdict::None);
        assert_eq!(r.agent_response, "mixed reports");

        let raw = r#"{"verdict":"FALSE"}"#;
        let r = parse_verdict(raw, &evidence());
        assert_eq!(r.agent_response, raw);
    }

    #[test]
    fn prompt_contains_claim_evidence_and_history() {
        let history = vec![
            ConversationTurn::user("Is the moon made of cheese?"),
            ConversationTurn::assistant("[FALSE] No."),
        ];
        let p = build_prompt("Does lemon water cure cancer?", &evidence(), &history);
        assert!(p.contains("Does lemon water cure cancer?"));
        assert!(p.contains("1. WHO: No evidence lemon water cures cancer (https://who.int/x)"));
        assert!(p.contains("USER: Is the moon made of cheese?"));
        assert!(p.contains("ASSISTANT: [FALSE] No."));

        let empty = build_prompt("x", &[], &[]);
        assert!(empty.contains(NO_EVIDENCE));
    }

    struct Scripted {
        reply: std::result::Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for Scripted {
        async fn generate(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: Some("scripted".into()),
                    tokens_used: None,
                }),
                Err(e) => Err(VeracityError::Agent(e.clone())),
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn generate_verdict_uses_model_output() {
        let llm = Scripted {
            reply: Ok(r#"{"agent_response":"No, it does not.","verdict":"FALSE","confidence_score":"95","evidence_summary":"WHO"}"#.into()),
            seen: Mutex::new(Vec::new()),
        };
        let r = generate_verdict(
            &llm,
            "Does drinking lemon water cure cancer?",
            &evidence(),
            &[],
            GenerationOpts::default(),
        )
        .await
        .unwrap();
        assert_eq!(r.verdict, Verdict::False);
        assert!(!r.agent_response.is_empty());
        assert!(llm.seen.lock().unwrap()[0].contains("lemon water"));
    }

    #[tokio::test]
    async fn generate_verdict_propagates_model_errors() {
        let llm = Scripted {
            reply: Err("quota".into()),
            seen: Mutex::new(Vec::new()),
        };
        let err = generate_verdict(&llm, "x", &[], &[], GenerationOpts::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota"));
    }
}
