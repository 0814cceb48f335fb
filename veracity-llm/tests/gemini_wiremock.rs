mod common;
use serde_json::json;
use veracity_common::{Source, VeracityError, Verdict};
use veracity_llm::gemini::GeminiClient;
use veracity_llm::traits::LlmClient;
use veracity_llm::trending::trending_misinformation;
use veracity_llm::verdict::{generate_verdict, GenerationOpts};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.5-flash";

fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"totalTokenCount": 42}
    })
}

async fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url(&server.uri(), "test-key".into(), MODEL.into()).unwrap()
}

#[tokio::test]
async fn generate_posts_to_model_endpoint_with_key() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Say Ok"}]}],
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "generationConfig": {"maxOutputTokens": 8}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let resp = client
        .generate("Say Ok", Some("be brief"), Some(8), None)
        .await
        .unwrap();
    assert_eq!(resp.text, "Ok");
    assert_eq!(resp.tokens_used, Some(42));
    assert_eq!(resp.model.as_deref(), Some(MODEL));
}

#[tokio::test]
async fn verdict_round_trip_through_gemini() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let model_text = "```json\n{\"agent_response\":\"No. There is no evidence lemon water cures cancer.\",\"verdict\":\"FALSE\",\"confidence_score\":\"90\",\"evidence_summary\":\"Health agencies report no such effect.\"}\n```";
    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(model_text)))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let evidence = vec![Source {
        title: "Cancer Research UK".into(),
        snippet: "Lemon water does not cure cancer".into(),
        link: "https://example.org/lemon".into(),
    }];
    let result = generate_verdict(
        &client,
        "Does drinking lemon water cure cancer?",
        &evidence,
        &[],
        GenerationOpts::default(),
    )
    .await
    .unwrap();
    assert_eq!(result.verdict, Verdict::False);
    assert_eq!(result.confidence_score, 90);
    assert_eq!(result.sources, evidence);
}

#[tokio::test]
async fn rate_limit_maps_to_agent_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": {"code": 429, "message": "Resource exhausted"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.generate("x", None, None, None).await.unwrap_err();
    match err {
        VeracityError::Agent(msg) => assert_eq!(msg, "Rate limit exceeded"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn safety_block_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.generate("x", None, None, None).await.unwrap_err();
    assert!(err.to_string().contains("safety"));
}

#[tokio::test]
async fn trending_digest_parses_model_blocks() {
    let server = MockServer::start().await;
    let text = "Misinformation: Onion cures flu\nSource: WhatsApp forwards\n\nMisinformation: Hot water kills viruses\nSource: Facebook posts";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(text)))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let items = trending_misinformation(&client, "health", "Kerala")
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].source, "WhatsApp forwards");
}
