//! Gemini request shape and gateway fallbacks against a mock server.

use spirit_scrolls::config::SpiritConfig;
use spirit_scrolls::spirit::{
    ConsultMode, GeminiProvider, GenerativeProvider, ProviderError, SpiritGateway,
    FALLBACK_REPLY, PERSONA, SILENT_REPLY,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn config_for(server: &MockServer, api_key: Option<&str>) -> SpiritConfig {
    SpiritConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        timeout_secs: Some(5),
        ..SpiritConfig::default()
    }
}

fn reply_with(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_consult_sends_gemini_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": "当前经文（背景上下文）:\n心如止水\n\n道友的请求:\n何为道？"}]
            }],
            "systemInstruction": {"parts": [{"text": PERSONA}]},
            "generationConfig": {"temperature": 0.8}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_with("道可道，非常道。")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = SpiritGateway::from_config(&config_for(&mock_server, Some("test-key"))).unwrap();
    let reply = gateway.consult("何为道？", "心如止水", ConsultMode::Chat).await;

    assert_eq!(reply, "道可道，非常道。");
}

#[tokio::test]
async fn test_polish_uses_polish_instruction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": {"parts": [{"text": ConsultMode::Polish.system_instruction()}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_with("润色之后")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = SpiritGateway::from_config(&config_for(&mock_server, Some("test-key"))).unwrap();
    let reply = gateway.consult("请润色", "原文", ConsultMode::Polish).await;

    assert_eq!(reply, "润色之后");
}

#[tokio::test]
async fn test_server_error_yields_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = SpiritGateway::from_config(&config_for(&mock_server, Some("test-key"))).unwrap();
    let reply = gateway.consult("何为道？", "", ConsultMode::Chat).await;

    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn test_empty_candidates_yield_silent_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&mock_server)
        .await;

    let gateway = SpiritGateway::from_config(&config_for(&mock_server, Some("test-key"))).unwrap();
    let reply = gateway.consult("何为道？", "", ConsultMode::Expand).await;

    assert_eq!(reply, SILENT_REPLY);
}

#[tokio::test]
async fn test_status_error_carries_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&mock_server)
        .await;

    let provider = GeminiProvider::new(&config_for(&mock_server, Some("bad-key"))).unwrap();
    let gateway = SpiritGateway::from_config(&config_for(&mock_server, Some("bad-key"))).unwrap();
    let request = gateway.build_request("何为道？", "", ConsultMode::Chat);

    match provider.generate(&request).await {
        Err(ProviderError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_with("不应到达")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let gateway = SpiritGateway::from_config(&config_for(&mock_server, None)).unwrap();
    let reply = gateway.consult("何为道？", "", ConsultMode::Chat).await;

    assert_eq!(reply, FALLBACK_REPLY);
}
