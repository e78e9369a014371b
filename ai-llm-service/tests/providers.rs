use ai_llm_service::{
    AiLlmError, LlmModelConfig, LlmProvider, LlmService, ProviderErrorKind, TextGenerator,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cfg(provider: LlmProvider, endpoint: &str, model: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider,
        model: model.to_string(),
        endpoint: endpoint.to_string(),
        api_key: provider.requires_api_key().then(|| "test-key".to_string()),
        max_tokens: None,
        temperature: Some(0.7),
        top_p: Some(0.9),
        top_k: Some(40),
        timeout_secs: Some(5),
    }
}

#[tokio::test]
async fn ollama_generate_and_embed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "qwen3", "stream": false, "system": "sys" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hi there" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "model": "qwen3", "prompt": "ferris" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.1, 0.2, 0.3] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let svc = LlmService::new(cfg(LlmProvider::Ollama, &server.uri(), "qwen3")).unwrap();
    assert_eq!(svc.generate("hello", Some("sys")).await.unwrap(), "hi there");
    assert_eq!(svc.embed("ferris").await.unwrap(), vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn openai_chat_sends_bearer_and_system_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "question" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": "answer" } } ]
        })))
        .mount(&server)
        .await;

    let svc = LlmService::new(cfg(LlmProvider::OpenAI, &server.uri(), "gpt-4o-mini")).unwrap();
    let out = TextGenerator::generate(&svc, "question", Some("be brief"))
        .await
        .unwrap();
    assert_eq!(out, "answer");
    assert_eq!(svc.model(), "gpt-4o-mini");
}

#[tokio::test]
async fn openai_empty_choices_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let svc = LlmService::new(cfg(LlmProvider::OpenAI, &server.uri(), "gpt-4o-mini")).unwrap();
    let err = svc.generate("q", None).await.unwrap_err();
    assert!(matches!(
        err,
        AiLlmError::Provider(ref e) if matches!(e.kind, ProviderErrorKind::EmptyChoices)
    ));
}

#[tokio::test]
async fn gemini_generate_uses_header_key_and_joins_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [ { "text": "rewrite" } ] },
            "generationConfig": { "topK": 40 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": "amylase " }, { "text": "dosage ppm" } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let svc = LlmService::new(cfg(LlmProvider::Gemini, &server.uri(), "gemini-1.5-flash")).unwrap();
    let out = svc.generate("how much amylase", Some("rewrite")).await.unwrap();
    assert_eq!(out, "amylase dosage ppm");
}

#[tokio::test]
async fn gemini_embed_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/text-embedding-004:embedContent"))
        .and(body_partial_json(json!({ "model": "models/text-embedding-004" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "embedding": { "values": [1.0, 0.0] } })),
        )
        .mount(&server)
        .await;

    let svc =
        LlmService::new(cfg(LlmProvider::Gemini, &server.uri(), "text-embedding-004")).unwrap();
    assert_eq!(svc.embed("x").await.unwrap(), vec![1.0, 0.0]);
}

#[tokio::test]
async fn non_success_status_carries_snippet() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
        .mount(&server)
        .await;

    let svc = LlmService::new(cfg(LlmProvider::Gemini, &server.uri(), "gemini-1.5-flash")).unwrap();
    match svc.generate("q", None).await {
        Err(AiLlmError::Provider(e)) => match e.kind {
            ProviderErrorKind::HttpStatus(h) => {
                assert_eq!(h.status.as_u16(), 429);
                assert_eq!(h.snippet, "quota exhausted");
            }
            other => panic!("unexpected kind: {other:?}"),
        },
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nope": true })))
        .mount(&server)
        .await;

    let svc = LlmService::new(cfg(LlmProvider::Ollama, &server.uri(), "all-minilm")).unwrap();
    let err = svc.embed("x").await.unwrap_err();
    assert!(matches!(
        err,
        AiLlmError::Provider(ref e) if matches!(e.kind, ProviderErrorKind::Decode(_))
    ));
}
