//! Integration tests for provider adapters against mock HTTP servers

use llm_chat_gateway::backend::{
    AnthropicBackend, ChatProvider, GeminiBackend, OllamaBackend, OpenAIBackend, Parameters,
    ProviderId,
};
use llm_chat_gateway::config::ProviderSettings;
use llm_chat_gateway::ProviderError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(id: ProviderId, server: &MockServer) -> ProviderSettings {
    ProviderSettings {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        timeout_ms: 2_000,
        probe_timeout_ms: 1_000,
        ..ProviderSettings::defaults_for(id)
    }
}

fn params(value: serde_json::Value) -> Parameters {
    value.as_object().cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ollama_chat_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "stream": false,
            "messages": [{ "role": "user", "content": "Hello" }],
            "options": { "temperature": 0.3 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "message": { "role": "assistant", "content": "Hi there" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&settings_for(ProviderId::Ollama, &server)).unwrap();
    let reply = backend
        .chat("Hello", None, &params(json!({ "options": { "temperature": 0.3 } })))
        .await
        .unwrap();

    assert_eq!(reply, "Hi there");
}

#[tokio::test]
async fn test_ollama_model_not_found_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "model 'llama9' not found" })),
        )
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&settings_for(ProviderId::Ollama, &server)).unwrap();
    let err = backend
        .chat("Hello", Some("llama9"), &Parameters::new())
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected(reason) => assert!(reason.contains("model 'llama9' not found")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_ollama_empty_content_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "" }
        })))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&settings_for(ProviderId::Ollama, &server)).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    assert!(matches!(err, ProviderError::Unreachable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_ollama_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": { "content": "late" } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = ProviderSettings {
        timeout_ms: 200,
        ..settings_for(ProviderId::Ollama, &server)
    };
    let backend = OllamaBackend::new(&settings).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    assert_eq!(err, ProviderError::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_ollama_availability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&settings_for(ProviderId::Ollama, &server)).unwrap();
    assert!(backend.is_available().await);

    let down = OllamaBackend::new(&ProviderSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        probe_timeout_ms: 500,
        ..ProviderSettings::defaults_for(ProviderId::Ollama)
    })
    .unwrap();
    assert!(!down.is_available().await);
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_openai_chat_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hello" }],
            "temperature": 0.7,
            "max_tokens": 50
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hello from OpenAI" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAIBackend::new(&settings_for(ProviderId::OpenAi, &server)).unwrap();
    let reply = backend
        .chat(
            "Hello",
            Some("gpt-4o-mini"),
            &params(json!({ "temperature": 0.7, "max_tokens": 50 })),
        )
        .await
        .unwrap();

    assert_eq!(reply, "Hello from OpenAI");
}

#[tokio::test]
async fn test_openai_bad_key_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let backend = OpenAIBackend::new(&settings_for(ProviderId::OpenAi, &server)).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    match err {
        ProviderError::Rejected(reason) => {
            assert!(reason.contains("401"));
            assert!(reason.contains("Incorrect API key provided"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_server_error_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAIBackend::new(&settings_for(ProviderId::OpenAi, &server)).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    assert!(matches!(err, ProviderError::Unreachable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_openai_no_choices_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let backend = OpenAIBackend::new(&settings_for(ProviderId::OpenAi, &server)).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    assert!(matches!(err, ProviderError::Unreachable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_openai_availability_uses_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let backend = OpenAIBackend::new(&settings_for(ProviderId::OpenAi, &server)).unwrap();
    assert!(backend.is_available().await);

    let wrong_key = OpenAIBackend::new(&ProviderSettings {
        api_key: Some("other-key".to_string()),
        ..settings_for(ProviderId::OpenAi, &server)
    })
    .unwrap();
    assert!(!wrong_key.is_available().await);
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_anthropic_chat_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 1024,
            "messages": [{ "role": "user", "content": "Hello" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "text", "text": "Hello " },
                { "type": "text", "text": "from Claude" }
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = AnthropicBackend::new(&settings_for(ProviderId::Anthropic, &server)).unwrap();
    let reply = backend.chat("Hello", None, &Parameters::new()).await.unwrap();

    assert_eq!(reply, "Hello from Claude");
}

#[tokio::test]
async fn test_anthropic_caller_max_tokens_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({ "max_tokens": 64, "temperature": 0.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "short" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = AnthropicBackend::new(&settings_for(ProviderId::Anthropic, &server)).unwrap();
    let reply = backend
        .chat("Hello", None, &params(json!({ "max_tokens": 64, "temperature": 0.0 })))
        .await
        .unwrap();

    assert_eq!(reply, "short");
}

#[tokio::test]
async fn test_anthropic_request_timeout_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(408))
        .mount(&server)
        .await;

    let backend = AnthropicBackend::new(&settings_for(ProviderId::Anthropic, &server)).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    assert!(matches!(err, ProviderError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_anthropic_availability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let backend = AnthropicBackend::new(&settings_for(ProviderId::Anthropic, &server)).unwrap();
    assert!(backend.is_available().await);
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_gemini_chat_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }],
            "generationConfig": { "temperature": 0.5 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello from Gemini" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(&settings_for(ProviderId::Gemini, &server)).unwrap();
    let reply = backend
        .chat(
            "Hello",
            None,
            &params(json!({ "generationConfig": { "temperature": 0.5 } })),
        )
        .await
        .unwrap();

    assert_eq!(reply, "Hello from Gemini");
}

#[tokio::test]
async fn test_gemini_accepts_resource_prefixed_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(&settings_for(ProviderId::Gemini, &server)).unwrap();
    let reply = backend
        .chat("Hello", Some("models/gemini-1.5-pro"), &Parameters::new())
        .await
        .unwrap();

    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_gemini_model_cannot_leave_its_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/secret/admin"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/[^/]+:generateContent$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "model not found" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(&settings_for(ProviderId::Gemini, &server)).unwrap();
    let err = backend
        .chat("Hello", Some("../../../secret/admin?x="), &Parameters::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(_)), "got {err:?}");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_gemini_invalid_body_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(&settings_for(ProviderId::Gemini, &server)).unwrap();
    let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();

    assert!(matches!(err, ProviderError::Unreachable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_gemini_availability_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(&settings_for(ProviderId::Gemini, &server)).unwrap();
    assert!(!backend.is_available().await);
}

#[tokio::test]
async fn test_unconfigured_cloud_adapters_never_call_out() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let unconfigured = |id| ProviderSettings {
        api_key: None,
        api_key_env: Some("CHAT_GATEWAY_TEST_NEVER_SET".to_string()),
        ..settings_for(id, &server)
    };

    let backends: Vec<Box<dyn ChatProvider>> = vec![
        Box::new(OpenAIBackend::new(&unconfigured(ProviderId::OpenAi)).unwrap()),
        Box::new(AnthropicBackend::new(&unconfigured(ProviderId::Anthropic)).unwrap()),
        Box::new(GeminiBackend::new(&unconfigured(ProviderId::Gemini)).unwrap()),
    ];

    for backend in backends {
        assert!(!backend.is_configured());
        assert!(!backend.is_available().await);
        let err = backend.chat("Hello", None, &Parameters::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)), "got {err:?}");
    }
}
