//! Unit tests for configuration module

use llm_chat_gateway::backend::ProviderId;
use llm_chat_gateway::config::{ProviderSettings, Settings};
use llm_chat_gateway::AppError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.logging.format, "json");
    assert_eq!(settings.providers.ollama.base_url, "http://localhost:11434");
    assert_eq!(settings.providers.ollama.default_model, "llama3");
    assert_eq!(settings.providers.openai.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
    assert_eq!(
        settings.providers.anthropic.api_key_env.as_deref(),
        Some("ANTHROPIC_API_KEY")
    );
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let settings = Settings::load_from_path("does/not/exist.yaml").unwrap();

    assert_eq!(settings.dispatch.default_provider().unwrap(), ProviderId::Ollama);
    assert_eq!(settings.providers.openai.default_model, "gpt-3.5-turbo");
    assert_eq!(settings.providers.gemini.timeout_ms, 60_000);
    assert_eq!(settings.providers.gemini.probe_timeout_ms, 5_000);
}

#[test]
fn test_load_yaml_partial_override() {
    let file = write_config(
        r#"
server:
  port: 9100
dispatch:
  default_provider: anthropic
providers:
  openai:
    default_model: gpt-4o-mini
    timeout_ms: 15000
  anthropic:
    api_key_env: MY_ANTHROPIC_KEY
"#,
    );

    let settings = Settings::load_from_path(file.path()).unwrap();

    assert_eq!(settings.server.port, 9100);
    assert_eq!(settings.dispatch.default_provider().unwrap(), ProviderId::Anthropic);
    assert_eq!(settings.providers.openai.default_model, "gpt-4o-mini");
    assert_eq!(settings.providers.openai.timeout_ms, 15_000);
    // Untouched keys keep their defaults
    assert_eq!(settings.providers.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(
        settings.providers.anthropic.api_key_env.as_deref(),
        Some("MY_ANTHROPIC_KEY")
    );
    assert_eq!(
        settings.providers.anthropic.default_model,
        "claude-3-5-sonnet-20241022"
    );
}

#[test]
fn test_load_rejects_unknown_default_provider() {
    let file = write_config(
        r#"
dispatch:
  default_provider: mistral
"#,
    );

    let result = Settings::load_from_path(file.path());
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_settings_validation_invalid_port() {
    let mut settings = Settings::default();
    settings.server.port = 0;

    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_validation_invalid_log_format() {
    let mut settings = Settings::default();
    settings.logging.format = "xml".to_string();

    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_validation_empty_model() {
    let mut settings = Settings::default();
    settings.providers.gemini.default_model = "  ".to_string();

    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_validation_zero_timeout() {
    let mut settings = Settings::default();
    settings.providers.get_mut(ProviderId::Ollama).probe_timeout_ms = 0;

    assert!(settings.validate().is_err());
}

#[test]
fn test_provider_defaults() {
    for id in ProviderId::ALL {
        let defaults = ProviderSettings::defaults_for(id);
        assert!(!defaults.base_url.is_empty());
        assert!(!defaults.default_model.is_empty());
        assert!(defaults.api_key.is_none());
        assert_eq!(defaults.api_key_env.is_some(), id != ProviderId::Ollama);
    }
}

#[test]
fn test_rag_disabled_by_default() {
    let settings = Settings::load_from_path("does/not/exist.yaml").unwrap();

    assert!(!settings.rag.enabled);
    assert_eq!(settings.rag.base_url, "http://localhost:8001");
    assert_eq!(settings.rag.top_k, 3);
    assert_eq!(settings.rag.timeout_ms, 5_000);
}

#[test]
fn test_load_yaml_rag_section() {
    let file = write_config(
        r#"
rag:
  enabled: true
  base_url: http://ingestion:8001
  top_k: 5
"#,
    );

    let settings = Settings::load_from_path(file.path()).unwrap();

    assert!(settings.rag.enabled);
    assert_eq!(settings.rag.base_url, "http://ingestion:8001");
    assert_eq!(settings.rag.top_k, 5);
    assert_eq!(settings.rag.timeout_ms, 5_000);
}
