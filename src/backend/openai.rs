//! OpenAI adapter (chat completions API)

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::http::{merge_parameters, missing_credential, non_empty, HttpEndpoint};
use crate::backend::{ChatProvider, Parameters, ProviderId};
use crate::config::ProviderSettings;
use crate::error::{ProviderError, Result};

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Adapter for the OpenAI chat completions API
pub struct OpenAIBackend {
    endpoint: HttpEndpoint,
    default_model: String,
    api_key: Option<String>,
    api_key_env: Option<String>,
}

impl OpenAIBackend {
    /// The credential is read here, once, and never re-read
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            endpoint: HttpEndpoint::new(ProviderId::OpenAi, settings)?,
            default_model: settings.default_model.clone(),
            api_key: settings.resolve_api_key(),
            api_key_env: settings.api_key_env.clone(),
        })
    }

    fn request_body(&self, message: &str, model: &str, parameters: &Parameters) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("model".to_string(), json!(model));
        body.insert(
            "messages".to_string(),
            json!([{ "role": "user", "content": message }]),
        );
        body.insert("stream".to_string(), json!(false));
        merge_parameters(&mut body, parameters);
        Value::Object(body)
    }
}

#[async_trait]
impl ChatProvider for OpenAIBackend {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn chat(
        &self,
        message: &str,
        model: Option<&str>,
        parameters: &Parameters,
    ) -> std::result::Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| missing_credential(self.api_key_env.as_deref()))?;
        let model = model.unwrap_or(&self.default_model);
        debug!(model = %model, "Sending OpenAI chat completion request");

        let request = self
            .endpoint
            .client()
            .post(self.endpoint.url("/chat/completions"))
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&self.request_body(message, model, parameters));

        let response: CompletionResponse = self.endpoint.send_json(request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        non_empty(content, "completion")
    }

    async fn is_available(&self) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            return false;
        };

        let request = self
            .endpoint
            .client()
            .get(self.endpoint.url("/models"))
            .header(AUTHORIZATION, format!("Bearer {}", api_key));
        self.endpoint.probe(request).await
    }
}
