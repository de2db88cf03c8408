//! Ollama adapter for the local inference daemon

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::http::{merge_parameters, non_empty, HttpEndpoint};
use crate::backend::{ChatProvider, Parameters, ProviderId};
use crate::config::ProviderSettings;
use crate::error::{ProviderError, Result};

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Adapter for a local Ollama daemon (`/api/chat`)
pub struct OllamaBackend {
    endpoint: HttpEndpoint,
    default_model: String,
}

impl OllamaBackend {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            endpoint: HttpEndpoint::new(ProviderId::Ollama, settings)?,
            default_model: settings.default_model.clone(),
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
impl ChatProvider for OllamaBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn chat(
        &self,
        message: &str,
        model: Option<&str>,
        parameters: &Parameters,
    ) -> std::result::Result<String, ProviderError> {
        let model = model.unwrap_or(&self.default_model);
        debug!(endpoint = %self.endpoint.base_url(), model = %model, "Sending Ollama chat request");

        let request = self
            .endpoint
            .client()
            .post(self.endpoint.url("/api/chat"))
            .json(&self.request_body(message, model, parameters));

        let response: OllamaChatResponse = self.endpoint.send_json(request).await?;
        non_empty(response.message.content, "message content")
    }

    async fn is_available(&self) -> bool {
        // Listing local models is the cheapest call the daemon offers
        let request = self.endpoint.client().get(self.endpoint.url("/api/tags"));
        self.endpoint.probe(request).await
    }
}
