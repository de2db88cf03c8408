//! Anthropic adapter (messages API)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::http::{merge_parameters, missing_credential, non_empty, HttpEndpoint};
use crate::backend::{ChatProvider, Parameters, ProviderId};
use crate::config::ProviderSettings;
use crate::error::{ProviderError, Result};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Adapter for the Anthropic messages API
pub struct AnthropicBackend {
    endpoint: HttpEndpoint,
    default_model: String,
    api_key: Option<String>,
    api_key_env: Option<String>,
}

impl AnthropicBackend {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            endpoint: HttpEndpoint::new(ProviderId::Anthropic, settings)?,
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

        // The API refuses requests without max_tokens
        body.entry("max_tokens").or_insert(json!(DEFAULT_MAX_TOKENS));
        Value::Object(body)
    }
}

#[async_trait]
impl ChatProvider for AnthropicBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
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
        debug!(model = %model, "Sending Anthropic messages request");

        let request = self
            .endpoint
            .client()
            .post(self.endpoint.url("/v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(message, model, parameters));

        let response: MessagesResponse = self.endpoint.send_json(request).await?;
        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        non_empty(text, "text content")
    }

    async fn is_available(&self) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            return false;
        };

        let request = self
            .endpoint
            .client()
            .get(self.endpoint.url("/v1/models"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION);
        self.endpoint.probe(request).await
    }
}
