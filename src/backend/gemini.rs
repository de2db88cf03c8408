//! Gemini adapter (generateContent API)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::http::{merge_parameters, missing_credential, non_empty, HttpEndpoint};
use crate::backend::{ChatProvider, Parameters, ProviderId};
use crate::config::ProviderSettings;
use crate::error::{ProviderError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Adapter for the Google Gemini API
pub struct GeminiBackend {
    endpoint: HttpEndpoint,
    default_model: String,
    api_key: Option<String>,
    api_key_env: Option<String>,
}

impl GeminiBackend {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            endpoint: HttpEndpoint::new(ProviderId::Gemini, settings)?,
            default_model: settings.default_model.clone(),
            api_key: settings.resolve_api_key(),
            api_key_env: settings.api_key_env.clone(),
        })
    }

    fn request_body(message: &str, parameters: &Parameters) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            "contents".to_string(),
            json!([{ "role": "user", "parts": [{ "text": message }] }]),
        );
        merge_parameters(&mut body, parameters);
        Value::Object(body)
    }
}

#[async_trait]
impl ChatProvider for GeminiBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
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
        // Model names are accepted with or without the "models/" resource prefix
        let model = model.trim_start_matches("models/");
        debug!(model = %model, "Sending Gemini generateContent request");

        // The model travels inside the path, so it must stay one segment
        let url = self
            .endpoint
            .url_with_segment("/v1beta/models", &format!("{}:generateContent", model))?;

        let request = self
            .endpoint
            .client()
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&Self::request_body(message, parameters));

        let response: GenerateContentResponse = self.endpoint.send_json(request).await?;
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        non_empty(text, "candidate text")
    }

    async fn is_available(&self) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            return false;
        };

        let request = self
            .endpoint
            .client()
            .get(self.endpoint.url("/v1beta/models"))
            .header(API_KEY_HEADER, api_key);
        self.endpoint.probe(request).await
    }
}
