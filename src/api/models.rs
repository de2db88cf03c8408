//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::backend::Parameters;
use crate::gateway::{ChatRequest, ChatResult};

/// Chat request body
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ApiChatRequest {
    /// The user's message
    pub message: String,

    /// Provider to use (defaults to the configured default provider)
    #[serde(default)]
    pub provider: Option<String>,

    /// Model name (defaults to the provider's default model)
    #[serde(default)]
    pub model: Option<String>,

    /// Provider-specific parameters, passed through unchanged
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub parameters: Option<Parameters>,

    /// Add retrieved document context to the prompt (ignored unless retrieval is enabled)
    #[serde(default)]
    pub use_rag: Option<bool>,
}

impl From<ApiChatRequest> for ChatRequest {
    fn from(request: ApiChatRequest) -> Self {
        ChatRequest {
            message: request.message,
            provider: request.provider,
            model: request.model,
            parameters: request.parameters,
            use_rag: request.use_rag,
        }
    }
}

/// Chat response body
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ApiChatResponse {
    /// The prompt that was sent to the provider
    pub prompt: String,
    /// The model's response
    pub response: String,
    /// Provider that was used
    pub provider: String,
    /// Model that was used
    pub model: String,
}

impl From<ChatResult> for ApiChatResponse {
    fn from(result: ChatResult) -> Self {
        Self {
            prompt: result.prompt,
            response: result.response,
            provider: result.provider.to_string(),
            model: result.model,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when at least one provider is reachable
    pub status: String,
    pub version: String,
    /// Reachability of every known provider
    pub providers: BTreeMap<String, bool>,
    /// Reachability of the retrieval service, present only when retrieval is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<bool>,
    pub checked_at: DateTime<Utc>,
}

/// Provider information
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProviderInfo {
    pub name: String,
    pub default_model: String,
    /// False when a required credential is missing
    pub configured: bool,
    /// Whether requests without a provider are sent here
    pub is_default: bool,
}

/// Provider list response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProviderListResponse {
    pub providers: Vec<ProviderInfo>,
}

/// Error body returned for every failure
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Error category, e.g. `validation_error` or `backend_timeout`
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_providers: Option<Vec<String>>,
}
