//! Error types for the gateway
//!
//! `ProviderError` is what an adapter reports about a single backend call.
//! `AppError` is what the dispatch layer surfaces to callers: the same
//! backend categories with provider/model context attached, plus the
//! client-input and configuration failures that never reach a backend.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

use crate::backend::ProviderId;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of a single backend call, as classified by the adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Connection, DNS or transport failure, or a server-side (5xx) error
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend understood the call and refused it
    #[error("backend rejected the request: {0}")]
    Rejected(String),

    /// The call did not complete within its bound
    #[error("backend did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Application error surfaced by the dispatcher and the HTTP layer
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unknown provider '{name}', expected one of: {}", .known.join(", "))]
    UnknownProvider { name: String, known: Vec<String> },

    #[error("provider '{provider}' (model '{model}') is unreachable: {reason}")]
    BackendUnreachable {
        provider: ProviderId,
        model: String,
        reason: String,
    },

    #[error("provider '{provider}' (model '{model}') rejected the request: {reason}")]
    BackendRejected {
        provider: ProviderId,
        model: String,
        reason: String,
    },

    #[error("provider '{provider}' (model '{model}') timed out after {}ms", .waited.as_millis())]
    BackendTimeout {
        provider: ProviderId,
        model: String,
        waited: Duration,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Attach provider and model context to an adapter failure.
    /// The category is preserved as-is.
    pub fn from_provider(error: ProviderError, provider: ProviderId, model: &str) -> Self {
        let model = model.to_string();
        match error {
            ProviderError::Unreachable(reason) => AppError::BackendUnreachable {
                provider,
                model,
                reason,
            },
            ProviderError::Rejected(reason) => AppError::BackendRejected {
                provider,
                model,
                reason,
            },
            ProviderError::Timeout(waited) => AppError::BackendTimeout {
                provider,
                model,
                waited,
            },
        }
    }

    /// Stable, machine-readable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::UnknownProvider { .. } => "unknown_provider",
            AppError::BackendUnreachable { .. } => "backend_unreachable",
            AppError::BackendRejected { .. } => "backend_rejected",
            AppError::BackendTimeout { .. } => "backend_timeout",
            AppError::Config(_) => "configuration_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnknownProvider { .. } => StatusCode::BAD_REQUEST,
            AppError::BackendRejected { .. } => StatusCode::BAD_GATEWAY,
            AppError::BackendUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BackendTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::BackendUnreachable { .. })
    }
}

/// Malformed request bodies are reported in the same error shape as every other failure
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut detail = json!({
            "type": self.kind(),
            "message": self.to_string(),
        });

        match &self {
            AppError::UnknownProvider { known, .. } => {
                detail["known_providers"] = json!(known);
            }
            AppError::BackendUnreachable { provider, model, .. }
            | AppError::BackendRejected { provider, model, .. }
            | AppError::BackendTimeout { provider, model, .. } => {
                detail["provider"] = json!(provider.as_str());
                detail["model"] = json!(model);
            }
            _ => {}
        }

        (self.status_code(), Json(json!({ "error": detail }))).into_response()
    }
}
