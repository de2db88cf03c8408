//! HTTP request handlers

use crate::api::models::{
    ApiChatRequest, ApiChatResponse, HealthResponse, ProviderInfo, ProviderListResponse,
};
use crate::error::AppError;
use crate::gateway::health_check::overall_status;
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

/// Send a message to a provider and get its response
#[utoipa::path(
    post,
    path = "/chat",
    tag = "Chat",
    request_body = ApiChatRequest,
    responses(
        (status = 200, description = "Model response", body = ApiChatResponse),
        (status = 400, description = "Malformed body, empty message or unknown provider", body = ErrorResponse),
        (status = 502, description = "Provider rejected the request", body = ErrorResponse),
        (status = 503, description = "Provider unreachable", body = ErrorResponse),
        (status = 504, description = "Provider timed out", body = ErrorResponse),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApiChatRequest>, JsonRejection>,
) -> Result<Json<ApiChatResponse>, AppError> {
    let Json(request) = payload?;
    let result = state.dispatcher.handle(request.into()).await?;
    Ok(Json(result.into()))
}

/// Check the availability of every provider
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Provider availability", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let retrieval = async {
        match state.dispatcher.retriever() {
            Some(retriever) => Some(retriever.is_available().await),
            None => None,
        }
    };
    let (availability, retrieval) = tokio::join!(state.health.probe_all(), retrieval);

    Json(HealthResponse {
        status: overall_status(&availability).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: availability
            .into_iter()
            .map(|(id, available)| (id.to_string(), available))
            .collect(),
        retrieval,
        checked_at: Utc::now(),
    })
}

/// List known providers
#[utoipa::path(
    get,
    path = "/providers",
    tag = "Providers",
    responses((status = 200, description = "Known providers", body = ProviderListResponse))
)]
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProviderListResponse>, AppError> {
    let default_provider = state.dispatcher.default_provider();

    let mut providers = Vec::new();
    for id in state.registry.list_known() {
        let provider = state.registry.get(id)?;
        providers.push(ProviderInfo {
            name: id.to_string(),
            default_model: provider.default_model().to_string(),
            configured: provider.is_configured(),
            is_default: id == default_provider,
        });
    }

    Ok(Json(ProviderListResponse { providers }))
}

/// Root endpoint with API information
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "LLM Chat Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/chat": "POST - Send a message to a provider",
            "/health": "GET - Check provider availability",
            "/providers": "GET - List known providers",
            "/swagger-ui": "GET - Interactive API documentation"
        }
    }))
}
