//! Chat dispatcher
//!
//! Single-shot call path: validate, resolve the provider, optionally add
//! retrieved context, call the adapter once and attach provider/model
//! context to any failure. No retries.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::backend::{Parameters, ProviderId, ProviderRegistry};
use crate::error::{AppError, Result};
use crate::gateway::retrieval::{augment_prompt, ContextRetriever};

const PREVIEW_CHARS: usize = 50;

/// Inbound chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub parameters: Option<Parameters>,
    /// Retrieve context for the message; only honoured when retrieval is configured
    #[serde(default)]
    pub use_rag: Option<bool>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_rag(mut self, use_rag: bool) -> Self {
        self.use_rag = Some(use_rag);
        self
    }
}

/// Outcome of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    /// Text actually sent to the provider
    pub prompt: String,
    pub response: String,
    /// Provider that served the request, after defaults were applied
    pub provider: ProviderId,
    /// Model that served the request, after defaults were applied
    pub model: String,
}

/// Resolves requests to adapters and invokes them
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    default_provider: ProviderId,
    retriever: Option<Arc<ContextRetriever>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, default_provider: ProviderId) -> Self {
        Self {
            registry,
            default_provider,
            retriever: None,
        }
    }

    /// Enable context retrieval for requests that ask for it
    pub fn with_retriever(mut self, retriever: Arc<ContextRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn retriever(&self) -> Option<&Arc<ContextRetriever>> {
        self.retriever.as_ref()
    }

    pub fn default_provider(&self) -> ProviderId {
        self.default_provider
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Handle one chat request
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResult> {
        let ChatRequest {
            message,
            provider,
            model,
            parameters,
            use_rag,
        } = request;

        if message.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let provider = match non_blank(provider.as_deref()) {
            Some(name) => self.registry.resolve(name)?,
            None => self.registry.get(self.default_provider)?,
        };
        let provider_id = provider.id();
        let model = non_blank(model.as_deref())
            .unwrap_or_else(|| provider.default_model())
            .to_string();
        let parameters = parameters.unwrap_or_default();
        let retriever = self
            .retriever
            .clone()
            .filter(|_| use_rag.unwrap_or(true));

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "chat",
            %request_id,
            provider = %provider_id,
            model = %model,
        );

        async move {
            info!(
                message_len = message.len(),
                preview = %preview(&message),
                parameters = parameters.len(),
                rag = retriever.is_some(),
                "Dispatching chat request"
            );

            let prompt = match retriever {
                Some(retriever) => {
                    let context = retriever.relevant_context(&message).await;
                    if context.is_empty() {
                        message
                    } else {
                        info!(context_len = context.len(), "Prompt enriched with retrieved context");
                        augment_prompt(&context, &message)
                    }
                }
                None => message,
            };

            let started = Instant::now();
            let outcome = provider
                .chat(&prompt, Some(model.as_str()), &parameters)
                .await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(response) => {
                    info!(elapsed_ms, response_len = response.len(), "Chat request completed");
                    Ok(ChatResult {
                        prompt,
                        response,
                        provider: provider_id,
                        model,
                    })
                }
                Err(e) => {
                    let error = AppError::from_provider(e, provider_id, &model);
                    warn!(elapsed_ms, kind = error.kind(), error = %error, "Chat request failed");
                    Err(error)
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn preview(message: &str) -> String {
    let mut preview: String = message.chars().take(PREVIEW_CHARS).collect();
    if message.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
