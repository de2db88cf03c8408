//! Retrieval of document context for chat prompts
//!
//! Queries an external search service for chunks relevant to the user's
//! message. Retrieval never fails a chat: any error degrades to an empty
//! context and the message is sent unchanged.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RagConfig;
use crate::error::{AppError, Result};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: HitMetadata,
}

#[derive(Default, Deserialize)]
struct HitMetadata {
    #[serde(default)]
    title: Option<String>,
}

/// Client for the document search service
pub struct ContextRetriever {
    client: Client,
    base_url: String,
    top_k: usize,
    timeout: Duration,
}

impl ContextRetriever {
    pub fn new(config: &RagConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            top_k: config.top_k,
            timeout: config.timeout(),
        })
    }

    /// Formatted context for a query, or an empty string when nothing relevant
    /// was found or the service could not be used
    pub async fn relevant_context(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(hits) if hits.is_empty() => {
                info!("No relevant context found for query");
                String::new()
            }
            Ok(hits) => {
                info!(chunks = hits.len(), "Retrieved context chunks");
                format_context(&hits)
            }
            Err(reason) => {
                warn!(
                    endpoint = %self.base_url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    reason = %reason,
                    "Context retrieval failed, continuing without context"
                );
                String::new()
            }
        }
    }

    /// Whether the search service answers its health endpoint
    pub async fn is_available(&self) -> bool {
        let request = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT);

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Retrieval service probe failed");
                false
            }
        }
    }

    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchHit>, String> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&SearchRequest {
                query,
                top_k: self.top_k,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("search returned HTTP {}", status.as_u16()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid search response: {}", e))?;
        Ok(body.results)
    }
}

fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let title = hit.metadata.title.as_deref().unwrap_or("Untitled");
            format!("[Source {}: {}]\n{}\n", i + 1, title, hit.text)
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Wrap a user message with retrieved context
pub fn augment_prompt(context: &str, message: &str) -> String {
    format!(
        "Context information:\n{context}\n\nUser question: {message}\n\n\
         Answer the question based on the context above. \
         If the context doesn't help answer the question, use your general knowledge."
    )
}
