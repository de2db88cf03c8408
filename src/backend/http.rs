//! Shared HTTP plumbing for provider adapters
//!
//! Owns the reqwest client and the two bounds every adapter needs (the chat
//! deadline and the probe deadline), and turns transport outcomes into
//! `ProviderError` categories.

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::{Parameters, ProviderId};
use crate::config::ProviderSettings;
use crate::error::{AppError, ProviderError, Result};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// HTTP connection state for one provider
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    provider: ProviderId,
    client: Client,
    base_url: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl HttpEndpoint {
    pub fn new(provider: ProviderId, settings: &ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.probe_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: settings.timeout(),
            probe_timeout: settings.probe_timeout(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL for `path` with `segment` appended as a single percent-encoded path segment.
    /// `/`, `?` and `#` inside the segment cannot leave it.
    pub fn url_with_segment(
        &self,
        path: &str,
        segment: &str,
    ) -> std::result::Result<Url, ProviderError> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ProviderError::Rejected(format!("invalid request url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Rejected(format!("base url cannot carry a path: {}", self.base_url))
            })?
            .push(segment);
        Ok(url)
    }

    /// Send a request and decode a JSON success body, bounded by the chat timeout.
    /// The wait is abandoned at the deadline; the in-flight request is dropped.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, ProviderError> {
        let call = async {
            let response = request.send().await.map_err(|e| self.classify_send_error(e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(self.classify_status(status, &body));
            }

            response.json::<T>().await.map_err(|e| {
                ProviderError::Unreachable(format!("invalid response body: {}", e))
            })
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }

    /// Bounded reachability probe: true only for a success status within the probe timeout
    pub async fn probe(&self, request: RequestBuilder) -> bool {
        match tokio::time::timeout(self.probe_timeout, request.send()).await {
            Ok(Ok(response)) if response.status().is_success() => true,
            Ok(Ok(response)) => {
                debug!(provider = %self.provider, status = %response.status(), "Probe failed");
                false
            }
            Ok(Err(e)) => {
                debug!(provider = %self.provider, error = %e, "Probe failed");
                false
            }
            Err(_) => {
                debug!(
                    provider = %self.provider,
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "Probe timed out"
                );
                false
            }
        }
    }

    fn classify_send_error(&self, error: reqwest::Error) -> ProviderError {
        let failure = if error.is_connect() {
            TransportFailure::Connect
        } else if error.is_timeout() {
            TransportFailure::Deadline
        } else if error.is_builder() {
            TransportFailure::InvalidRequest
        } else {
            TransportFailure::Other
        };
        failure.into_provider_error(error.to_string(), self.timeout)
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> ProviderError {
        let detail = format!("HTTP {}: {}", status.as_u16(), extract_error_message(body));

        if status == StatusCode::REQUEST_TIMEOUT {
            ProviderError::Timeout(self.timeout)
        } else if status.is_client_error() {
            ProviderError::Rejected(detail)
        } else {
            ProviderError::Unreachable(detail)
        }
    }
}

/// Transport-level failure observed before any response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportFailure {
    /// Connection could not be established, including a connect timeout
    Connect,
    Deadline,
    InvalidRequest,
    Other,
}

impl TransportFailure {
    fn into_provider_error(self, detail: String, deadline: Duration) -> ProviderError {
        match self {
            TransportFailure::Connect => {
                ProviderError::Unreachable(format!("connection failed: {}", detail))
            }
            TransportFailure::Deadline => ProviderError::Timeout(deadline),
            TransportFailure::InvalidRequest => {
                ProviderError::Rejected(format!("invalid request: {}", detail))
            }
            TransportFailure::Other => ProviderError::Unreachable(detail),
        }
    }
}

/// Rejection reported by cloud adapters constructed without a credential
pub fn missing_credential(env_name: Option<&str>) -> ProviderError {
    match env_name {
        Some(name) => ProviderError::Rejected(format!("credential not configured, set {}", name)),
        None => ProviderError::Rejected("credential not configured".to_string()),
    }
}

/// Pull the provider's own message out of a JSON error body, falling back to the raw text
pub fn extract_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let message = parsed.as_ref().and_then(|value| match value.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(String::from),
        None => value
            .get("message")
            .and_then(Value::as_str)
            .map(String::from),
    });

    let text = message.unwrap_or_else(|| body.trim().to_string());
    if text.is_empty() {
        return "<empty body>".to_string();
    }

    if text.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

/// Merge the caller's parameter bag into a request body.
/// Keys already present in the body are kept.
pub fn merge_parameters(body: &mut serde_json::Map<String, Value>, parameters: &Parameters) {
    for (key, value) in parameters {
        if !body.contains_key(key) {
            body.insert(key.clone(), value.clone());
        }
    }
}

/// Require a non-empty response text
pub fn non_empty(text: String, what: &str) -> std::result::Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::Unreachable(format!("empty {} in response", what)))
    } else {
        Ok(text)
    }
}
