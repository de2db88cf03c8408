//! Capability contract shared by every provider adapter

use async_trait::async_trait;

use crate::backend::ProviderId;
use crate::error::ProviderError;

/// Free-form, provider-specific tuning values passed through to the backend
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Trait implemented by every provider adapter.
///
/// Adapters hold only immutable connection state after construction, so a
/// single instance serves any number of concurrent requests.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Identifier this adapter serves
    fn id(&self) -> ProviderId;

    /// Model used when a request names none
    fn default_model(&self) -> &str;

    /// Whether the adapter has everything it needs to reach its backend
    fn is_configured(&self) -> bool {
        true
    }

    /// Perform one inference call and return the generated text.
    ///
    /// `model` falls back to [`ChatProvider::default_model`] when `None`.
    /// `parameters` is forwarded without interpretation.
    async fn chat(
        &self,
        message: &str,
        model: Option<&str>,
        parameters: &Parameters,
    ) -> Result<String, ProviderError>;

    /// Lightweight, bounded reachability probe. Never fails.
    async fn is_available(&self) -> bool;
}
