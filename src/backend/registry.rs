//! Provider registry: one lazily-constructed adapter per provider identifier

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{
    AnthropicBackend, ChatProvider, GeminiBackend, OllamaBackend, OpenAIBackend, ProviderId,
};
use crate::config::ProvidersConfig;
use crate::error::Result;

/// Builds the adapter for a provider identifier
pub trait ProviderFactory: Send + Sync {
    fn create(&self, id: ProviderId) -> Result<Arc<dyn ChatProvider>>;
}

/// Factory building adapters from the provider settings
pub struct ConfiguredFactory {
    providers: ProvidersConfig,
}

impl ConfiguredFactory {
    pub fn new(providers: ProvidersConfig) -> Self {
        Self { providers }
    }
}

impl ProviderFactory for ConfiguredFactory {
    fn create(&self, id: ProviderId) -> Result<Arc<dyn ChatProvider>> {
        let settings = self.providers.get(id);
        let provider: Arc<dyn ChatProvider> = match id {
            ProviderId::Ollama => Arc::new(OllamaBackend::new(settings)?),
            ProviderId::OpenAi => Arc::new(OpenAIBackend::new(settings)?),
            ProviderId::Anthropic => Arc::new(AnthropicBackend::new(settings)?),
            ProviderId::Gemini => Arc::new(GeminiBackend::new(settings)?),
        };
        Ok(provider)
    }
}

/// Registry mapping provider identifiers to their adapter instances.
///
/// Every identifier in [`ProviderId::ALL`] is registered. An adapter is built
/// on first use and the same instance is returned for the rest of the
/// registry's lifetime.
pub struct ProviderRegistry {
    factory: Box<dyn ProviderFactory>,
    instances: DashMap<ProviderId, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    /// Create a registry building adapters from configuration
    pub fn new(providers: ProvidersConfig) -> Self {
        Self::with_factory(ConfiguredFactory::new(providers))
    }

    /// Create a registry with a custom adapter factory
    pub fn with_factory<F: ProviderFactory + 'static>(factory: F) -> Self {
        Self {
            factory: Box::new(factory),
            instances: DashMap::new(),
        }
    }

    /// Resolve a provider name to its adapter.
    /// Names outside the known set fail with `UnknownProvider` and build nothing.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ChatProvider>> {
        let id: ProviderId = name.parse()?;
        self.get(id)
    }

    /// Get the adapter for an identifier, building it on first use
    pub fn get(&self, id: ProviderId) -> Result<Arc<dyn ChatProvider>> {
        if let Some(existing) = self.instances.get(&id) {
            return Ok(existing.value().clone());
        }

        // The entry lock makes construction happen at most once per identifier
        match self.instances.entry(id) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let provider = self.factory.create(id)?;
                info!(
                    provider = %id,
                    default_model = %provider.default_model(),
                    configured = provider.is_configured(),
                    "Provider adapter created"
                );
                Ok(entry.insert(provider).value().clone())
            }
        }
    }

    /// Identifiers of every registered provider
    pub fn list_known(&self) -> Vec<ProviderId> {
        ProviderId::ALL.to_vec()
    }

    /// Build every adapter up front. Failures are logged and retried on next use.
    pub fn warm_up(&self) -> usize {
        let mut ready = 0;
        for id in self.list_known() {
            match self.get(id) {
                Ok(provider) => {
                    if !provider.is_configured() {
                        warn!(provider = %id, "Provider has no credential, it will report unavailable");
                    }
                    ready += 1;
                }
                Err(e) => {
                    warn!(provider = %id, error = %e, "Failed to create provider adapter");
                }
            }
        }
        ready
    }

    /// Number of adapters built so far
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether the adapter for an identifier has been built
    pub fn contains(&self, id: ProviderId) -> bool {
        self.instances.contains_key(&id)
    }
}
