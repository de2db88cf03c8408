//! LLM Chat Gateway
//!
//! A single chat interface that dispatches to one of several LLM providers
//! (a local Ollama daemon and cloud APIs), hiding their request/response
//! shapes, authentication and availability semantics behind one contract.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;

pub use error::{AppError, ProviderError, Result};

use std::sync::Arc;

use backend::ProviderRegistry;
use gateway::{ContextRetriever, Dispatcher, HealthAggregator};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub registry: Arc<ProviderRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub health: Arc<HealthAggregator>,
}

impl AppState {
    /// Wire the registry, dispatcher and health aggregator from settings
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::new(settings.providers.clone()));
        Self::with_registry(settings, registry)
    }

    /// Wire the dispatch layer around an existing registry
    pub fn with_registry(settings: config::Settings, registry: Arc<ProviderRegistry>) -> Result<Self> {
        let default_provider = settings.dispatch.default_provider()?;
        let mut dispatcher = Dispatcher::new(registry.clone(), default_provider);
        if settings.rag.enabled {
            dispatcher = dispatcher.with_retriever(Arc::new(ContextRetriever::new(&settings.rag)?));
        }
        let dispatcher = Arc::new(dispatcher);
        let health = Arc::new(HealthAggregator::new(
            registry.clone(),
            settings.health.max_wait(),
        ));

        Ok(Self {
            settings: Arc::new(settings),
            registry,
            dispatcher,
            health,
        })
    }
}
