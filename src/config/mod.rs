//! Configuration module

pub mod settings;

pub use settings::{
    DispatchConfig, HealthConfig, LoggingConfig, ProviderSettings, ProvidersConfig, RagConfig,
    ServerConfig, Settings,
};
