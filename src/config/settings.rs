//! Application settings and configuration management

use crate::backend::ProviderId;
use crate::error::{AppError, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "CHAT_GATEWAY_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";
const ENV_PREFIX: &str = "CHAT_GATEWAY";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
    pub health: HealthConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub rag: RagConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Provider used when a request names none
    #[serde(default = "default_provider")]
    pub default_provider: String,
}

fn default_provider() -> String {
    ProviderId::Ollama.as_str().to_string()
}

impl DispatchConfig {
    pub fn default_provider(&self) -> Result<ProviderId> {
        self.default_provider.parse()
    }
}

/// Health aggregation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    /// Upper bound on a single probe, on top of each adapter's own probe timeout
    #[serde(default = "default_health_max_wait")]
    pub max_wait_ms: u64,
}

fn default_health_max_wait() -> u64 {
    10_000
}

impl HealthConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

/// Retrieval of document context from an external search service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RagConfig {
    /// Off by default; requests are then sent to providers unchanged
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rag_base_url")]
    pub base_url: String,
    /// Number of chunks requested per query
    #[serde(default = "default_rag_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rag_timeout")]
    pub timeout_ms: u64,
}

fn default_rag_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_rag_top_k() -> usize {
    3
}

fn default_rag_timeout() -> u64 {
    5_000
}

impl RagConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_rag_base_url(),
            top_k: default_rag_top_k(),
            timeout_ms: default_rag_timeout(),
        }
    }
}

/// Connection settings for every known provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    pub ollama: ProviderSettings,
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub gemini: ProviderSettings,
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &ProviderSettings {
        match id {
            ProviderId::Ollama => &self.ollama,
            ProviderId::OpenAi => &self.openai,
            ProviderId::Anthropic => &self.anthropic,
            ProviderId::Gemini => &self.gemini,
        }
    }

    pub fn get_mut(&mut self, id: ProviderId) -> &mut ProviderSettings {
        match id {
            ProviderId::Ollama => &mut self.ollama,
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Anthropic => &mut self.anthropic,
            ProviderId::Gemini => &mut self.gemini,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            ollama: ProviderSettings::defaults_for(ProviderId::Ollama),
            openai: ProviderSettings::defaults_for(ProviderId::OpenAi),
            anthropic: ProviderSettings::defaults_for(ProviderId::Anthropic),
            gemini: ProviderSettings::defaults_for(ProviderId::Gemini),
        }
    }
}

/// Connection settings for a single provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub default_model: String,
    /// Inline credential, takes precedence over `api_key_env`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Name of the environment variable holding the credential
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_timeout() -> u64 {
    60_000
}

fn default_probe_timeout() -> u64 {
    5_000
}

impl ProviderSettings {
    /// Built-in defaults for a provider
    pub fn defaults_for(id: ProviderId) -> Self {
        let (base_url, default_model, api_key_env) = match id {
            ProviderId::Ollama => ("http://localhost:11434", "llama3", None),
            ProviderId::OpenAi => (
                "https://api.openai.com/v1",
                "gpt-3.5-turbo",
                Some("OPENAI_API_KEY"),
            ),
            ProviderId::Anthropic => (
                "https://api.anthropic.com",
                "claude-3-5-sonnet-20241022",
                Some("ANTHROPIC_API_KEY"),
            ),
            ProviderId::Gemini => (
                "https://generativelanguage.googleapis.com",
                "gemini-2.5-flash",
                Some("GEMINI_API_KEY"),
            ),
        };

        Self {
            base_url: base_url.to_string(),
            default_model: default_model.to_string(),
            api_key: None,
            api_key_env: api_key_env.map(String::from),
            timeout_ms: default_timeout(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }

    /// Resolve the credential. Empty values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }

        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Settings {
    /// Load settings from the default configuration file and the environment
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load settings from a specific configuration file (YAML, TOML or JSON).
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        };

        let mut builder = Self::builder_with_defaults()?;

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.apply_legacy_env();
        settings.validate()?;

        Ok(settings)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("server.cors_origins", default_cors_origins())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("dispatch.default_provider", default_provider())?
            .set_default("health.max_wait_ms", default_health_max_wait() as i64)?
            .set_default("rag.enabled", false)?
            .set_default("rag.base_url", default_rag_base_url())?
            .set_default("rag.top_k", default_rag_top_k() as i64)?
            .set_default("rag.timeout_ms", default_rag_timeout() as i64)?;

        for id in ProviderId::ALL {
            let defaults = ProviderSettings::defaults_for(id);
            let prefix = format!("providers.{}", id.as_str());

            builder = builder
                .set_default(format!("{prefix}.base_url"), defaults.base_url)?
                .set_default(format!("{prefix}.default_model"), defaults.default_model)?
                .set_default(format!("{prefix}.timeout_ms"), defaults.timeout_ms as i64)?
                .set_default(
                    format!("{prefix}.probe_timeout_ms"),
                    defaults.probe_timeout_ms as i64,
                )?;

            if let Some(env_name) = defaults.api_key_env {
                builder = builder.set_default(format!("{prefix}.api_key_env"), env_name)?;
            }
        }

        Ok(builder)
    }

    /// Environment variables recognised for compatibility with older deployments
    fn apply_legacy_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            if !url.trim().is_empty() {
                self.providers.ollama.base_url = url.trim().to_string();
            }
        }

        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                self.providers.gemini.default_model = model.trim().to_string();
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(config_error(format!(
                "Unsupported log format '{}', expected 'json' or 'pretty'",
                self.logging.format
            )));
        }

        if self.health.max_wait_ms == 0 {
            return Err(config_error("health.max_wait_ms must be greater than 0"));
        }

        self.dispatch
            .default_provider()
            .map_err(|e| config_error(format!("dispatch.default_provider: {e}")))?;

        if self.rag.enabled {
            if self.rag.base_url.trim().is_empty() {
                return Err(config_error("rag.base_url must be set when rag is enabled"));
            }
            if self.rag.top_k == 0 || self.rag.timeout_ms == 0 {
                return Err(config_error(
                    "rag.top_k and rag.timeout_ms must be greater than 0",
                ));
            }
        }

        for id in ProviderId::ALL {
            let provider = self.providers.get(id);
            if provider.base_url.trim().is_empty() {
                return Err(config_error(format!("Provider '{id}' must have a base_url")));
            }
            if provider.default_model.trim().is_empty() {
                return Err(config_error(format!(
                    "Provider '{id}' must have a default_model"
                )));
            }
            if provider.timeout_ms == 0 || provider.probe_timeout_ms == 0 {
                return Err(config_error(format!(
                    "Provider '{id}' timeouts must be greater than 0"
                )));
            }
        }

        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                cors_origins: default_cors_origins(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            dispatch: DispatchConfig {
                default_provider: default_provider(),
            },
            health: HealthConfig {
                max_wait_ms: default_health_max_wait(),
            },
            providers: ProvidersConfig::default(),
            rag: RagConfig::default(),
        }
    }
}
