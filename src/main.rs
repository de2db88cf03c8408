//! Main entry point for the LLM Chat Gateway

use llm_chat_gateway::{api, config::LoggingConfig, config::Settings, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading any configuration
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let settings = Settings::load()?;
    init_tracing(&settings.logging);

    info!(dotenv_loaded, "Starting LLM Chat Gateway");
    info!(
        host = %settings.server.host,
        port = settings.server.port,
        default_provider = %settings.dispatch.default_provider,
        rag_enabled = settings.rag.enabled,
        "Loaded configuration"
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app_state = Arc::new(AppState::from_settings(settings)?);

    // Build every adapter now so configuration problems show up at startup
    let ready = app_state.registry.warm_up();
    info!(
        ready,
        known = app_state.registry.list_known().len(),
        "Provider adapters initialized"
    );

    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// RUST_LOG takes precedence over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
