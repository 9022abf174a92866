//! Chatbot Universe Builder HTTP Server
//!
//! Provides the REST API for projects, flows and chatbot generation.

use anyhow::Result;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use universe_server::api;
use universe_server::config::{LogFormat, ServerConfig};
use universe_server::services;

/// How often expired generation sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    init_tracing(config.log_format)?;
    info!(
        host = %config.host,
        port = config.port,
        dev_mode = config.dev_mode,
        persistent = config.database_url.is_some(),
        "Loaded configuration"
    );

    let state = services::init_state(&config).await?;
    services::spawn_session_eviction(state.sessions.clone(), SESSION_SWEEP_INTERVAL);
    info!("Application state initialized");

    let app = api::create_router(state);

    // Start server
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "universe_server=info,universe_llm=info,universe_repository=info,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
