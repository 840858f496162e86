mod config;
mod domains;
mod errors;
mod flow;
mod llm_client;
mod routes;
mod session;
mod state;
#[cfg(test)]
mod test_support;
mod workspace;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::session::SessionGate;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Spartan API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize generation client
    let llm = GeminiClient::from_config(&config)?;
    info!("Generation client initialized (model: {})", llm.model());

    // Initialize session gate
    let sessions = SessionGate::from_config(&config.identity)?
        .with_idle_timeout(config.session_idle_timeout_secs);
    if sessions.is_configured() {
        info!("Identity provider configured");
    } else {
        warn!(
            "Identity provider not configured (missing: {}); session routes will report a setup notice",
            config.identity.missing_variables().join(", ")
        );
    }

    let sessions = Arc::new(sessions);

    // Sweep idle sessions in the background
    let sweeper = sessions.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        loop {
            tick.tick().await;
            sweeper.cleanup_idle_sessions().await;
        }
    });

    let state = AppState {
        llm: Arc::new(llm),
        sessions,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
