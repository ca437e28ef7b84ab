mod analytics;
mod assessment;
mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod mentor;
mod models;
mod progress;
mod roadmap;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::Db;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LearnPath API v{}", env!("CARGO_PKG_VERSION"));

    // Database: Postgres when DATABASE_URL is set, local SQLite otherwise
    let db = Db::connect(&config.database).await?;
    db.migrate().await?;

    // Text-generation provider
    let llm = LlmClient::new(&config.llm).context("failed to build LLM client")?;
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm.model(),
        config.llm.timeout
    );
    let generator: Arc<dyn TextGenerator> = Arc::new(llm);

    let state = AppState {
        db,
        generator,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
