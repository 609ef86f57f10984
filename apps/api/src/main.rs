mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod search;
mod sourcing;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiClient, TextGenerator};
use crate::routes::build_router;
use crate::search::{CandidateSearch, TavilyClient};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prospector API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the candidate search client
    let search: Arc<dyn CandidateSearch> = Arc::new(TavilyClient::new(config.tavily_api_key.clone()));
    info!("Search client initialized");

    // Initialize the LLM client with its model fallback chain
    let llm: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));
    info!(
        "LLM client initialized (model chain: {})",
        llm_client::MODEL_CHAIN.join(" -> ")
    );

    let state = AppState {
        search,
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
