//! Vote Gateway Server
//!
//! HTTP front door for vote submission. Receives vote codes, runs them
//! through the submission pipeline (validation, deduplication, ledger
//! broadcast) and serves receipt status lookups for submitted votes.

mod audit;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::GatewayConfig;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with RUST_LOG environment variable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("========================================");
    info!("  Vote Gateway Starting");
    info!("========================================");

    let config = GatewayConfig::from_env()?;
    let state = Arc::new(AppState::from_config(&config)?);

    // Allow the voting front-end to call the API from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/vote", post(handlers::submit_vote))
        .route("/vote/status/{hash}", get(handlers::receipt_status))
        .layer(cors)
        .with_state(state);

    info!("Configuration:");
    info!("  - Listen address: {}", config.listen_addr);
    info!("  - Ledger node: {}", config.node_url);
    info!("  - Indexer: {}", config.indexer_url);
    info!("  - Chain id: {}", config.chain_id);
    info!("  - Audit file: {}", config.votes_file.display());
    info!("");
    info!("Endpoints:");
    info!("  GET    /health              - Health check");
    info!("  POST   /vote                - Submit a vote code");
    info!("  GET    /vote/status/:hash   - Receipt status for a transaction");

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;

    info!("");
    info!("Vote gateway is ready on {}", config.listen_addr);
    info!("========================================");

    axum::serve(listener, app).await?;

    Ok(())
}
