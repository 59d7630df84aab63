mod candidates;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::PgRowFetcher;
use crate::routes::{build_cors, build_router};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Database settings are validated on first use, not here
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", config.service_name, env!("CARGO_PKG_VERSION"));
    info!("Serving candidates from view '{}'", config.candidate_view);

    let fetcher = Arc::new(PgRowFetcher::new(config.database.clone()));
    let cors = build_cors(&config.cors_allowed_origins)?;

    let state = AppState {
        fetcher,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
