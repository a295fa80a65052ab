mod config;
mod errors;
mod routes;
mod selection;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bullet selector v{}", env!("CARGO_PKG_VERSION"));

    let hybrid = &config.selection.hybrid;
    info!(
        "Selection config: ratio={} max_combination_bullets={} policy={:?} phase2_cap={:?} max_grid_cells={} chars_per_line={}",
        hybrid.skill_match_ratio,
        hybrid.max_combination_bullets,
        hybrid.combination_policy,
        hybrid.phase2_bullet_cap,
        hybrid.max_grid_cells,
        config.selection.chars_per_line
    );

    let state = AppState::new(config.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the pipeline's internal hosts

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
