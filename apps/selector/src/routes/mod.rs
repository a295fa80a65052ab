pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::selection::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Selection API
        .route("/api/v1/selections", post(handlers::handle_select))
        .route(
            "/api/v1/selections/knapsack",
            post(handlers::handle_select_knapsack),
        )
        .with_state(state)
}
