//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Build the `/api/v1` router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        // Optimization
        .route("/optimize", post(handlers::optimize))
        .route("/optimize/batch", post(handlers::optimize_batch))
        // Reference data
        .route("/vehicles", get(handlers::list_vehicles))
        .route("/vehicles/:model", get(handlers::get_vehicle))
        .route("/strategies", get(handlers::list_strategies))
        .with_state(state)
}

/// Liveness probe at root level.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}
