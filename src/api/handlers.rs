//! API handlers. All return `Response` via [`ApiResponse::ok`] or
//! [`ApiErrorResponse`], except the plain `/health` probe.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::optimization::RuleBasedOptimizer;
use crate::types::OptimizationRequest;

/// Largest batch accepted by `/optimize/batch`.
pub const MAX_BATCH_SIZE: usize = 256;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub optimizer: Arc<RuleBasedOptimizer>,
}

impl ApiState {
    pub fn new(optimizer: Arc<RuleBasedOptimizer>) -> Self {
        Self { optimizer }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    pub models: Vec<String>,
    pub fallback: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /api/v1/optimize
pub async fn optimize(
    State(state): State<ApiState>,
    body: Result<Json<OptimizationRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };
    ApiResponse::ok(state.optimizer.optimize(&request))
}

/// POST /api/v1/optimize/batch
///
/// Runs on the blocking pool; the optimizer fans the batch out over rayon.
pub async fn optimize_batch(
    State(state): State<ApiState>,
    body: Result<Json<Vec<OptimizationRequest>>, JsonRejection>,
) -> Response {
    let requests = match body {
        Ok(Json(requests)) => requests,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };
    if requests.len() > MAX_BATCH_SIZE {
        return ApiErrorResponse::bad_request(format!(
            "batch of {} requests exceeds the limit of {MAX_BATCH_SIZE}",
            requests.len()
        ));
    }

    debug!(count = requests.len(), "Batch optimization requested");
    let optimizer = Arc::clone(&state.optimizer);
    match tokio::task::spawn_blocking(move || optimizer.optimize_batch(&requests)).await {
        Ok(results) => ApiResponse::ok(results),
        Err(e) => {
            error!(error = %e, "Batch optimization task failed");
            ApiErrorResponse::internal(format!("batch task failed: {e}"))
        }
    }
}

/// GET /api/v1/vehicles
pub async fn list_vehicles(State(state): State<ApiState>) -> Response {
    let registry = state.optimizer.registry();
    ApiResponse::ok(VehicleListResponse {
        models: registry.models().into_iter().map(String::from).collect(),
        fallback: registry.fallback_model().to_string(),
    })
}

/// GET /api/v1/vehicles/:model
///
/// Exact matches only; unknown models are 404 rather than the fallback.
pub async fn get_vehicle(State(state): State<ApiState>, Path(model): Path<String>) -> Response {
    match state.optimizer.registry().find(&model) {
        Some(profile) => ApiResponse::ok(profile),
        None => ApiErrorResponse::not_found(format!("unknown vehicle model '{model}'")),
    }
}

/// GET /api/v1/strategies
pub async fn list_strategies(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.optimizer.rules().strategies())
}
