/*
 * Responsibility
 * - URL structure of the local harness
 *   - POST /invoke: one edge event in, one edge output out
 *   - GET /health: liveness only, never touches the verifier
 * - HTTP layers from middleware::http wrap everything
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{health::health, invoke::invoke};
use crate::middleware::http::{self, HarnessLimits};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    routes_with_limits(state, HarnessLimits::default())
}

pub fn routes_with_limits(state: AppState, limits: HarnessLimits) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke))
        .with_state(state);

    http::apply(router, limits)
}
