/*
 * Responsibility
 * - POST /invoke: run a viewer-request event through the gate, the same way the Lambda runtime does
 * - the decision travels in the body; any JSON body gets 200, malformed events decide Server-Error
 */
use axum::{Json, extract::State};
use serde_json::Value;

use crate::edge::EdgeOutput;
use crate::state::AppState;

pub async fn invoke(State(state): State<AppState>, Json(payload): Json<Value>) -> Json<EdgeOutput> {
    Json(state.gate.handle_payload(payload).await)
}
