/*
 * Responsibility
 * - Lambda invocation entry: raw event payload -> EdgeOutput
 * - the payload is parsed by the gate so a malformed event still gets a Server-Error response
 * - every decision is a successful invocation; failures become Server-Error responses
 */
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::Instrument;

use crate::edge::EdgeOutput;
use crate::state::AppState;

pub async fn handle(state: &AppState, event: LambdaEvent<Value>) -> Result<EdgeOutput, Error> {
    let (payload, context) = event.into_parts();

    let span = tracing::info_span!("invocation", request_id = %context.request_id);
    let output = state.gate.handle_payload(payload).instrument(span).await;

    Ok(output)
}
