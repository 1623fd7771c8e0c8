/*
 * Responsibility
 * - process-wide context shared by every invocation (AppState)
 *   - gate: the request gate holding the memoized verifier and response templates
 * - Clone cheap (Arc inside); the Lambda runtime and the local Router both hold one
 */
use std::sync::Arc;

use crate::middleware::RequestGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<RequestGate>,
}

impl AppState {
    pub fn new(gate: RequestGate) -> Self {
        Self {
            gate: Arc::new(gate),
        }
    }
}
