//! Request gate: one decision per viewer request.
//!
//! Order matters:
//! 1. `OPTIONS` → preflight OK (no credentials on preflight; verifier never consulted)
//! 2. await the shared verifier → 500 if it could not be initialized
//! 3. first `authorization` value → 401 if absent
//! 4. verify as access token → 401 on any failure
//! 5. forward the request untouched
//!
//! A missing token and a bad token get the same 401 so callers cannot tell them apart.

use serde_json::Value;
use tracing::instrument;

use crate::edge::{Decision, EdgeEvent, EdgeOutput, EdgeRequest, ResponseTemplates};
use crate::services::auth::{SharedVerifier, TokenUse};

#[derive(Debug, Clone)]
pub struct RequestGate {
    verifier: SharedVerifier,
    templates: ResponseTemplates,
}

impl RequestGate {
    pub fn new(verifier: SharedVerifier, templates: ResponseTemplates) -> Self {
        Self {
            verifier,
            templates,
        }
    }

    #[instrument(skip_all, fields(method = %request.method()))]
    pub async fn decide(&self, request: EdgeRequest) -> Decision {
        if request.is_preflight() {
            return Decision::PreflightOk;
        }

        let verifier = match self.verifier.get().await {
            Ok(verifier) => verifier,
            Err(err) => {
                tracing::error!(error = %err, kind = err.kind(), "token verifier unavailable");
                return Decision::ServerError;
            }
        };

        let Some(token) = request.header("authorization").and_then(bearer_token) else {
            tracing::info!("request without access token");
            return Decision::Unauthorized;
        };

        let verified = verifier.verify(token, TokenUse::Access).await;

        match verified {
            Ok(claims) => {
                let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0);
                tracing::info!(
                    username = %claims.principal(),
                    expires_at = ?expires_at,
                    "access verified"
                );
                Decision::Forward(request)
            }
            Err(err) => {
                tracing::info!(error = %err, kind = err.kind(), "unable to verify access token");
                Decision::Unauthorized
            }
        }
    }

    pub async fn handle(&self, request: EdgeRequest) -> EdgeOutput {
        let decision = self.decide(request).await;
        tracing::debug!(decision = decision.label(), "request decided");
        decision.into_output(&self.templates)
    }

    /// Entry point for an event payload of unknown shape. Anything that does not
    /// read as an edge event is answered with Server-Error, never left unanswered.
    pub async fn handle_payload(&self, payload: Value) -> EdgeOutput {
        match serde_json::from_value::<EdgeEvent>(payload) {
            Ok(event) => self.handle_event(event).await,
            Err(err) => {
                tracing::error!(error = %err, "unreadable edge event");
                Decision::ServerError.into_output(&self.templates)
            }
        }
    }

    /// Entry point for a parsed edge event. An event without a request record cannot be
    /// forwarded, so it is answered with Server-Error.
    pub async fn handle_event(&self, event: EdgeEvent) -> EdgeOutput {
        match event.into_request() {
            Some(request) => self.handle(request).await,
            None => {
                tracing::error!("edge event carried no request record");
                Decision::ServerError.into_output(&self.templates)
            }
        }
    }
}

// Raw tokens and `Bearer <token>` are both accepted; blank values are not.
fn bearer_token(value: &str) -> Option<&str> {
    let value = value.trim_start();
    let token = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => &value[7..],
        _ => value,
    }
    .trim();

    (!token.is_empty()).then_some(token)
}
