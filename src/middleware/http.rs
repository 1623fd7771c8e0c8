//! Transport layers for the local invocation harness.
//!
//! The deployed function never sees these: the edge fabric owns transport there.
//! Locally they give each `/invoke` call a request id, an access log line and
//! bounded size and duration, so harness logs read like invocation logs.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Bounds applied to every harness request.
#[derive(Debug, Clone, Copy)]
pub struct HarnessLimits {
    pub body_limit_bytes: usize,
    /// Upper bound for one decision, verifier initialization included.
    pub timeout: Duration,
}

impl Default for HarnessLimits {
    fn default() -> Self {
        Self {
            // Viewer-request events are a few KiB at most.
            body_limit_bytes: 1024 * 1024,
            // Matches the longest a viewer-request function may run.
            timeout: Duration::from_secs(5),
        }
    }
}

pub fn apply(router: Router, limits: HarnessLimits) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("harness request timed out");
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "harness request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
        .layer(TimeoutLayer::new(limits.timeout))
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}
