//! Response taxonomy.
//!
//! A decision is one of four variants. Three of them are answered with fixed
//! templates built once per process; `Forward` hands the untouched request back to
//! the fabric, which then sends it on to the origin.

use serde::Serialize;

use crate::edge::event::{EdgeRequest, HeaderEntry, Headers};

/// Request headers a browser may send on the real request after preflight.
pub const CORS_ALLOWED_HEADERS: &str = "cache-control,content-type,x-amz-target,x-amz-user-agent";
pub const CORS_ALLOWED_METHODS: &str = "HEAD,GET,POST";

/// Terminal response understood by the edge fabric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeResponse {
    pub status: String,
    #[serde(rename = "statusDescription")]
    pub status_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl EdgeResponse {
    fn new(status: &str, description: &str) -> Self {
        Self {
            status: status.to_string(),
            status_description: description.to_string(),
            headers: None,
        }
    }

    // Header names go out lowercase: the fabric rejects anything else as a map key.
    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.to_ascii_lowercase(), vec![HeaderEntry::new(value)]);
        self
    }
}

/// Outcome of the request gate for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// CORS preflight; answered without looking at credentials.
    PreflightOk,
    Unauthorized,
    /// The authorizer itself is not usable (initialization failed).
    ServerError,
    /// Access granted; the original request, unmodified.
    Forward(EdgeRequest),
}

impl Decision {
    pub fn into_output(self, templates: &ResponseTemplates) -> EdgeOutput {
        match self {
            Decision::PreflightOk => EdgeOutput::Respond(templates.preflight_ok.clone()),
            Decision::Unauthorized => EdgeOutput::Respond(templates.unauthorized.clone()),
            Decision::ServerError => EdgeOutput::Respond(templates.server_error.clone()),
            Decision::Forward(request) => EdgeOutput::Forward(request),
        }
    }

    /// Label for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::PreflightOk => "preflight",
            Decision::Unauthorized => "unauthorized",
            Decision::ServerError => "server_error",
            Decision::Forward(_) => "forward",
        }
    }
}

/// What goes back to the fabric: a request to forward, or a response to return.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EdgeOutput {
    Forward(EdgeRequest),
    Respond(EdgeResponse),
}

#[derive(Debug, Clone)]
pub struct ResponseTemplates {
    preflight_ok: EdgeResponse,
    unauthorized: EdgeResponse,
    server_error: EdgeResponse,
}

impl ResponseTemplates {
    pub fn new(domain_name: &str) -> Self {
        let preflight_ok = EdgeResponse::new("200", "OK")
            .with_header("access-control-allow-origin", format!("https://{}", domain_name))
            .with_header("access-control-allow-methods", CORS_ALLOWED_METHODS)
            .with_header("access-control-allow-headers", CORS_ALLOWED_HEADERS);

        Self {
            preflight_ok,
            unauthorized: EdgeResponse::new("401", "Unauthorized"),
            server_error: EdgeResponse::new("500", "InternalServerError"),
        }
    }

    pub fn preflight_ok(&self) -> &EdgeResponse {
        &self.preflight_ok
    }

    pub fn unauthorized(&self) -> &EdgeResponse {
        &self.unauthorized
    }

    pub fn server_error(&self) -> &EdgeResponse {
        &self.server_error
    }
}
