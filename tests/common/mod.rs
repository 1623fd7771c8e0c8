#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edge_authorizer::edge::ResponseTemplates;
use edge_authorizer::middleware::RequestGate;
use edge_authorizer::services::auth::{
    CognitoSettings, CognitoVerifierFactory, FailurePolicy, SharedVerifier, VerifierInitializer,
};
use edge_authorizer::services::params::{
    Parameter, ParameterKeys, ParameterResolver, ParameterStore, ParameterStoreError,
};
use edge_authorizer::state::AppState;

pub const DOMAIN: &str = "chat.example.com";
pub const POOL_ID: &str = "eu-west-1_Integration";
pub const CLIENT_ID: &str = "integration-client";
pub const POOL_KEY: &str = "/authorizer/userpool/id";
pub const CLIENT_KEY: &str = "/authorizer/userpool/client";

pub const JWKS: &str = include_str!("../fixtures/jwks.json");
pub const RSA_A: &str = include_str!("../fixtures/rsa_a.pem");
pub const RSA_B: &str = include_str!("../fixtures/rsa_b.pem");

/// In-memory parameter store; answers in reverse order of the request.
pub struct MemoryStore {
    params: Vec<Parameter>,
    fail: bool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_pool() -> Arc<Self> {
        Arc::new(Self {
            params: vec![
                Parameter::new(CLIENT_KEY, CLIENT_ID),
                Parameter::new(POOL_KEY, POOL_ID),
            ],
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_params(params: Vec<Parameter>) -> Arc<Self> {
        Arc::new(Self {
            params,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            params: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>, ParameterStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ParameterStoreError::Backend("AccessDeniedException".to_string()));
        }
        Ok(self
            .params
            .iter()
            .filter(|p| names.contains(&p.name))
            .cloned()
            .collect())
    }
}

pub fn keys() -> ParameterKeys {
    ParameterKeys {
        user_pool_id: Some(POOL_KEY.to_string()),
        client_id: Some(CLIENT_KEY.to_string()),
    }
}

pub async fn jwks_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/.well-known/jwks.json", POOL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::from_str::<Value>(JWKS).unwrap()))
        .mount(&server)
        .await;
    server
}

pub fn gate(server: &MockServer, store: Arc<dyn ParameterStore>, keys: ParameterKeys) -> RequestGate {
    let settings = CognitoSettings {
        endpoint: Some(Url::parse(&server.uri()).unwrap()),
        ..CognitoSettings::default()
    };
    let initializer = VerifierInitializer::new(
        ParameterResolver::new(store, keys),
        Arc::new(CognitoVerifierFactory::new(settings)),
    );

    RequestGate::new(
        SharedVerifier::start(initializer, FailurePolicy::Permanent),
        ResponseTemplates::new(DOMAIN),
    )
}

pub fn state(gate: RequestGate) -> AppState {
    AppState::new(gate)
}

pub fn issuer(server: &MockServer) -> String {
    format!("{}/{}", server.uri().trim_end_matches('/'), POOL_ID)
}

pub fn access_claims(issuer: &str, expires_in: i64) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": "0f7a9d4e-1c2b-4e8f-9a6d-3b5c7e9f1a2d",
        "iss": issuer,
        "iat": now - 60,
        "exp": now + expires_in,
        "token_use": "access",
        "client_id": CLIENT_ID,
        "username": "bob"
    })
}

pub fn sign(pem: &str, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Viewer-request event around `request`.
pub fn event(request: Value) -> Value {
    json!({
        "Records": [{
            "cf": {
                "config": {
                    "distributionDomainName": "d111111abcdef8.cloudfront.net",
                    "distributionId": "EDFDVBD6EXAMPLE",
                    "eventType": "viewer-request",
                    "requestId": "4TyzHTaYWb1GX1qTfsHhEqV6HUDd_BzoBZnwfnvQc_1oF26ClkoUSEQ=="
                },
                "request": request
            }
        }]
    })
}
