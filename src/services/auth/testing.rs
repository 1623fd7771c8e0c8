//! Test doubles for the verifier lifecycle (stores, factories, verifiers).
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::error::InitError;
use crate::services::auth::factory::VerifierFactory;
use crate::services::auth::verifier::{AccessClaims, TokenUse, TokenVerifier, VerifyError};
use crate::services::params::{Parameter, ParameterKeys, ParameterStore, ParameterStoreError, PoolParams};

pub fn keys() -> ParameterKeys {
    ParameterKeys {
        user_pool_id: Some("/app/userpool/id".to_string()),
        client_id: Some("/app/userpool/client".to_string()),
    }
}

pub fn pool_parameters() -> Vec<Parameter> {
    vec![
        Parameter::new("/app/userpool/client", "client-123"),
        Parameter::new("/app/userpool/id", "us-east-1_Pool"),
    ]
}

/// Store that blocks every read until `release()` is called.
pub struct GatedStore {
    gate: Notify,
    failures: usize,
    calls: AtomicUsize,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Self::failing_first(0)
    }

    /// The first `failures` reads fail at once; later reads wait for the gate.
    pub fn failing_first(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        self.gate.notify_waiters();
        // A read that has not reached the gate yet picks up the stored permit.
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterStore for GatedStore {
    fn backend_name(&self) -> &'static str {
        "gated"
    }

    async fn get_parameters(&self, _names: &[String]) -> Result<Vec<Parameter>, ParameterStoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ParameterStoreError::Backend("service unavailable".to_string()));
        }
        self.gate.notified().await;
        Ok(pool_parameters())
    }
}

/// Store that fails its first `failures` reads, then answers with `params`.
pub struct FlakyStore {
    failures: usize,
    params: Vec<Parameter>,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_first(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            params: pool_parameters(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn returning(params: Vec<Parameter>) -> Arc<Self> {
        Arc::new(Self {
            failures: 0,
            params,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterStore for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn get_parameters(&self, _names: &[String]) -> Result<Vec<Parameter>, ParameterStoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ParameterStoreError::Backend("service unavailable".to_string()));
        }
        Ok(self.params.clone())
    }
}

/// Hands out the same verifier on every build and counts builds.
pub struct CountingFactory {
    verifier: Arc<dyn TokenVerifier>,
    builds: AtomicUsize,
}

impl CountingFactory {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Arc<Self> {
        Arc::new(Self {
            verifier,
            builds: AtomicUsize::new(0),
        })
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerifierFactory for CountingFactory {
    async fn build(&self, _params: PoolParams) -> Result<Arc<dyn TokenVerifier>, InitError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.verifier.clone())
    }
}

pub struct PanickingFactory;

#[async_trait]
impl VerifierFactory for PanickingFactory {
    async fn build(&self, _params: PoolParams) -> Result<Arc<dyn TokenVerifier>, InitError> {
        panic!("verifier construction blew up");
    }
}

/// Verifier with a fixed answer that records how often it was asked.
pub struct StaticVerifier {
    username: Option<String>,
    calls: AtomicUsize,
}

impl StaticVerifier {
    pub fn accepting(username: &str) -> Arc<Self> {
        Arc::new(Self {
            username: Some(username.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            username: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str, token_use: TokenUse) -> Result<AccessClaims, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.username {
            Some(username) if token == "valid-token" => Ok(AccessClaims {
                sub: "5b3c1f0e-8a4d-4d6b-9f51-0c2d1f1e7a10".to_string(),
                iss: "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_Pool".to_string(),
                exp: chrono::Utc::now().timestamp() + 600,
                token_use: token_use.as_str().to_string(),
                username: Some(username.clone()),
                client_id: Some("client-123".to_string()),
                iat: None,
                scope: None,
            }),
            _ => Err(VerifyError::Malformed("not a valid token".to_string())),
        }
    }
}
