//! Factory: build a ready verifier from resolved pool parameters.
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::InitError;
use crate::services::auth::cognito::{CognitoSettings, CognitoVerifier};
use crate::services::auth::verifier::{TokenUse, TokenVerifier};
use crate::services::params::PoolParams;

#[async_trait]
pub trait VerifierFactory: Send + Sync {
    /// Construct and warm up. A verifier is only returned once it can serve requests.
    async fn build(&self, params: PoolParams) -> Result<Arc<dyn TokenVerifier>, InitError>;
}

#[derive(Debug, Clone, Default)]
pub struct CognitoVerifierFactory {
    settings: CognitoSettings,
}

impl CognitoVerifierFactory {
    pub fn new(settings: CognitoSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CognitoSettings {
            endpoint: config.cognito_endpoint.clone(),
            leeway_seconds: config.access_token_leeway_seconds,
            jwks_refetch_cooldown: config.jwks_refetch_cooldown,
        })
    }
}

#[async_trait]
impl VerifierFactory for CognitoVerifierFactory {
    async fn build(&self, params: PoolParams) -> Result<Arc<dyn TokenVerifier>, InitError> {
        let verifier = CognitoVerifier::new(&params, TokenUse::Access, &self.settings)?;

        verifier.hydrate().await.map_err(InitError::WarmUp)?;

        tracing::info!(
            user_pool_id = %verifier.user_pool_id(),
            client_id = %verifier.client_id(),
            issuer = %verifier.issuer(),
            "token verifier ready"
        );

        Ok(Arc::new(verifier))
    }
}
