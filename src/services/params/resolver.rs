/*
 * Responsibility
 * - one bulk read of the identity pool parameters (pool id + client id)
 * - key names missing from the environment fail before any store call
 * - map results back to roles by parameter name, not by position
 */
use std::sync::Arc;

use crate::error::InitError;
use crate::services::params::store::{Parameter, ParameterStore};

const EXPECTED_PARAMETERS: usize = 2;

/// Store key names for the two parameters, as supplied by the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterKeys {
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
}

/// Resolved identity pool settings a verifier is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub user_pool_id: String,
    pub client_id: String,
}

pub struct ParameterResolver {
    store: Arc<dyn ParameterStore>,
    keys: ParameterKeys,
}

impl ParameterResolver {
    pub fn new(store: Arc<dyn ParameterStore>, keys: ParameterKeys) -> Self {
        Self { store, keys }
    }

    /// Single bulk lookup of both parameters. No retry.
    pub async fn fetch(&self) -> Result<Vec<Parameter>, InitError> {
        let pool_key = self
            .keys
            .user_pool_id
            .as_ref()
            .ok_or(InitError::Configuration("PARAM_USERPOOL_ID"))?;
        let client_key = self
            .keys
            .client_id
            .as_ref()
            .ok_or(InitError::Configuration("PARAM_USERPOOL_CLIENT"))?;

        let names = vec![pool_key.clone(), client_key.clone()];

        tracing::debug!(
            backend = self.store.backend_name(),
            names = ?names,
            "fetching identity pool parameters"
        );

        let params = self.store.get_parameters(&names).await?;

        if params.len() < EXPECTED_PARAMETERS {
            return Err(InitError::ParameterLookup {
                expected: EXPECTED_PARAMETERS,
                found: params.len(),
            });
        }

        Ok(params)
    }

    /// Fetch, then assign each value to its role by name.
    pub async fn resolve(&self) -> Result<PoolParams, InitError> {
        let params = self.fetch().await?;
        resolve_roles(&params, &self.keys)
    }
}

/// Match fetched parameters to the pool-id and client-id roles by key name.
pub fn resolve_roles(params: &[Parameter], keys: &ParameterKeys) -> Result<PoolParams, InitError> {
    let user_pool_id = find_role(params, keys.user_pool_id.as_deref(), "user pool id")?;
    let client_id = find_role(params, keys.client_id.as_deref(), "client id")?;

    Ok(PoolParams {
        user_pool_id,
        client_id,
    })
}

fn find_role(
    params: &[Parameter],
    key: Option<&str>,
    role: &'static str,
) -> Result<String, InitError> {
    let key = key.unwrap_or_default();

    params
        .iter()
        .find(|p| p.name == key)
        .map(|p| p.value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| InitError::Resolution {
            role,
            key: key.to_string(),
        })
}
