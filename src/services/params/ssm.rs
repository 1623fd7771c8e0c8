use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::DisplayErrorContext;

use crate::services::params::store::{Parameter, ParameterStore, ParameterStoreError};

/// AWS Systems Manager Parameter Store (`GetParameters`).
///
/// Values are requested with decryption so `SecureString` parameters resolve too.
#[derive(Clone, Debug)]
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    /// Build a client from the default credential chain.
    ///
    /// `region` overrides the region the chain would pick (normally `AWS_REGION`).
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        Self::new(Client::new(&sdk_config))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    fn backend_name(&self) -> &'static str {
        "ssm"
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>, ParameterStoreError> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| ParameterStoreError::Backend(DisplayErrorContext(&e).to_string()))?;

        if !output.invalid_parameters().is_empty() {
            tracing::warn!(
                invalid = ?output.invalid_parameters(),
                "parameter store did not recognize some names"
            );
        }

        // Entries without a name or value cannot be matched to a role; drop them here
        // so the caller's count check sees only usable parameters.
        let params = output
            .parameters()
            .iter()
            .filter_map(|p| match (p.name(), p.value()) {
                (Some(name), Some(value)) => Some(Parameter::new(name, value)),
                _ => None,
            })
            .collect();

        Ok(params)
    }
}
