//! Parameter store interface used by the verifier initializer.
use async_trait::async_trait;
use thiserror::Error;

/// One named value returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParameterStoreError {
    #[error("parameter store request failed: {0}")]
    Backend(String),
}

/// Keyed external store with a bulk read.
///
/// Results may come back in any order and may omit names the store does not know;
/// callers match on `Parameter::name`, never on position.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    // Store name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>, ParameterStoreError>;
}
