/*
 * Responsibility
 * - InitError: why the shared verifier could not be made ready
 * - every variant is fatal for the attempt and surfaces as Server-Error (500)
 * - per-request token failures live in services::auth::VerifyError instead (401)
 */
use thiserror::Error;

use crate::services::auth::VerifyError;
use crate::services::params::ParameterStoreError;

#[derive(Debug, Error)]
pub enum InitError {
    /// A parameter key name was never supplied to the environment.
    #[error("parameter key name not configured: {0}")]
    Configuration(&'static str),

    /// The store call itself failed (unreachable, access denied, ...).
    #[error(transparent)]
    ParameterStore(#[from] ParameterStoreError),

    /// The store answered but did not return every requested parameter.
    #[error("parameter store returned {found} of {expected} parameters")]
    ParameterLookup { expected: usize, found: usize },

    #[error("no usable value for {role} (parameter {key})")]
    Resolution { role: &'static str, key: String },

    #[error("verifier construction failed: {0}")]
    Verifier(String),

    #[error("verifier warm-up failed: {0}")]
    WarmUp(#[source] VerifyError),

    #[error("initialization task aborted: {0}")]
    Aborted(String),
}

impl InitError {
    /// Short, stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            InitError::Configuration(_) => "configuration",
            InitError::ParameterStore(_) => "parameter_store",
            InitError::ParameterLookup { .. } => "parameter_lookup",
            InitError::Resolution { .. } => "resolution",
            InitError::Verifier(_) => "verifier",
            InitError::WarmUp(_) => "warm_up",
            InitError::Aborted(_) => "aborted",
        }
    }
}
