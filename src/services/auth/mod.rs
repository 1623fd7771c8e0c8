pub mod cognito;
pub mod factory;
pub mod init;
pub mod jwks;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use cognito::{CognitoSettings, CognitoVerifier};
pub use factory::{CognitoVerifierFactory, VerifierFactory};
pub use init::{FailurePolicy, SharedVerifier, VerifierInitializer, VerifierOutcome};
pub use verifier::{AccessClaims, TokenUse, TokenVerifier, VerifyError};
