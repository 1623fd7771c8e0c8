use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Kind of token a verifier accepts (`token_use` claim).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUse {
    Access,
}

impl TokenUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenUse::Access => "access",
        }
    }
}

impl fmt::Display for TokenUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access token claims as issued by the user pool.
///
/// Only `sub`, `iss`, `exp` and `token_use` are required; the rest depends on the
/// pool's configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub token_use: String,

    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl AccessClaims {
    /// Name to log for the caller: `username`, falling back to `sub`.
    pub fn principal(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.sub)
    }
}

/// Why a token was rejected.
///
/// The gate answers every variant with the same 401; the variants only exist for logs.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token exceeds {max} bytes")]
    Oversized { max: usize },

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token header has no kid")]
    MissingKid,

    #[error("no signing key for kid {0}")]
    UnknownKid(String),

    #[error("unsupported signing key {kid}: {reason}")]
    UnsupportedKey { kid: String, reason: String },

    #[error("token alg {found} does not match signing key alg {expected}")]
    AlgorithmMismatch { expected: String, found: String },

    #[error("jwks unavailable: {0}")]
    Jwks(String),

    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    #[error("token_use is {found}, expected {expected}")]
    WrongTokenUse { expected: TokenUse, found: String },

    #[error("token was issued to another client")]
    WrongClient,
}

impl VerifyError {
    /// Short, stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Oversized { .. } => "oversized",
            VerifyError::Malformed(_) => "malformed",
            VerifyError::MissingKid => "missing_kid",
            VerifyError::UnknownKid(_) => "unknown_kid",
            VerifyError::UnsupportedKey { .. } => "unsupported_key",
            VerifyError::AlgorithmMismatch { .. } => "algorithm_mismatch",
            VerifyError::Jwks(_) => "jwks",
            VerifyError::Rejected(_) => "rejected",
            VerifyError::WrongTokenUse { .. } => "wrong_token_use",
            VerifyError::WrongClient => "wrong_client",
        }
    }
}

/// Signed-token verification bound to one identity pool and one client.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, token_use: TokenUse) -> Result<AccessClaims, VerifyError>;
}
