use async_trait::async_trait;
use jsonwebtoken::{Validation, decode, decode_header};
use std::time::Duration;
use tracing::instrument;
use url::Url;

use crate::error::InitError;
use crate::services::auth::jwks::JwksClient;
use crate::services::auth::verifier::{AccessClaims, TokenUse, TokenVerifier, VerifyError};
use crate::services::params::PoolParams;

/// Tokens above this size are rejected before any parsing.
pub const MAX_TOKEN_BYTES: usize = 8 * 1024;

/// Settings shared by every verifier this deployment builds.
#[derive(Debug, Clone)]
pub struct CognitoSettings {
    /// Replaces `https://cognito-idp.<region>.amazonaws.com` (local emulators, tests).
    pub endpoint: Option<Url>,
    pub leeway_seconds: u64,
    pub jwks_refetch_cooldown: Duration,
}

impl Default for CognitoSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            leeway_seconds: 0,
            jwks_refetch_cooldown: Duration::from_secs(10),
        }
    }
}

/// Verifies user pool tokens for one (pool, client, token use) triple.
///
/// - Key material lives in the JWKS client and is never printed.
pub struct CognitoVerifier {
    user_pool_id: String,
    client_id: String,
    token_use: TokenUse,
    issuer: String,
    leeway_seconds: u64,
    jwks: JwksClient,
}

impl std::fmt::Debug for CognitoVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoVerifier")
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("token_use", &self.token_use)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl CognitoVerifier {
    pub fn new(
        params: &PoolParams,
        token_use: TokenUse,
        settings: &CognitoSettings,
    ) -> Result<Self, InitError> {
        let issuer = issuer_for(&params.user_pool_id, settings.endpoint.as_ref())?;
        let jwks_url = Url::parse(&format!("{}/.well-known/jwks.json", issuer))
            .map_err(|e| InitError::Verifier(format!("invalid jwks url: {}", e)))?;

        Ok(Self {
            user_pool_id: params.user_pool_id.clone(),
            client_id: params.client_id.clone(),
            token_use,
            issuer,
            leeway_seconds: settings.leeway_seconds,
            jwks: JwksClient::new(jwks_url, settings.jwks_refetch_cooldown),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Pre-fetch the signing keys so the first request does not pay for it.
    pub async fn hydrate(&self) -> Result<(), VerifyError> {
        self.jwks.hydrate().await
    }
}

#[async_trait]
impl TokenVerifier for CognitoVerifier {
    /// Checks, in order:
    /// - size, header, `kid`
    /// - signing key from the JWKS, and that the header `alg` matches it
    /// - signature, `exp` (with leeway), `iss`
    /// - `token_use` and `client_id`
    #[instrument(skip_all, fields(pool = %self.user_pool_id))]
    async fn verify(&self, token: &str, token_use: TokenUse) -> Result<AccessClaims, VerifyError> {
        if token.len() > MAX_TOKEN_BYTES {
            return Err(VerifyError::Oversized {
                max: MAX_TOKEN_BYTES,
            });
        }

        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;
        let kid = header.kid.ok_or(VerifyError::MissingKid)?;

        let jwk = self.jwks.get_key(&kid).await?;
        let (decoding_key, alg) = jwk.decoding_key()?;

        if header.alg != alg {
            return Err(VerifyError::AlgorithmMismatch {
                expected: format!("{:?}", alg),
                found: format!("{:?}", header.alg),
            });
        }

        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Access tokens carry `client_id` instead of `aud`; checked below.
        validation.validate_aud = false;
        validation.leeway = self.leeway_seconds;

        let claims = decode::<AccessClaims>(token, &decoding_key, &validation)?.claims;

        if claims.token_use != token_use.as_str() || token_use != self.token_use {
            return Err(VerifyError::WrongTokenUse {
                expected: token_use,
                found: claims.token_use,
            });
        }

        if claims.client_id.as_deref() != Some(self.client_id.as_str()) {
            return Err(VerifyError::WrongClient);
        }

        Ok(claims)
    }
}

// Pool ids are `<region>_<suffix>`; the issuer lives in that region.
fn issuer_for(user_pool_id: &str, endpoint: Option<&Url>) -> Result<String, InitError> {
    let region = match user_pool_id.split_once('_') {
        Some((region, suffix)) if !region.is_empty() && !suffix.is_empty() => region,
        _ => {
            return Err(InitError::Verifier(format!(
                "invalid user pool id: {}",
                user_pool_id
            )));
        }
    };

    let base = match endpoint {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => format!("https://cognito-idp.{}.amazonaws.com", region),
    };

    Ok(format!("{}/{}", base, user_pool_id))
}
