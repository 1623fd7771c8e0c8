//! JWKS client for the user pool's signing keys.
//!
//! Keys are fetched once during warm-up and kept for the life of the process.
//! A token signed with an unknown `kid` triggers one refetch (key rotation),
//! limited to one attempt per cooldown window so a flood of forged `kid`s
//! cannot turn into a flood of JWKS requests.

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use url::Url;

use crate::services::auth::verifier::VerifyError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key as published in the pool's JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    // RSA
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,

    // OKP (Ed25519)
    #[serde(default)]
    pub crv: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
}

impl Jwk {
    /// Decoding key plus the only algorithm it may verify.
    pub fn decoding_key(&self) -> Result<(DecodingKey, Algorithm), VerifyError> {
        let unsupported = |reason: &str| VerifyError::UnsupportedKey {
            kid: self.kid.clone(),
            reason: reason.to_string(),
        };

        match self.kty.as_str() {
            "RSA" => {
                let (Some(n), Some(e)) = (&self.n, &self.e) else {
                    return Err(unsupported("rsa key without n/e"));
                };
                let alg = match self.alg.as_deref() {
                    None => Algorithm::RS256,
                    Some(alg @ ("RS256" | "RS384" | "RS512")) => {
                        Algorithm::from_str(alg).map_err(|_| unsupported("bad alg"))?
                    }
                    Some(_) => return Err(unsupported("alg not allowed for rsa key")),
                };
                let key = DecodingKey::from_rsa_components(n, e)
                    .map_err(|e| unsupported(&e.to_string()))?;
                Ok((key, alg))
            }
            "OKP" => {
                if self.crv.as_deref() != Some("Ed25519") {
                    return Err(unsupported("only Ed25519 okp keys are supported"));
                }
                let x = self.x.as_ref().ok_or_else(|| unsupported("okp key without x"))?;
                let key =
                    DecodingKey::from_ed_components(x).map_err(|e| unsupported(&e.to_string()))?;
                Ok((key, Algorithm::EdDSA))
            }
            other => Err(unsupported(&format!("kty {other}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

struct CachedJwks {
    keys: HashMap<String, Jwk>,
}

pub struct JwksClient {
    jwks_url: Url,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedJwks>>,
    // Serializes fetches; holds the time of the last attempt (success or not).
    last_fetch: Mutex<Option<Instant>>,
    refetch_cooldown: Duration,
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("jwks_url", &self.jwks_url.as_str())
            .field("refetch_cooldown", &self.refetch_cooldown)
            .finish()
    }
}

impl JwksClient {
    pub fn new(jwks_url: Url, refetch_cooldown: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build jwks http client, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            last_fetch: Mutex::new(None),
            refetch_cooldown,
        }
    }

    /// Fetch the key set now, regardless of cache state.
    pub async fn hydrate(&self) -> Result<(), VerifyError> {
        let mut last_fetch = self.last_fetch.lock().await;
        *last_fetch = Some(Instant::now());
        self.fetch().await
    }

    /// Look up a key by `kid`, refetching once if it is unknown.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, VerifyError> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let mut last_fetch = self.last_fetch.lock().await;

        // Another caller may have refetched while we waited for the lock.
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let cooling_down = last_fetch.is_some_and(|at| at.elapsed() < self.refetch_cooldown);
        if cooling_down {
            tracing::debug!(kid = %kid, "unknown kid, jwks refetch cooling down");
            return Err(VerifyError::UnknownKid(kid.to_string()));
        }

        *last_fetch = Some(Instant::now());
        self.fetch().await?;
        drop(last_fetch);

        self.cached(kid).await.ok_or_else(|| {
            tracing::warn!(kid = %kid, "kid not found in jwks after refetch");
            VerifyError::UnknownKid(kid.to_string())
        })
    }

    async fn cached(&self, kid: &str) -> Option<Jwk> {
        let cache = self.cache.read().await;
        cache.as_ref().and_then(|c| c.keys.get(kid).cloned())
    }

    async fn fetch(&self) -> Result<(), VerifyError> {
        tracing::debug!(url = %self.jwks_url, "fetching jwks");

        let response = self
            .http_client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| VerifyError::Jwks(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerifyError::Jwks(format!(
                "jwks endpoint returned status {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::Jwks(format!("invalid jwks document: {}", e)))?;

        // Encryption keys share the document in some deployments; skip them.
        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .filter(|k| k.key_use.as_deref().is_none_or(|u| u == "sig"))
            .map(|k| (k.kid.clone(), k))
            .collect();

        if keys.is_empty() {
            return Err(VerifyError::Jwks("jwks contains no signing keys".to_string()));
        }

        tracing::info!(key_count = keys.len(), "jwks loaded");

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks { keys });

        Ok(())
    }
}
