/*
 * Responsibility
 * - read environment configuration once at cold start (DOMAIN_NAME, parameter key names, ...)
 * - validate what the process cannot run without (missing DOMAIN_NAME fails startup)
 * - parameter key names stay optional here: their absence is reported per request
 *   by the verifier initializer, not at startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::auth::init::FailurePolicy;
use crate::services::params::ParameterKeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "production".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// How the binary receives edge events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Lambda runtime API (the deployed shape).
    Lambda,
    /// axum harness on `LOCAL_PORT` accepting events over HTTP.
    Local,
}

impl RunMode {
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("AUTHORIZER_MODE")
            .unwrap_or_else(|_| "lambda".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "lambda" => Ok(Self::Lambda),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::Invalid("AUTHORIZER_MODE")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub run_mode: RunMode,
    pub local_addr: SocketAddr,

    // CORS origin host for preflight responses
    pub domain_name: String,

    pub aws_region: Option<String>,
    pub parameter_keys: ParameterKeys,

    pub cognito_endpoint: Option<Url>,
    pub access_token_leeway_seconds: u64,
    pub jwks_refetch_cooldown: Duration,

    pub init_failure_policy: FailurePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let app_env = AppEnv::from_env();
        let run_mode = RunMode::from_env()?;

        let port: u16 = std::env::var("LOCAL_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let local_addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("LOCAL_PORT"))?;

        let domain_name = non_empty_var("DOMAIN_NAME").ok_or(ConfigError::Missing("DOMAIN_NAME"))?;

        let aws_region = non_empty_var("AWS_REGION");

        let parameter_keys = ParameterKeys {
            user_pool_id: non_empty_var("PARAM_USERPOOL_ID"),
            client_id: non_empty_var("PARAM_USERPOOL_CLIENT"),
        };

        let cognito_endpoint = non_empty_var("COGNITO_ENDPOINT")
            .map(|raw| Url::parse(&raw).map_err(|_| ConfigError::Invalid("COGNITO_ENDPOINT")))
            .transpose()?;

        let access_token_leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let jwks_refetch_cooldown = std::env::var("JWKS_REFETCH_COOLDOWN_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        // Unset keeps a failed initialization for the life of the environment.
        let init_failure_policy = std::env::var("VERIFIER_INIT_RETRY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| FailurePolicy::Retry {
                cooldown: Duration::from_secs(secs),
            })
            .unwrap_or(FailurePolicy::Permanent);

        Ok(Self {
            app_env,
            run_mode,
            local_addr,
            domain_name,
            aws_region,
            parameter_keys,
            cognito_endpoint,
            access_token_leeway_seconds,
            jwks_refetch_cooldown,
            init_failure_policy,
        })
    }
}

// Empty values count as unset, the same as a missing variable.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
