/*
 * Responsibility
 * - Config読み込み → tracing / panic hook → dependency graph (AppState)
 * - start verifier initialization at cold start, before the first event arrives
 * - Lambda mode: hand events to lambda_runtime
 * - Local mode: serve the harness Router with axum::serve()
 */
use anyhow::{Context, Result};
use lambda_runtime::service_fn;
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, RunMode};
use crate::edge::ResponseTemplates;
use crate::handler;
use crate::middleware::RequestGate;
use crate::services::auth::{CognitoVerifierFactory, SharedVerifier, VerifierInitializer};
use crate::services::params::{ParameterResolver, SsmParameterStore};
use crate::state::AppState;

fn init_tracing(run_mode: RunMode) {
    // RUST_LOG wins when set. Ex:
    // RUST_LOG=debug,edge_authorizer=trace,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,edge_authorizer=info"));

    let fmt = tracing_subscriber::fmt::layer().with_target(true);

    match run_mode {
        // CloudWatch stamps every line itself and does not render colors.
        RunMode::Lambda => tracing_subscriber::registry()
            .with(filter)
            .with(fmt.with_ansi(false).without_time())
            .init(),
        RunMode::Local => tracing_subscriber::registry()
            .with(filter)
            .with(fmt)
            .init(),
    }
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    init_tracing(config.run_mode);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        app_env = ?config.app_env,
        run_mode = ?config.run_mode,
        domain_name = %config.domain_name,
        "starting edge authorizer"
    );

    let state = build_state(&config).await;

    match config.run_mode {
        RunMode::Lambda => run_lambda(state).await,
        RunMode::Local => serve_local(state, &config).await,
    }
}

/// Build the process-wide graph. The verifier attempt is spawned here, so
/// parameter lookup and key download overlap with runtime bootstrap.
pub async fn build_state(config: &Config) -> AppState {
    let templates = ResponseTemplates::new(&config.domain_name);

    let store = Arc::new(SsmParameterStore::from_env(config.aws_region.clone()).await);
    let resolver = ParameterResolver::new(store, config.parameter_keys.clone());
    let factory = Arc::new(CognitoVerifierFactory::from_config(config));

    let verifier = SharedVerifier::start(
        VerifierInitializer::new(resolver, factory),
        config.init_failure_policy,
    );
    tracing::debug!(policy = ?verifier.policy(), "verifier initialization started");

    AppState::new(RequestGate::new(verifier, templates))
}

async fn run_lambda(state: AppState) -> Result<()> {
    let state = &state;

    lambda_runtime::run(service_fn(move |event| handler::handle(state, event)))
        .await
        .map_err(|err| anyhow::anyhow!(err))
}

async fn serve_local(state: AppState, config: &Config) -> Result<()> {
    let app = api::routes(state);

    let listener = tokio::net::TcpListener::bind(config.local_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.local_addr))?;

    tracing::info!(addr = %config.local_addr, "local harness listening");

    axum::serve(listener, app).await?;
    Ok(())
}
