/*
 * Responsibility
 * - Config → 協調オブジェクト (verifier, user directory) → Router
 * - HTTP middleware と interceptor chain の組み込み
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::{ClaimVerifier, JwtClaimVerifier};
use crate::services::users::{InMemoryUserDirectory, PgUserDirectory, UserDirectory};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,request_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting {} in {:?} mode on {}",
        config.gate.service_name,
        config.app_env,
        config.addr
    );

    let max_body_bytes = config.max_body_bytes;
    let addr = config.addr;
    let state = build_state(config).await?;
    let app = build_router(state, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: Config) -> Result<AppState> {
    // Process-level collaborators, shared read-only by every call.
    let verifier: Arc<dyn ClaimVerifier> = Arc::new(JwtClaimVerifier::new(
        config.service_token_secret.as_bytes(),
        config.user_token_secret.as_bytes(),
        config.token_leeway_seconds,
    ));

    let users: Arc<dyn UserDirectory> = match config.database_url.as_deref() {
        Some(url) => {
            let db = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            Arc::new(PgUserDirectory::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory user directory");
            Arc::new(InMemoryUserDirectory::default())
        }
    };

    Ok(AppState::new(config.gate, verifier, users))
}

/// Full router: `/health` outside the chain, RPC routes behind it, HTTP layers around all.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .merge(api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(router, max_body_bytes)
}
