/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (security headers / CORS / HTTP 共通)
 * - axum::serve() で起動 (peer address 識別のため ConnectInfo 付き)
 */
use std::{net::SocketAddr, panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, http::HeaderName, routing::get};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, IdentifierSource};
use crate::middleware::{
    self, Pipeline,
    auth::{IdentifyBy, PrincipalRoles},
};
use crate::repos::user_repo::{MemoryUserRepo, PgUserRepo, UserRepo};
use crate::services::auth::{AccountService, build_auth, clock::SystemClock};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,tollgate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default hook, server keeps running.
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
        scheme = ?config.token_scheme,
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let db = match config.database_url.as_deref() {
        Some(url) => Some(connect_db(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            None
        }
    };

    let state = build_state(&config, db.as_ref()).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn connect_db(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .context("failed to connect to postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(pool)
}

pub async fn build_state(config: &Config, db: Option<&PgPool>) -> Result<AppState> {
    let auth = build_auth(config, db, Arc::new(SystemClock)).await?;

    let users: Arc<dyn UserRepo> = match db {
        Some(db) => Arc::new(PgUserRepo::new(db.clone())),
        None => Arc::new(MemoryUserRepo::new()),
    };
    let accounts = Arc::new(AccountService::new(users, auth.credentials));

    let identify_by = match &config.identifier_source {
        IdentifierSource::Header(name) => IdentifyBy::Header(
            HeaderName::try_from(name.as_str()).context("AUTH_HEADER is not a valid header name")?,
        ),
        IdentifierSource::PeerAddress => IdentifyBy::PeerAddress,
    };

    let pipeline = Pipeline::new(
        identify_by,
        auth.resolver,
        Arc::new(PrincipalRoles),
        config.resolve_timeout,
    );

    Ok(AppState::new(accounts, pipeline))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}
