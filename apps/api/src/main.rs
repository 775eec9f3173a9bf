mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod github;
mod models;
mod profile;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::github::GithubClient;
use crate::profile::store::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Profile API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize GitHub client
    let github = GithubClient::new(
        &config.github_api_url,
        &config.github_user_agent,
        config.github_token.clone(),
    )?;
    info!(
        "GitHub client initialized ({}, {})",
        config.github_api_url,
        if config.github_token.is_some() {
            "authenticated"
        } else {
            "anonymous"
        }
    );

    let state = AppState {
        profiles: Arc::new(PgProfileStore::new(db)),
        github,
        tokens: TokenVerifier::new(&config.jwt_secret),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
