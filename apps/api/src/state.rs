use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::github::GithubClient;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Profile persistence. Postgres in production, swapped for an in-memory store in tests.
    pub profiles: Arc<dyn ProfileStore>,
    pub github: GithubClient,
    pub tokens: TokenVerifier,
}
