pub mod health;

use axum::{
    routing::{delete, get, put},
    Router,
};

use crate::profile::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/profile", profile_routes())
        .with_state(state)
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::handle_list_profiles)
                .post(handlers::handle_upsert_profile)
                .delete(handlers::handle_delete_account),
        )
        .route("/me", get(handlers::handle_get_me))
        .route("/user/:user_id", get(handlers::handle_get_by_user))
        .route("/experience", put(handlers::handle_add_experience))
        .route(
            "/experience/:exp_id",
            delete(handlers::handle_delete_experience),
        )
        .route("/education", put(handlers::handle_add_education))
        .route(
            "/education/:edu_id",
            delete(handlers::handle_delete_education),
        )
        .route("/github/:username", get(handlers::handle_github_repos))
}
