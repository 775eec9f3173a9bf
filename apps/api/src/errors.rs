use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Body text of every 500 response. Clients only ever see this string;
/// the underlying cause is logged server-side.
pub const SERVER_ERROR_BODY: &str = "Server Error";

/// One failed validation rule, in the shape existing clients already parse.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub msg: String,
    pub param: String,
    pub location: &'static str,
}

impl FieldError {
    pub fn body(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            param: param.into(),
            location: "body",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Missing profile or unusable identifier. Answered with 400, not 404.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No Github profile found")]
    GithubNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("GitHub error: {0}")]
    Github(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn no_profile() -> Self {
        AppError::NotFound("There is no profile for this user".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "msg": msg }))).into_response()
            }
            AppError::GithubNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "msg": "No Github profile found" })),
            )
                .into_response(),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "msg": msg }))).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                server_error()
            }
            AppError::Github(msg) => {
                tracing::error!("GitHub error: {msg}");
                server_error()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                server_error()
            }
        }
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
}
