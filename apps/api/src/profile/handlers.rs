//! Axum route handlers for the Profile API, mounted under `/api/profile`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::JsonBody;
use crate::models::profile::Profile;
use crate::profile::validation::{
    check, AddEducationRequest, AddExperienceRequest, UpsertProfileRequest,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

/// GET /api/profile/me
pub async fn handle_get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .find_by_owner(auth.id)
        .await?
        .ok_or_else(AppError::no_profile)?;
    Ok(Json(profile))
}

/// POST /api/profile
///
/// Creates the caller's profile, or merges the supplied fields into it.
pub async fn handle_upsert_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<UpsertProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    check(&req)?;
    let upserted = state.profiles.upsert(auth.id, req.into_fields()).await?;
    if upserted.created {
        info!("Created profile {} for user {}", upserted.profile.id, auth.id);
    } else {
        info!("Updated profile {} for user {}", upserted.profile.id, auth.id);
    }
    Ok(Json(upserted.profile))
}

/// GET /api/profile
pub async fn handle_list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile>>, AppError> {
    Ok(Json(state.profiles.find_all().await?))
}

/// GET /api/profile/user/:user_id
pub async fn handle_get_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::NotFound("Profile not found.".to_string()))?;

    let profile = state
        .profiles
        .find_by_owner(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No profile for this user".to_string()))?;
    Ok(Json(profile))
}

/// DELETE /api/profile
///
/// Removes the caller's posts, profile and account, in that order.
pub async fn handle_delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = state.profiles.delete_account(auth.id).await?;
    info!(
        "Deleted user {}: {} post(s), {} profile(s), {} account(s)",
        auth.id, removed.posts, removed.profiles, removed.users
    );
    Ok(Json(MessageResponse {
        msg: "User deleted",
    }))
}

/// PUT /api/profile/experience
pub async fn handle_add_experience(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<AddExperienceRequest>,
) -> Result<Json<Profile>, AppError> {
    check(&req)?;
    let entry = req.into_entry()?;
    let entry_id = entry.id;

    let profile = state
        .profiles
        .prepend_experience(auth.id, entry)
        .await?
        .ok_or_else(AppError::no_profile)?;

    info!("Added experience {entry_id} to profile {}", profile.id);
    Ok(Json(profile))
}

/// DELETE /api/profile/experience/:exp_id
///
/// An id that matches no entry leaves the profile unchanged.
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(exp_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = match Uuid::parse_str(&exp_id) {
        Ok(exp_id) => state.profiles.remove_experience(auth.id, exp_id).await?,
        Err(_) => state.profiles.find_by_owner(auth.id).await?,
    };
    Ok(Json(profile.ok_or_else(AppError::no_profile)?))
}

/// PUT /api/profile/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<AddEducationRequest>,
) -> Result<Json<Profile>, AppError> {
    check(&req)?;
    let entry = req.into_entry();
    let entry_id = entry.id;

    let profile = state
        .profiles
        .prepend_education(auth.id, entry)
        .await?
        .ok_or_else(AppError::no_profile)?;

    info!("Added education {entry_id} to profile {}", profile.id);
    Ok(Json(profile))
}

/// DELETE /api/profile/education/:edu_id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(edu_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = match Uuid::parse_str(&edu_id) {
        Ok(edu_id) => state.profiles.remove_education(auth.id, edu_id).await?,
        Err(_) => state.profiles.find_by_owner(auth.id).await?,
    };
    Ok(Json(profile.ok_or_else(AppError::no_profile)?))
}

/// GET /api/profile/github/:username
///
/// Returns the GitHub repo list as GitHub sent it.
pub async fn handle_github_repos(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.github.list_repos(&username).await?))
}
