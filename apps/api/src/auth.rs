//! Caller authentication.
//!
//! Tokens are HS256 JWTs carrying `{"user": {"id": <uuid>}, "exp": ..}`, sent
//! either in `x-auth-token` or as `Authorization: Bearer <token>`. Handlers that
//! take an [`AuthUser`] argument never run for unauthenticated callers.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const TOKEN_HEADER: &str = "x-auth-token";

const NO_TOKEN: &str = "No token, authorization denied";
const INVALID_TOKEN: &str = "Token is not valid";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: Uuid,
}

/// Verifies caller tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Validation::default(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

/// The authenticated caller, resolved from the request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_string()))?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!("Rejected token: {e}");
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

        Ok(AuthUser {
            id: claims.user.id,
        })
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Signs a token for `user_id`, the way the login flow does.
#[cfg(test)]
pub fn issue_token(secret: &str, user_id: Uuid, ttl: chrono::Duration) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        user: ClaimsUser { id: user_id },
        exp: (chrono::Utc::now() + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
