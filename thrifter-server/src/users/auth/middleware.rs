//! Request authentication.
//!
//! `authenticate` validates the bearer token, loads the account and inserts
//! the [`User`] into request extensions. `require_admin` layers on top of it
//! for the admin surface.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use thrifter_core::domain::users::{Role, User};

use crate::infra::app_state::AppState;
use crate::infra::errors::AppError;

/// Validate the `Authorization: Bearer` token and attach the account to the
/// request. Rejects tokens for deactivated or deleted accounts even when the
/// signature is still valid.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::unauthorized("Missing authentication token"))?;

    let claims = state
        .jwt
        .decode(token)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    let user = state
        .auth
        .get_user(claims.sub)
        .await
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    if !user.can_authenticate() {
        return Err(AppError::forbidden("Your account has been deactivated"));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Reject non-admin callers. Must run after [`authenticate`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or_else(|| AppError::unauthorized("Missing authentication token"))?;

    if user.role != Role::Admin {
        return Err(AppError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
