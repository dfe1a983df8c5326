//! Admin user management plus the owner-or-admin profile update.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use thrifter_core::ApiResponse;
use thrifter_core::api_types::Page;
use thrifter_core::auth::{ListUsersFilter, UserChanges, UserStats};
use thrifter_core::domain::users::{RegisterRequest, Role, UpdateUserRequest, User, UserProfile};

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::mailer::{Mailer, templates};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    #[serde(default)]
    pub role: Role,
}

fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// `GET /users` (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<ApiResponse<Page<UserProfile>>>> {
    let role = match query.role.as_deref() {
        Some(raw) => Some(
            Role::parse(&raw.to_ascii_uppercase())
                .ok_or_else(|| AppError::bad_request(format!("Unknown role: {raw}")))?,
        ),
        None => None,
    };

    let (limit, offset) = clamp_page(query.limit, query.offset);
    let filter = ListUsersFilter {
        role,
        search: query.search.filter(|s| !s.trim().is_empty()),
        include_inactive: query.include_inactive,
        limit,
        offset,
    };

    let (users, total) = state.auth.list_users(&filter).await?;
    let items = users.iter().map(User::profile).collect();

    Ok(Json(ApiResponse::success(Page {
        total,
        limit,
        offset,
        items,
    })))
}

/// `GET /users/stats` (admin)
pub async fn user_stats(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    Ok(Json(ApiResponse::success(state.auth.user_stats().await?)))
}

/// `POST /users` (admin). The account is born verified and the credentials
/// are emailed to its owner.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let register = RegisterRequest {
        email: request.email,
        password: request.password.clone(),
        name: request.name,
        location: request.location,
        phone_number: request.phone_number,
    };

    let outcome = state.auth.register(&register, request.role, true).await?;

    let email = templates::admin_created_account(
        &outcome.user.email,
        &outcome.user.name,
        &request.password,
    );
    if let Err(err) = state.mailer.send(email).await {
        tracing::error!(error = ?err, user_id = %outcome.user.id, "failed to send credentials email");
    }

    tracing::info!(user_id = %outcome.user.id, role = %outcome.user.role.as_str(), "admin created user");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(outcome.user.profile())
                .with_message("User created".to_string()),
        ),
    ))
}

/// `GET /users/{id}` (admin)
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let user = state.auth.get_user(user_id).await?;
    Ok(Json(ApiResponse::success(user.profile())))
}

/// `PUT /users/{id}` (admin). May change any profile field including role
/// and activation; self-service edits go through `PUT /auth/me`.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    request.validate()?;

    let changes = UserChanges {
        name: request.name,
        location: request.location,
        phone_number: request.phone_number,
        role: request.role,
        is_active: request.is_active,
    };

    let user = state.auth.update_user(user_id, &changes).await?;
    Ok(Json(
        ApiResponse::success(user.profile()).with_message("User updated".to_string()),
    ))
}

/// `DELETE /users/{id}` (admin). Soft delete; the row survives but every
/// session is revoked.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    if caller.id == user_id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    state.auth.soft_delete_user(user_id).await?;
    Ok(Json(
        ApiResponse::success(()).with_message("User deleted".to_string()),
    ))
}
