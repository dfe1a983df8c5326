//! Authentication endpoints: registration, login, token refresh, OTP email
//! verification and the password lifecycle.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use thrifter_core::ApiResponse;
use thrifter_core::auth::{LoginOutcome, UserChanges};
use thrifter_core::domain::users::{
    LoginRequest, RegisterRequest, Role, UpdateUserRequest, User, UserProfile,
};

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::mailer::{Mailer, templates};

#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: AuthTokens,
}

/// Registration response. `tokens` is absent while email verification is
/// still pending.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<AuthTokens>,
    pub otp_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

async fn issue_tokens(state: &AppState, user: &User) -> Result<AuthTokens, AppError> {
    let access_token = state.jwt.sign(user)?;
    let refresh = state.auth.issue_refresh_token(user.id).await?;

    Ok(AuthTokens {
        access_token,
        refresh_token: refresh.token,
        token_type: "Bearer",
        expires_in: state.jwt.access_ttl_secs(),
    })
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegistrationResponse>>)> {
    let outcome = state.auth.register(&request, Role::User, false).await?;

    let (tokens, message) = match outcome.otp {
        Some(otp) => {
            let ttl = state.config.auth.otp_ttl_minutes;
            state
                .mailer
                .send(templates::verification_otp(
                    &outcome.user.email,
                    &outcome.user.name,
                    &otp.code,
                    ttl,
                ))
                .await?;
            (None, "Verification code sent to your email")
        }
        None => (
            Some(issue_tokens(&state, &outcome.user).await?),
            "Account created",
        ),
    };

    let otp_required = tokens.is_none();
    let body = ApiResponse::success(RegistrationResponse {
        user: outcome.user.profile(),
        tokens,
        otp_required,
    })
    .with_message(message.to_string());

    Ok((StatusCode::CREATED, Json(body)))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    request.validate()?;

    match state.auth.login(&request.email, &request.password).await? {
        LoginOutcome::Authenticated(user) => {
            let tokens = issue_tokens(&state, &user).await?;
            Ok(Json(ApiResponse::success(serde_json::json!({
                "user": user.profile(),
                "tokens": tokens,
            }))))
        }
        LoginOutcome::OtpRequired { user, otp } => {
            if let Some(otp) = otp {
                state
                    .mailer
                    .send(templates::verification_otp(
                        &user.email,
                        &user.name,
                        &otp.code,
                        state.config.auth.otp_ttl_minutes,
                    ))
                    .await?;
            }

            Ok(Json(
                ApiResponse::success(serde_json::json!({
                    "otp_required": true,
                    "email": user.email,
                }))
                .with_message("Please verify your email. A code has been sent.".to_string()),
            ))
        }
    }
}

/// `POST /auth/refresh`. Rotates the refresh token; the presented token is
/// burned whether or not a new pair is issued.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let (user, refresh) = state
        .auth
        .rotate_refresh_token(&request.refresh_token)
        .await?;

    let access_token = state.jwt.sign(&user)?;
    let tokens = AuthTokens {
        access_token,
        refresh_token: refresh.token,
        token_type: "Bearer",
        expires_in: state.jwt.access_ttl_secs(),
    };

    Ok(Json(ApiResponse::success(AuthResponse {
        user: user.profile(),
        tokens,
    })))
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth.logout(&request.refresh_token).await?;
    Ok(Json(
        ApiResponse::success(()).with_message("Logged out".to_string()),
    ))
}

/// `GET /auth/me`
pub async fn get_current_user(
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    Ok(Json(ApiResponse::success(user.profile())))
}

/// `PUT /auth/me`. Self-service profile update. Role and activation
/// changes are rejected here; those belong to the admin surface.
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    request.validate()?;
    if request.requires_admin() {
        return Err(AppError::forbidden(
            "Only admins can change roles or activation",
        ));
    }

    let changes = UserChanges {
        name: request.name,
        location: request.location,
        phone_number: request.phone_number,
        role: None,
        is_active: None,
    };

    let updated = state.auth.update_user(user.id, &changes).await?;
    Ok(Json(
        ApiResponse::success(updated.profile()).with_message("Profile updated".to_string()),
    ))
}

/// `POST /auth/verify-otp`. Verifies the email and signs the user in.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let user = state
        .auth
        .verify_email_otp(&request.email, &request.code)
        .await?;

    let tokens = issue_tokens(&state, &user).await?;
    tracing::info!(user_id = %user.id, "email verified");

    Ok(Json(
        ApiResponse::success(AuthResponse {
            user: user.profile(),
            tokens,
        })
        .with_message("Email verified".to_string()),
    ))
}

/// `POST /auth/resend-otp`
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(request): Json<ResendOtpRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let (user, otp) = state.auth.resend_otp(&request.email).await?;

    state
        .mailer
        .send(templates::verification_otp(
            &user.email,
            &user.name,
            &otp.code,
            state.config.auth.otp_ttl_minutes,
        ))
        .await?;

    Ok(Json(
        ApiResponse::success(()).with_message("Verification code sent".to_string()),
    ))
}

/// `POST /auth/forgot-password`. Always answers 200 so the endpoint cannot
/// be used to probe which emails are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    if let Some(issued) = state.auth.request_password_reset(&request.email).await? {
        let email = templates::password_reset(
            &issued.user.email,
            &issued.user.name,
            &state.config.email.frontend_url,
            &issued.token,
        );
        if let Err(err) = state.mailer.send(email).await {
            tracing::error!(error = ?err, "failed to send password-reset email");
        }
    }

    Ok(Json(ApiResponse::success(()).with_message(
        "If that email is registered, a reset link has been sent".to_string(),
    )))
}

/// `POST /auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let user = state
        .auth
        .reset_password(&request.token, &request.new_password)
        .await?;
    tracing::info!(user_id = %user.id, "password reset completed");

    Ok(Json(ApiResponse::success(()).with_message(
        "Password updated. Please log in with your new password.".to_string(),
    )))
}

/// `POST /auth/change-password` (authenticated)
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .auth
        .change_password(user.id, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(ApiResponse::success(()).with_message(
        "Password changed. Other sessions have been logged out.".to_string(),
    )))
}
