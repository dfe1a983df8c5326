use axum::http::StatusCode;

use thrifter_core::auth::AuthenticationError;
use thrifter_core::domain::users::ValidationError;

use crate::infra::errors::AppError;

#[test]
fn credential_failures_map_to_401() {
    for err in [
        AuthenticationError::InvalidCredentials,
        AuthenticationError::InvalidRefreshToken,
        AuthenticationError::RefreshTokenExpired,
        AuthenticationError::CurrentPasswordIncorrect,
    ] {
        assert_eq!(AppError::from(err).status, StatusCode::UNAUTHORIZED);
    }
}

#[test]
fn blocked_accounts_map_to_403() {
    for err in [
        AuthenticationError::AccountDeactivated,
        AuthenticationError::AccountDeleted,
    ] {
        assert_eq!(AppError::from(err).status, StatusCode::FORBIDDEN);
    }
}

#[test]
fn uniqueness_conflicts_map_to_409() {
    for err in [
        AuthenticationError::EmailTaken,
        AuthenticationError::PhoneNumberTaken,
    ] {
        assert_eq!(AppError::from(err).status, StatusCode::CONFLICT);
    }
}

#[test]
fn rate_limits_map_to_429() {
    for err in [
        AuthenticationError::OtpTooManyAttempts,
        AuthenticationError::OtpCooldown,
    ] {
        assert_eq!(AppError::from(err).status, StatusCode::TOO_MANY_REQUESTS);
    }
}

#[test]
fn otp_and_reset_failures_map_to_400() {
    for err in [
        AuthenticationError::OtpNotFound,
        AuthenticationError::OtpExpired,
        AuthenticationError::OtpInvalid,
        AuthenticationError::ResetTokenInvalid,
        AuthenticationError::ResetTokenExpired,
        AuthenticationError::AlreadyVerified,
        AuthenticationError::Validation(ValidationError::PasswordTooShort),
    ] {
        assert_eq!(AppError::from(err).status, StatusCode::BAD_REQUEST);
    }
}

#[test]
fn internal_errors_hide_details() {
    let err = AppError::from(AuthenticationError::Database(anyhow::anyhow!(
        "connection refused to db at 10.0.0.5"
    )));
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!err.message.contains("10.0.0.5"));
}

#[test]
fn error_body_carries_status_and_message() {
    let err = AppError::not_found("User not found");
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "User not found");
}
