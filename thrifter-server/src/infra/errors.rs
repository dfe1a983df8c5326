use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use thrifter_core::auth::AuthenticationError;
use thrifter_core::domain::contact::ContactValidationError;
use thrifter_core::domain::users::ValidationError;
use thrifter_core::error::CoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "error",
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthenticationError> for AppError {
    fn from(err: AuthenticationError) -> Self {
        use AuthenticationError as E;
        let message = err.to_string();
        match err {
            E::InvalidCredentials | E::InvalidRefreshToken | E::RefreshTokenExpired => {
                Self::unauthorized(message)
            }
            E::CurrentPasswordIncorrect => Self::unauthorized(message),
            E::AccountDeactivated | E::AccountDeleted => Self::forbidden(message),
            E::EmailTaken | E::PhoneNumberTaken => Self::conflict(message),
            E::UserNotFound => Self::not_found(message),
            E::OtpTooManyAttempts | E::OtpCooldown => Self::rate_limited(message),
            E::AlreadyVerified
            | E::OtpNotFound
            | E::OtpExpired
            | E::OtpInvalid
            | E::ResetTokenInvalid
            | E::ResetTokenExpired
            | E::Validation(_) => Self::bad_request(message),
            E::Crypto(_) => Self::internal("Cryptographic operation failed"),
            E::Database(err) => {
                tracing::error!(error = ?err, "database operation failed");
                Self::internal("Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ContactValidationError> for AppError {
    fn from(err: ContactValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => Self::not_found(msg),
            CoreError::Conflict(msg) => Self::conflict(msg),
            other => {
                tracing::error!(error = ?other, "core operation failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<crate::mailer::MailerError> for AppError {
    fn from(err: crate::mailer::MailerError) -> Self {
        tracing::error!(error = ?err, "outbound email failed");
        Self::internal("Failed to send email")
    }
}

impl From<crate::users::auth::jwt::JwtError> for AppError {
    fn from(err: crate::users::auth::jwt::JwtError) -> Self {
        tracing::error!(error = ?err, "access token signing failed");
        Self::internal("Failed to issue access token")
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "unhandled internal error");
        Self::internal("Internal server error")
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "database operation failed");
        Self::internal("Database operation failed")
    }
}
