//! User accounts, roles and request validation
//!
//! ## Account lifecycle
//!
//! 1. **Registration**: self-registered accounts start unverified and must
//!    prove email ownership with a one-time code before tokens are issued.
//! 2. **Login**: credentials are verified; unverified accounts get a fresh
//!    code instead of tokens. `Admin` and `Driver` accounts bypass the gate.
//! 3. **Soft delete**: accounts are never removed, only stamped with
//!    `deleted_at`, which blocks login and token refresh.
//!
//! Passwords are hashed with Argon2id before they reach this type; the hash
//! is excluded from serialization so it can never leak through a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role, stored as a Postgres enum.
///
/// `Driver` is an operational staff role: like `Admin` it skips the email
/// verification gate, but it carries no administrative rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
    Driver,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Driver => "DRIVER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            "DRIVER" => Some(Self::Driver),
            _ => None,
        }
    }

    /// Roles that may log in without completing email verification.
    pub fn bypasses_otp_gate(&self) -> bool {
        matches!(self, Self::Admin | Self::Driver)
    }
}

/// A registered account row.
///
/// The password hash never serializes; handlers return [`UserProfile`]
/// projections instead of this type wherever possible.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete stamp; a populated value blocks login and refresh.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account may authenticate at all.
    pub fn can_authenticate(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            phone_number: self.phone_number.clone(),
            role: self.role,
            is_active: self.is_active,
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Password-free projection of a [`User`] safe to return from any endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request payload
///
/// # Example
///
/// ```json
/// {
///   "email": "alice@example.com",
///   "password": "Secur3Pass",
///   "name": "Alice Smith",
///   "location": "Lahore",
///   "phone_number": "+923001234567"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_password_strength(&self.password)?;
        validate_phone_number(&self.phone_number)?;

        if self.name.trim().len() < 2 {
            return Err(ValidationError::NameTooShort);
        }
        if self.location.trim().len() < 2 {
            return Err(ValidationError::LocationTooShort);
        }

        Ok(())
    }
}

/// Login request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        if self.password.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(())
    }
}

/// Profile update payload. Every field is optional; role and activation
/// changes are rejected upstream unless the caller is an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name
            && name.trim().len() < 2
        {
            return Err(ValidationError::NameTooShort);
        }
        if let Some(location) = &self.location
            && location.trim().len() < 2
        {
            return Err(ValidationError::LocationTooShort);
        }
        if let Some(phone) = &self.phone_number {
            validate_phone_number(phone)?;
        }
        Ok(())
    }

    /// Whether the update touches fields only admins may change.
    pub fn requires_admin(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

/// Validation errors for user input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,

    #[error("Password must contain an uppercase letter, a lowercase letter and a digit")]
    PasswordTooWeak,

    #[error("Invalid phone number format")]
    InvalidPhoneNumber,

    #[error("Name must be at least 2 characters long")]
    NameTooShort,

    #[error("Location must be at least 2 characters long")]
    LocationTooShort,
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// domain containing a dot. Deliverability is proven by the OTP email.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Password policy: minimum 8 chars with at least one uppercase, one
/// lowercase and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.len() < 8 {
        return Err(ValidationError::PasswordTooShort);
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_upper && has_lower && has_digit) {
        return Err(ValidationError::PasswordTooWeak);
    }

    Ok(())
}

/// E.164-ish phone validation after stripping separators: optional `+`,
/// leading digit 1-9, 2-15 digits total.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if digits.len() < 2
        || digits.len() > 15
        || !digits.chars().all(|c| c.is_ascii_digit())
        || digits.starts_with('0')
    {
        return Err(ValidationError::InvalidPhoneNumber);
    }

    Ok(())
}
