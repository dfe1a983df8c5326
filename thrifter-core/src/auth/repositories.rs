//! Repository ports for the authentication and user-management flows.
//!
//! Every trait returns `anyhow::Result`; the Postgres implementations live
//! in [`crate::database`]. The traits are mockable so the service layer can
//! be tested without a database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::domain::contact::{Contact, NewContact};
use crate::domain::users::{Role, User};

/// Insert payload for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub role: Role,
    pub is_verified: bool,
}

/// Profile fields an update may touch. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Which unique column an insert would collide with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConflict {
    Email,
    PhoneNumber,
}

/// Admin listing filter. Soft-deleted rows are always excluded.
#[derive(Debug, Clone, Default)]
pub struct ListUsersFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring match against name and email.
    pub search: Option<String>,
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub verified: i64,
    pub users: i64,
    pub admins: i64,
    pub drivers: i64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Check email/phone uniqueness in one round trip; email wins when both
    /// collide so the error message stays deterministic.
    async fn find_conflict(&self, email: &str, phone_number: &str)
    -> Result<Option<UniqueConflict>>;
    async fn insert(&self, user: &NewUser) -> Result<User>;
    async fn update_profile(&self, user_id: Uuid, changes: &UserChanges) -> Result<Option<User>>;
    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<()>;
    async fn mark_verified(&self, user_id: Uuid) -> Result<()>;
    /// Stamp `deleted_at`; returns false when the row is missing or already
    /// deleted.
    async fn soft_delete(&self, user_id: Uuid) -> Result<bool>;
    async fn list(&self, filter: &ListUsersFilter) -> Result<(Vec<User>, i64)>;
    async fn stats(&self) -> Result<UserStats>;
}

/// A stored refresh token. Only the HMAC of the opaque token persists.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;
    async fn delete(&self, token_id: Uuid) -> Result<()>;
    async fn delete_by_hash(&self, token_hash: &str) -> Result<u64>;
    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64>;
}

/// What an email OTP proves once verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "otp_purpose", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpPurpose {
    VerifyEmail,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "VERIFY_EMAIL",
        }
    }
}

/// A stored OTP challenge. The code itself is HMAC-hashed.
#[derive(Debug, Clone)]
pub struct EmailOtpRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub purpose: OtpPurpose,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmailOtpRepository: Send + Sync {
    /// Mark all open challenges consumed; called before issuing a new one so
    /// at most one stays active per (user, purpose).
    async fn consume_open(&self, user_id: Uuid, purpose: OtpPurpose) -> Result<u64>;
    async fn insert(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid>;
    async fn find_latest_open(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
    ) -> Result<Option<EmailOtpRecord>>;
    async fn increment_attempts(&self, otp_id: Uuid) -> Result<()>;
    /// Delete every challenge for the user/purpose after a successful
    /// verification.
    async fn purge(&self, user_id: Uuid, purpose: OtpPurpose) -> Result<u64>;
}

/// A stored password-reset token. The raw token is only ever emailed.
#[derive(Debug, Clone)]
pub struct PasswordResetRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    /// Mark all open tokens used; called before issuing a fresh one.
    async fn invalidate_open(&self, user_id: Uuid) -> Result<u64>;
    async fn insert(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid>;
    /// Look up an unused token by hash.
    async fn find_open_by_hash(&self, token_hash: &str) -> Result<Option<PasswordResetRecord>>;
    /// Mark the winning token used and delete the user's other tokens.
    async fn mark_used_and_purge(&self, token_id: Uuid, user_id: Uuid) -> Result<()>;
}

/// Day-granular window for the admin contact listing.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn insert(&self, contact: &NewContact) -> Result<Contact>;
    async fn list(&self, filter: &ContactFilter) -> Result<(Vec<Contact>, i64)>;
}
