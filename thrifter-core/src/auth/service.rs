//! Authentication and account-management flows.
//!
//! [`AuthenticationService`] orchestrates the repository ports and
//! [`AuthCrypto`]: credential checks, the OTP email-verification gate,
//! refresh-token rotation and the password-reset lifecycle. Token signing
//! and email delivery stay in the server crate; the service hands back raw
//! secrets (OTP codes, reset tokens) for the caller to deliver.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::crypto::{AuthCrypto, AuthCryptoError};
use crate::auth::repositories::{
    EmailOtpRepository, ListUsersFilter, NewUser, OtpPurpose, PasswordResetRepository,
    RefreshTokenRepository, UniqueConflict, UserChanges, UserRepository, UserStats,
};
use crate::domain::users::{
    RegisterRequest, Role, User, ValidationError, validate_password_strength,
};

/// Tunable lifetimes and ceilings for the authentication flows.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub refresh_token_ttl: Duration,
    pub otp_ttl: Duration,
    pub otp_max_attempts: i32,
    pub otp_resend_cooldown: Duration,
    pub reset_token_ttl: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            refresh_token_ttl: Duration::days(7),
            otp_ttl: Duration::minutes(10),
            otp_max_attempts: 5,
            otp_resend_cooldown: Duration::seconds(60),
            reset_token_ttl: Duration::minutes(15),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Your account has been deactivated")]
    AccountDeactivated,
    #[error("Your account has been deleted")]
    AccountDeleted,
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("User with this phone number already exists")]
    PhoneNumberTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Email is already verified")]
    AlreadyVerified,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token has expired")]
    RefreshTokenExpired,
    #[error("OTP not found. Please request a new code.")]
    OtpNotFound,
    #[error("OTP expired. Please request a new code.")]
    OtpExpired,
    #[error("Too many attempts. Request a new code.")]
    OtpTooManyAttempts,
    #[error("Invalid OTP")]
    OtpInvalid,
    #[error("Please wait before requesting another code")]
    OtpCooldown,
    #[error("Invalid or already used token")]
    ResetTokenInvalid,
    #[error("Token expired. Please request again.")]
    ResetTokenExpired,
    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Cryptographic operation failed: {0}")]
    Crypto(#[from] AuthCryptoError),
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

type Result<T> = std::result::Result<T, AuthenticationError>;

/// A freshly issued OTP challenge. `code` is the raw digits for the email.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued opaque refresh token. Only the HMAC was persisted.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued password-reset token for the reset email.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a registration. `otp` is `None` when the account was born
/// verified (admin-created or an OTP-exempt role) and tokens may be issued
/// immediately.
#[derive(Debug)]
pub struct RegistrationOutcome {
    pub user: User,
    pub otp: Option<IssuedOtp>,
}

/// Result of a credential check.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials and verification state are good; issue tokens.
    Authenticated(User),
    /// Credentials are good but the email is unverified. `otp` carries a
    /// fresh code unless the resend cooldown is still running.
    OtpRequired { user: User, otp: Option<IssuedOtp> },
}

pub struct AuthenticationService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    email_otps: Arc<dyn EmailOtpRepository>,
    password_resets: Arc<dyn PasswordResetRepository>,
    crypto: Arc<AuthCrypto>,
    policy: AuthPolicy,
}

impl fmt::Debug for AuthenticationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AuthenticationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        email_otps: Arc<dyn EmailOtpRepository>,
        password_resets: Arc<dyn PasswordResetRepository>,
        crypto: Arc<AuthCrypto>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            email_otps,
            password_resets,
            crypto,
            policy: AuthPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AuthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    // ---- registration -----------------------------------------------------

    /// Create an account. Self-registration (`created_by_admin = false`)
    /// leaves the account unverified and issues a verification OTP unless
    /// the role is exempt from the gate.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        role: Role,
        created_by_admin: bool,
    ) -> Result<RegistrationOutcome> {
        request.validate()?;

        if let Some(conflict) = self
            .users
            .find_conflict(&request.email, &request.phone_number)
            .await?
        {
            return Err(match conflict {
                UniqueConflict::Email => AuthenticationError::EmailTaken,
                UniqueConflict::PhoneNumber => AuthenticationError::PhoneNumberTaken,
            });
        }

        let password_hash = self.crypto.hash_password(&request.password)?;
        let verified_at_birth = created_by_admin || role.bypasses_otp_gate();

        let user = self
            .users
            .insert(&NewUser {
                email: request.email.clone(),
                password_hash,
                name: request.name.clone(),
                location: request.location.clone(),
                phone_number: request.phone_number.clone(),
                role,
                is_verified: verified_at_birth,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = role.as_str(), created_by_admin, "user registered");

        let otp = if verified_at_birth {
            None
        } else {
            Some(self.issue_otp(user.id).await?)
        };

        Ok(RegistrationOutcome { user, otp })
    }

    // ---- login / tokens ---------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthenticationError::InvalidCredentials)?;

        if user.deleted_at.is_some() {
            return Err(AuthenticationError::AccountDeleted);
        }
        if !user.is_active {
            return Err(AuthenticationError::AccountDeactivated);
        }

        if !self.crypto.verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "login failed: bad password");
            return Err(AuthenticationError::InvalidCredentials);
        }

        if !user.is_verified && !user.role.bypasses_otp_gate() {
            let otp = self.reissue_otp_if_cooled(user.id).await?;
            return Ok(LoginOutcome::OtpRequired { user, otp });
        }

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "user logged in");
        Ok(LoginOutcome::Authenticated(user))
    }

    /// Mint and persist an opaque refresh token for the user.
    pub async fn issue_refresh_token(&self, user_id: Uuid) -> Result<IssuedRefreshToken> {
        let token = self.crypto.generate_refresh_token();
        let expires_at = Utc::now() + self.policy.refresh_token_ttl;

        self.refresh_tokens
            .insert(user_id, &self.crypto.hash_token(&token), expires_at)
            .await?;

        Ok(IssuedRefreshToken { token, expires_at })
    }

    /// Exchange a refresh token: the presented row is deleted and a fresh
    /// token issued, so each opaque token is usable exactly once.
    pub async fn rotate_refresh_token(&self, raw_token: &str) -> Result<(User, IssuedRefreshToken)> {
        let record = self
            .refresh_tokens
            .find_by_hash(&self.crypto.hash_token(raw_token))
            .await?
            .ok_or(AuthenticationError::InvalidRefreshToken)?;

        if record.is_expired(Utc::now()) {
            self.refresh_tokens.delete(record.id).await?;
            return Err(AuthenticationError::RefreshTokenExpired);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthenticationError::InvalidRefreshToken)?;

        if user.deleted_at.is_some() {
            return Err(AuthenticationError::AccountDeleted);
        }
        if !user.is_active {
            return Err(AuthenticationError::AccountDeactivated);
        }

        self.refresh_tokens.delete(record.id).await?;
        let rotated = self.issue_refresh_token(user.id).await?;

        Ok((user, rotated))
    }

    /// Invalidate a refresh token. Unknown tokens are a no-op so logout is
    /// idempotent.
    pub async fn logout(&self, raw_token: &str) -> Result<()> {
        let removed = self
            .refresh_tokens
            .delete_by_hash(&self.crypto.hash_token(raw_token))
            .await?;
        tracing::info!(removed, "user logged out");
        Ok(())
    }

    // ---- email verification -----------------------------------------------

    /// Issue a fresh OTP, consuming any open challenge first so only one
    /// stays active per user/purpose.
    pub async fn issue_otp(&self, user_id: Uuid) -> Result<IssuedOtp> {
        self.email_otps
            .consume_open(user_id, OtpPurpose::VerifyEmail)
            .await?;

        let code = self.crypto.generate_otp_code();
        let expires_at = Utc::now() + self.policy.otp_ttl;

        self.email_otps
            .insert(
                user_id,
                OtpPurpose::VerifyEmail,
                &self.crypto.hash_token(&code),
                expires_at,
            )
            .await?;

        Ok(IssuedOtp { code, expires_at })
    }

    /// Issue a fresh OTP unless the newest open challenge is younger than
    /// the resend cooldown.
    async fn reissue_otp_if_cooled(&self, user_id: Uuid) -> Result<Option<IssuedOtp>> {
        if let Some(open) = self
            .email_otps
            .find_latest_open(user_id, OtpPurpose::VerifyEmail)
            .await?
            && Utc::now() - open.created_at < self.policy.otp_resend_cooldown
        {
            return Ok(None);
        }

        Ok(Some(self.issue_otp(user_id).await?))
    }

    /// Explicit resend endpoint; unlike the silent login path the cooldown
    /// surfaces as an error here.
    pub async fn resend_otp(&self, email: &str) -> Result<(User, IssuedOtp)> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .filter(User::can_authenticate)
            .ok_or(AuthenticationError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthenticationError::AlreadyVerified);
        }

        let otp = self
            .reissue_otp_if_cooled(user.id)
            .await?
            .ok_or(AuthenticationError::OtpCooldown)?;

        Ok((user, otp))
    }

    /// Check a submitted code against the open challenge; success marks the
    /// account verified and purges all challenges for the purpose.
    pub async fn verify_email_otp(&self, email: &str, code: &str) -> Result<User> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .filter(User::can_authenticate)
            .ok_or(AuthenticationError::UserNotFound)?;

        let otp = self
            .email_otps
            .find_latest_open(user.id, OtpPurpose::VerifyEmail)
            .await?
            .ok_or(AuthenticationError::OtpNotFound)?;

        if otp.expires_at < Utc::now() {
            return Err(AuthenticationError::OtpExpired);
        }
        if otp.attempts >= self.policy.otp_max_attempts {
            return Err(AuthenticationError::OtpTooManyAttempts);
        }

        if self.crypto.hash_token(code.trim()) != otp.code_hash {
            self.email_otps.increment_attempts(otp.id).await?;
            return Err(AuthenticationError::OtpInvalid);
        }

        self.users.mark_verified(user.id).await?;
        self.email_otps
            .purge(user.id, OtpPurpose::VerifyEmail)
            .await?;

        tracing::info!(user_id = %user.id, "email verified");
        user.is_verified = true;
        Ok(user)
    }

    // ---- password reset ---------------------------------------------------

    /// Start a reset. Returns `None` for unknown or blocked accounts so the
    /// endpoint can answer identically either way.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<IssuedResetToken>> {
        let Some(user) = self
            .users
            .find_by_email(email)
            .await?
            .filter(User::can_authenticate)
        else {
            return Ok(None);
        };

        self.password_resets.invalidate_open(user.id).await?;

        let token = self.crypto.generate_reset_token();
        let expires_at = Utc::now() + self.policy.reset_token_ttl;

        self.password_resets
            .insert(user.id, &self.crypto.hash_token(&token), expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(Some(IssuedResetToken {
            user,
            token,
            expires_at,
        }))
    }

    /// Complete a reset: rehash the password, burn the token and revoke all
    /// refresh tokens so existing sessions must log in again.
    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<User> {
        validate_password_strength(new_password)?;

        let record = self
            .password_resets
            .find_open_by_hash(&self.crypto.hash_token(raw_token))
            .await?
            .ok_or(AuthenticationError::ResetTokenInvalid)?;

        if record.expires_at < Utc::now() {
            return Err(AuthenticationError::ResetTokenExpired);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthenticationError::UserNotFound)?;

        if user.deleted_at.is_some() {
            return Err(AuthenticationError::AccountDeleted);
        }
        if !user.is_active {
            return Err(AuthenticationError::AccountDeactivated);
        }

        let password_hash = self.crypto.hash_password(new_password)?;
        self.users.set_password_hash(user.id, &password_hash).await?;
        self.password_resets
            .mark_used_and_purge(record.id, user.id)
            .await?;
        self.refresh_tokens.delete_for_user(user.id).await?;

        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(user)
    }

    /// Authenticated password change; also revokes refresh tokens.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        validate_password_strength(new_password)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthenticationError::UserNotFound)?;

        if !self
            .crypto
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AuthenticationError::CurrentPasswordIncorrect);
        }

        let password_hash = self.crypto.hash_password(new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;
        self.refresh_tokens.delete_for_user(user_id).await?;

        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }

    // ---- account administration -------------------------------------------

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|user| user.deleted_at.is_none())
            .ok_or(AuthenticationError::UserNotFound)
    }

    pub async fn list_users(&self, filter: &ListUsersFilter) -> Result<(Vec<User>, i64)> {
        Ok(self.users.list(filter).await?)
    }

    pub async fn user_stats(&self) -> Result<UserStats> {
        Ok(self.users.stats().await?)
    }

    pub async fn update_user(&self, user_id: Uuid, changes: &UserChanges) -> Result<User> {
        self.users
            .update_profile(user_id, changes)
            .await?
            .ok_or(AuthenticationError::UserNotFound)
    }

    /// Soft-delete the account and revoke its refresh tokens.
    pub async fn soft_delete_user(&self, user_id: Uuid) -> Result<()> {
        if !self.users.soft_delete(user_id).await? {
            return Err(AuthenticationError::UserNotFound);
        }
        self.refresh_tokens.delete_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, "user soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repositories::{
        EmailOtpRecord, MockEmailOtpRepository, MockPasswordResetRepository,
        MockRefreshTokenRepository, MockUserRepository, PasswordResetRecord, RefreshTokenRecord,
    };
    use argon2::ParamsBuilder;
    use mockall::predicate::eq;

    const PASSWORD: &str = "Secur3Pass";

    fn crypto() -> Arc<AuthCrypto> {
        Arc::new(
            AuthCrypto::with_params(
                "pepper",
                "token-key",
                ParamsBuilder::new()
                    .m_cost(8)
                    .t_cost(1)
                    .p_cost(1)
                    .build()
                    .unwrap(),
            )
            .unwrap(),
        )
    }

    fn user_with(crypto: &AuthCrypto, role: Role, verified: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            password_hash: crypto.hash_password(PASSWORD).unwrap(),
            name: "Alice".into(),
            location: "Lahore".into(),
            phone_number: "+923001234567".into(),
            role,
            is_active: true,
            is_verified: verified,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    struct Mocks {
        users: MockUserRepository,
        refresh: MockRefreshTokenRepository,
        otps: MockEmailOtpRepository,
        resets: MockPasswordResetRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepository::new(),
                refresh: MockRefreshTokenRepository::new(),
                otps: MockEmailOtpRepository::new(),
                resets: MockPasswordResetRepository::new(),
            }
        }

        fn into_service(self, crypto: Arc<AuthCrypto>) -> AuthenticationService {
            AuthenticationService::new(
                Arc::new(self.users),
                Arc::new(self.refresh),
                Arc::new(self.otps),
                Arc::new(self.resets),
                crypto,
            )
        }
    }

    #[tokio::test]
    async fn login_rejects_bad_password() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, true);

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = mocks.into_service(crypto);
        let err = service.login("alice@example.com", "WrongPass1").await;
        assert!(matches!(err, Err(AuthenticationError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_rejects_deactivated_account() {
        let crypto = crypto();
        let mut user = user_with(&crypto, Role::User, true);
        user.is_active = false;

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = mocks.into_service(crypto);
        let err = service.login("alice@example.com", PASSWORD).await;
        assert!(matches!(err, Err(AuthenticationError::AccountDeactivated)));
    }

    #[tokio::test]
    async fn unverified_login_issues_otp() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, false);
        let user_id = user.id;

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .otps
            .expect_find_latest_open()
            .with(eq(user_id), eq(OtpPurpose::VerifyEmail))
            .returning(|_, _| Ok(None));
        mocks
            .otps
            .expect_consume_open()
            .with(eq(user_id), eq(OtpPurpose::VerifyEmail))
            .returning(|_, _| Ok(0));
        mocks
            .otps
            .expect_insert()
            .withf(move |uid, purpose, hash, _| {
                *uid == user_id && *purpose == OtpPurpose::VerifyEmail && hash.len() == 64
            })
            .returning(|_, _, _, _| Ok(Uuid::new_v4()));

        let service = mocks.into_service(crypto);
        match service.login("alice@example.com", PASSWORD).await.unwrap() {
            LoginOutcome::OtpRequired { otp: Some(otp), .. } => {
                assert_eq!(otp.code.len(), 6);
            }
            other => panic!("expected OtpRequired with code, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn otp_resend_respects_cooldown() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, false);
        let user_id = user.id;
        let code_hash = crypto.hash_token("123456");

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        mocks.otps.expect_find_latest_open().returning(move |_, _| {
            Ok(Some(EmailOtpRecord {
                id: Uuid::new_v4(),
                user_id,
                code_hash: code_hash.clone(),
                purpose: OtpPurpose::VerifyEmail,
                attempts: 0,
                expires_at: Utc::now() + Duration::minutes(9),
                consumed_at: None,
                created_at: Utc::now(), // just issued
            }))
        });

        let service = mocks.into_service(crypto);
        let err = service.resend_otp("alice@example.com").await;
        assert!(matches!(err, Err(AuthenticationError::OtpCooldown)));
    }

    #[tokio::test]
    async fn admin_role_bypasses_otp_gate() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::Admin, false);

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = mocks.into_service(crypto);
        assert!(matches!(
            service.login("alice@example.com", PASSWORD).await.unwrap(),
            LoginOutcome::Authenticated(_)
        ));
    }

    #[tokio::test]
    async fn verify_otp_counts_attempts_and_caps() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, false);
        let user_id = user.id;
        let good_hash = crypto.hash_token("654321");

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        let hash_for_find = good_hash.clone();
        mocks.otps.expect_find_latest_open().returning(move |_, _| {
            Ok(Some(EmailOtpRecord {
                id: Uuid::new_v4(),
                user_id,
                code_hash: hash_for_find.clone(),
                purpose: OtpPurpose::VerifyEmail,
                attempts: 5, // already at the ceiling
                expires_at: Utc::now() + Duration::minutes(5),
                consumed_at: None,
                created_at: Utc::now() - Duration::minutes(2),
            }))
        });

        let service = mocks.into_service(crypto);
        let err = service.verify_email_otp("alice@example.com", "654321").await;
        assert!(matches!(err, Err(AuthenticationError::OtpTooManyAttempts)));
    }

    #[tokio::test]
    async fn verify_otp_success_marks_verified_and_purges() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, false);
        let user_id = user.id;
        let good_hash = crypto.hash_token("654321");

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        mocks.otps.expect_find_latest_open().returning(move |_, _| {
            Ok(Some(EmailOtpRecord {
                id: Uuid::new_v4(),
                user_id,
                code_hash: good_hash.clone(),
                purpose: OtpPurpose::VerifyEmail,
                attempts: 1,
                expires_at: Utc::now() + Duration::minutes(5),
                consumed_at: None,
                created_at: Utc::now() - Duration::minutes(2),
            }))
        });
        mocks
            .users
            .expect_mark_verified()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .otps
            .expect_purge()
            .with(eq(user_id), eq(OtpPurpose::VerifyEmail))
            .times(1)
            .returning(|_, _| Ok(1));

        let service = mocks.into_service(crypto);
        // Submitted codes are trimmed before hashing.
        let verified = service
            .verify_email_otp("alice@example.com", " 654321 ")
            .await
            .unwrap();
        assert!(verified.is_verified);
    }

    #[tokio::test]
    async fn refresh_rotation_burns_the_old_token() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, true);
        let user_id = user.id;
        let raw = crypto.generate_refresh_token();
        let stored_hash = crypto.hash_token(&raw);
        let record_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        let hash_for_find = stored_hash.clone();
        mocks
            .refresh
            .expect_find_by_hash()
            .withf(move |h| h == hash_for_find)
            .returning(move |hash| {
                Ok(Some(RefreshTokenRecord {
                    id: record_id,
                    user_id,
                    token_hash: hash.to_string(),
                    expires_at: Utc::now() + Duration::days(3),
                    created_at: Utc::now() - Duration::days(4),
                }))
            });
        mocks
            .users
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .refresh
            .expect_delete()
            .with(eq(record_id))
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .refresh
            .expect_insert()
            .times(1)
            .returning(|_, _, _| Ok(Uuid::new_v4()));

        let service = mocks.into_service(crypto);
        let (rotated_user, rotated) = service.rotate_refresh_token(&raw).await.unwrap();
        assert_eq!(rotated_user.id, user_id);
        assert_ne!(rotated.token, raw);
    }

    #[tokio::test]
    async fn expired_refresh_token_is_deleted_and_rejected() {
        let crypto = crypto();
        let record_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        mocks.refresh.expect_find_by_hash().returning(move |hash| {
            Ok(Some(RefreshTokenRecord {
                id: record_id,
                user_id: Uuid::new_v4(),
                token_hash: hash.to_string(),
                expires_at: Utc::now() - Duration::hours(1),
                created_at: Utc::now() - Duration::days(8),
            }))
        });
        mocks
            .refresh
            .expect_delete()
            .with(eq(record_id))
            .times(1)
            .returning(|_| Ok(()));

        let service = mocks.into_service(crypto);
        let err = service.rotate_refresh_token("whatever").await;
        assert!(matches!(err, Err(AuthenticationError::RefreshTokenExpired)));
    }

    #[tokio::test]
    async fn reset_password_revokes_refresh_tokens() {
        let crypto = crypto();
        let user = user_with(&crypto, Role::User, true);
        let user_id = user.id;
        let raw = crypto.generate_reset_token();
        let record_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        mocks.resets.expect_find_open_by_hash().returning(move |hash| {
            Ok(Some(PasswordResetRecord {
                id: record_id,
                user_id,
                token_hash: hash.to_string(),
                expires_at: Utc::now() + Duration::minutes(10),
                used_at: None,
                created_at: Utc::now(),
            }))
        });
        mocks
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .users
            .expect_set_password_hash()
            .times(1)
            .returning(|_, _| Ok(()));
        mocks
            .resets
            .expect_mark_used_and_purge()
            .with(eq(record_id), eq(user_id))
            .times(1)
            .returning(|_, _| Ok(()));
        mocks
            .refresh
            .expect_delete_for_user()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(2));

        let service = mocks.into_service(crypto);
        service.reset_password(&raw, "N3wSecret").await.unwrap();
    }

    #[tokio::test]
    async fn forgot_password_is_silent_for_unknown_email() {
        let crypto = crypto();
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));

        let service = mocks.into_service(crypto);
        assert!(
            service
                .request_password_reset("ghost@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let crypto = crypto();
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_conflict()
            .returning(|_, _| Ok(Some(UniqueConflict::Email)));

        let service = mocks.into_service(crypto);
        let request = RegisterRequest {
            email: "alice@example.com".into(),
            password: PASSWORD.into(),
            name: "Alice".into(),
            location: "Lahore".into(),
            phone_number: "+923001234567".into(),
        };
        let err = service.register(&request, Role::User, false).await;
        assert!(matches!(err, Err(AuthenticationError::EmailTaken)));
    }
}
