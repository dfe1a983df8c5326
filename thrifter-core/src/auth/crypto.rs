use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, Salt,
        SaltString,
    },
};
use hmac::{Hmac, Mac};
use rand::{Rng, TryRngCore, distr::Alphanumeric, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// Centralized cryptographic helper for authentication-sensitive hashing.
///
/// Two primitives live here:
/// - Argon2id for password hashing with a server-side pepper.
/// - HMAC-SHA-256 for hashing secrets that must be matched later (refresh
///   tokens, OTP codes, reset tokens) before they touch the database.
///
/// Keeping them in one place guarantees consistent parameter choices and a
/// single rotation point for the pepper and HMAC key.
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    password_pepper: Zeroizing<Vec<u8>>,
    token_hmac_key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for AuthCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCrypto").finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("password pepper must not be empty")]
    EmptyPasswordPepper,
    #[error("token HMAC key must not be empty")]
    EmptyTokenKey,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<PasswordHashError> for AuthCryptoError {
    fn from(err: PasswordHashError) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

impl AuthCrypto {
    /// Defaults target ~64 MiB memory and 3 iterations, a solid server
    /// baseline without dedicated tuning.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = Salt::RECOMMENDED_LENGTH;

    /// Length of raw refresh tokens before hashing.
    pub const REFRESH_TOKEN_LENGTH: usize = 64;
    /// Raw bytes of entropy in a password-reset token (hex-encoded on the wire).
    pub const RESET_TOKEN_BYTES: usize = 32;
    /// Digits in an email OTP code.
    pub const OTP_DIGITS: u32 = 6;

    /// Build a helper with default Argon2id parameters.
    pub fn new(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        Self::with_params(
            password_pepper,
            token_hmac_key,
            ParamsBuilder::new()
                .m_cost(Self::DEFAULT_MEMORY_KIB)
                .t_cost(Self::DEFAULT_ITERATIONS)
                .p_cost(Self::DEFAULT_PARALLELISM)
                .output_len(32)
                .build()
                .map_err(|err| AuthCryptoError::InvalidArgon2Params(err.to_string()))?,
        )
    }

    /// Build a helper with caller-specified Argon2 parameters (useful for
    /// tests or constrained environments).
    pub fn with_params(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
        params: Params,
    ) -> Result<Self, AuthCryptoError> {
        let pepper = password_pepper.as_ref();
        if pepper.is_empty() {
            return Err(AuthCryptoError::EmptyPasswordPepper);
        }

        let key = token_hmac_key.as_ref();
        if key.is_empty() {
            return Err(AuthCryptoError::EmptyTokenKey);
        }

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::default(), params);

        Ok(Self {
            argon2,
            password_pepper: Zeroizing::new(pepper.to_vec()),
            token_hmac_key: Zeroizing::new(key.to_vec()),
        })
    }

    /// Hash a password using Argon2id with a random salt and the shared
    /// pepper. The resulting PHC string is suitable for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthCryptoError> {
        let mut material =
            Zeroizing::new(Vec::with_capacity(password.len() + self.password_pepper.len()));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.password_pepper);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthCryptoError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthCryptoError::from)?;
        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    /// Verify a password against a stored hash, applying the shared pepper.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthCryptoError> {
        let parsed = PasswordHash::new(password_hash)?;

        let mut material =
            Zeroizing::new(Vec::with_capacity(password.len() + self.password_pepper.len()));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.password_pepper);

        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    /// Hash an opaque secret (refresh token, OTP code, reset token) using
    /// HMAC-SHA-256 with the configured key. The digest is returned as hex
    /// for storage and equality lookups in the database.
    pub fn hash_token(&self, token: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(&self.token_hmac_key)
            .expect("HMAC-SHA-256 accepts keys of any size");
        mac.update(token.as_bytes());

        let digest = mac.finalize().into_bytes();
        hex::encode(digest)
    }

    /// Generate a raw opaque refresh token. Only the HMAC ever persists.
    pub fn generate_refresh_token(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(Self::REFRESH_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Generate a raw password-reset token (hex) for delivery by email.
    pub fn generate_reset_token(&self) -> String {
        let mut bytes = [0u8; Self::RESET_TOKEN_BYTES];
        rand::rng().fill(&mut bytes);
        hex::encode(bytes)
    }

    /// Generate a numeric OTP code. No leading zeros, so the code is always
    /// exactly [`Self::OTP_DIGITS`] digits.
    pub fn generate_otp_code(&self) -> String {
        let min = 10u32.pow(Self::OTP_DIGITS - 1);
        let max = 10u32.pow(Self::OTP_DIGITS) - 1;
        rand::rng().random_range(min..=max).to_string()
    }
}
