//! Authentication: credential hashing, OTP email verification, refresh-token
//! rotation and the password-reset lifecycle.

pub mod crypto;
pub mod repositories;
pub mod service;

pub use crypto::{AuthCrypto, AuthCryptoError};
pub use repositories::{
    ContactFilter, ContactRepository, EmailOtpRecord, EmailOtpRepository, ListUsersFilter, NewUser,
    OtpPurpose, PasswordResetRecord, PasswordResetRepository, RefreshTokenRecord,
    RefreshTokenRepository, UniqueConflict, UserChanges, UserRepository, UserStats,
};
pub use service::{
    AuthPolicy, AuthenticationError, AuthenticationService, IssuedOtp, IssuedRefreshToken,
    IssuedResetToken, LoginOutcome, RegistrationOutcome,
};
