//! Layered configuration: optional `thrifter.toml`, then `THRIFTER__*`
//! environment overrides, plus the conventional bare variables
//! (`DATABASE_URL`, `JWT_SECRET`, `SENDGRID_API_KEY`, `PORT`) that
//! deployment platforms inject.

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use thrifter_core::auth::AuthPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,
    #[serde(default = "default_otp_ttl_minutes")]
    pub otp_ttl_minutes: i64,
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: i32,
    #[serde(default = "default_otp_resend_cooldown_secs")]
    pub otp_resend_cooldown_secs: i64,
    #[serde(default = "default_reset_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
    /// Server-side pepper mixed into password hashes. Falls back to the JWT
    /// secret when unset.
    pub password_pepper: Option<String>,
    /// HMAC key for hashing opaque tokens and OTP codes. Falls back to the
    /// JWT secret when unset.
    pub token_hmac_key: Option<String>,
}

impl AuthConfig {
    pub fn password_pepper(&self) -> &str {
        self.password_pepper.as_deref().unwrap_or(&self.jwt_secret)
    }

    pub fn token_hmac_key(&self) -> &str {
        self.token_hmac_key.as_deref().unwrap_or(&self.jwt_secret)
    }

    pub fn policy(&self) -> AuthPolicy {
        AuthPolicy {
            refresh_token_ttl: chrono::Duration::days(self.refresh_token_ttl_days),
            otp_ttl: chrono::Duration::minutes(self.otp_ttl_minutes),
            otp_max_attempts: self.otp_max_attempts,
            otp_resend_cooldown: chrono::Duration::seconds(self.otp_resend_cooldown_secs),
            reset_token_ttl: chrono::Duration::minutes(self.reset_token_ttl_minutes),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SendGrid API key; when unset, outbound email is logged instead.
    pub sendgrid_api_key: Option<String>,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Base URL the reset-password link points at.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            from_email: default_from_email(),
            frontend_url: default_frontend_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Load configuration. A missing `thrifter.toml` is fine; the bare
    /// environment variables win over everything else.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .add_source(File::with_name("thrifter").required(false))
            .add_source(Environment::with_prefix("THRIFTER").separator("__"));

        for (var, key) in [
            ("DATABASE_URL", "database.url"),
            ("JWT_SECRET", "auth.jwt_secret"),
            ("SENDGRID_API_KEY", "email.sendgrid_api_key"),
            ("FROM_EMAIL", "email.from_email"),
            ("FRONTEND_URL", "email.frontend_url"),
            ("HOST", "server.host"),
            ("PORT", "server.port"),
        ] {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_max_connections() -> u32 {
    10
}

fn default_issuer() -> String {
    "thrifter-api".to_string()
}

fn default_audience() -> String {
    "thrifter-app".to_string()
}

fn default_access_ttl_secs() -> i64 {
    3600
}

fn default_refresh_ttl_days() -> i64 {
    7
}

fn default_otp_ttl_minutes() -> i64 {
    10
}

fn default_otp_max_attempts() -> i32 {
    5
}

fn default_otp_resend_cooldown_secs() -> i64 {
    60
}

fn default_reset_ttl_minutes() -> i64 {
    15
}

fn default_from_email() -> String {
    "noreply@thrifter.com".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        serde_json::from_value(serde_json::json!({
            "database": { "url": "postgres://localhost/thrifter" },
            "auth": { "jwt_secret": "s3cret" },
        }))
        .unwrap()
    }

    #[test]
    fn fills_in_defaults() {
        let config = minimal();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.issuer, "thrifter-api");
        assert_eq!(config.auth.audience, "thrifter-app");
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert!(config.email.sendgrid_api_key.is_none());
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn secrets_fall_back_to_jwt_secret() {
        let mut config = minimal();
        assert_eq!(config.auth.password_pepper(), "s3cret");
        assert_eq!(config.auth.token_hmac_key(), "s3cret");

        config.auth.password_pepper = Some("pepper".into());
        assert_eq!(config.auth.password_pepper(), "pepper");
    }

    #[test]
    fn policy_reflects_configured_durations() {
        let policy = minimal().auth.policy();
        assert_eq!(policy.refresh_token_ttl, chrono::Duration::days(7));
        assert_eq!(policy.otp_ttl, chrono::Duration::minutes(10));
        assert_eq!(policy.otp_max_attempts, 5);
        assert_eq!(policy.otp_resend_cooldown, chrono::Duration::seconds(60));
        assert_eq!(policy.reset_token_ttl, chrono::Duration::minutes(15));
    }
}
