use std::fmt;
use std::sync::Arc;

use thrifter_core::auth::{AuthCrypto, AuthenticationService, ContactRepository};
use thrifter_core::database::{
    PostgresContactRepository, PostgresDatabase, PostgresEmailOtpRepository,
    PostgresPasswordResetRepository, PostgresRefreshTokenRepository, PostgresUserRepository,
};

use crate::infra::config::Config;
use crate::mailer::{LogMailer, Mailer, SendGridMailer};
use crate::users::auth::jwt::Jwt;

/// Shared handler state. Everything inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthenticationService>,
    pub contacts: Arc<dyn ContactRepository>,
    pub jwt: Arc<Jwt>,
    pub mailer: Arc<dyn Mailer>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(config: Config, db: PostgresDatabase) -> anyhow::Result<Self> {
        let pool = db.pool().clone();

        let crypto = Arc::new(AuthCrypto::new(
            config.auth.password_pepper(),
            config.auth.token_hmac_key(),
        )?);

        let contacts: Arc<dyn ContactRepository> =
            Arc::new(PostgresContactRepository::new(pool.clone()));

        let auth = Arc::new(
            AuthenticationService::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
                Arc::new(PostgresEmailOtpRepository::new(pool.clone())),
                Arc::new(PostgresPasswordResetRepository::new(pool)),
                crypto,
            )
            .with_policy(config.auth.policy()),
        );

        let jwt = Arc::new(Jwt::new(
            &config.auth.jwt_secret,
            &config.auth.issuer,
            &config.auth.audience,
            config.auth.access_token_ttl_secs,
        ));

        let mailer: Arc<dyn Mailer> = match config.email.sendgrid_api_key.clone() {
            Some(api_key) => Arc::new(SendGridMailer::new(
                api_key,
                config.email.from_email.clone(),
            )),
            None => {
                tracing::warn!("no SendGrid API key configured; outbound email will be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self {
            config: Arc::new(config),
            auth,
            contacts,
            jwt,
            mailer,
        })
    }
}
