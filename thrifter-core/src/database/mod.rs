//! Postgres persistence: pool wrapper, embedded migrations and the
//! repository implementations.

pub mod contacts;
pub mod email_otps;
pub mod password_resets;
pub mod refresh_tokens;
pub mod users;

pub use contacts::PostgresContactRepository;
pub use email_otps::PostgresEmailOtpRepository;
pub use password_resets::PostgresPasswordResetRepository;
pub use refresh_tokens::PostgresRefreshTokenRepository;
pub use users::PostgresUserRepository;

use std::fmt;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::CoreError;

/// Shared Postgres handle. Repositories clone the pool out of this.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, CoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded migrations.
    pub async fn migrate(&self) -> Result<(), CoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| CoreError::Internal(format!("migration failed: {err}")))?;
        Ok(())
    }
}
