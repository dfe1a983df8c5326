//! Postgres implementation of [`EmailOtpRepository`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::auth::repositories::{EmailOtpRecord, EmailOtpRepository, OtpPurpose};

pub struct PostgresEmailOtpRepository {
    pool: PgPool,
}

impl fmt::Debug for PostgresEmailOtpRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresEmailOtpRepository").finish()
    }
}

impl PostgresEmailOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EmailOtpRow {
    id: Uuid,
    user_id: Uuid,
    code_hash: String,
    purpose: OtpPurpose,
    attempts: i32,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<EmailOtpRow> for EmailOtpRecord {
    fn from(row: EmailOtpRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            code_hash: row.code_hash,
            purpose: row.purpose,
            attempts: row.attempts,
            expires_at: row.expires_at,
            consumed_at: row.consumed_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl EmailOtpRepository for PostgresEmailOtpRepository {
    async fn consume_open(&self, user_id: Uuid, purpose: OtpPurpose) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE email_otps SET consumed_at = NOW() \
             WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL",
        )
        .bind(user_id)
        .bind(purpose)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO email_otps (user_id, purpose, code_hash, expires_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user_id)
        .bind(purpose)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_latest_open(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
    ) -> Result<Option<EmailOtpRecord>> {
        let row = sqlx::query_as::<_, EmailOtpRow>(
            "SELECT id, user_id, code_hash, purpose, attempts, expires_at, consumed_at, created_at \
             FROM email_otps \
             WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn increment_attempts(&self, otp_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE email_otps SET attempts = attempts + 1 WHERE id = $1")
            .bind(otp_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge(&self, user_id: Uuid, purpose: OtpPurpose) -> Result<u64> {
        let result = sqlx::query("DELETE FROM email_otps WHERE user_id = $1 AND purpose = $2")
            .bind(user_id)
            .bind(purpose)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
