//! Postgres implementation of [`UserRepository`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use std::fmt;
use uuid::Uuid;

use crate::auth::repositories::{
    ListUsersFilter, NewUser, UniqueConflict, UserChanges, UserRepository, UserStats,
};
use crate::domain::users::User;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl fmt::Debug for PostgresUserRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresUserRepository").finish()
    }
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ConflictRow {
    email: String,
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    active: i64,
    verified: i64,
    users: i64,
    admins: i64,
    drivers: i64,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_conflict(
        &self,
        email: &str,
        phone_number: &str,
    ) -> Result<Option<UniqueConflict>> {
        let row = sqlx::query_as::<_, ConflictRow>(
            "SELECT email FROM users WHERE email = $1 OR phone_number = $2 LIMIT 1",
        )
        .bind(email)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            if row.email == email {
                UniqueConflict::Email
            } else {
                UniqueConflict::PhoneNumber
            }
        }))
    }

    async fn insert(&self, user: &NewUser) -> Result<User> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, location, phone_number, role, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.location)
        .bind(&user.phone_number)
        .bind(user.role)
        .bind(user.is_verified)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn update_profile(&self, user_id: Uuid, changes: &UserChanges) -> Result<Option<User>> {
        let mut builder = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(name) = &changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(location) = &changes.location {
            builder.push(", location = ").push_bind(location);
        }
        if let Some(phone_number) = &changes.phone_number {
            builder.push(", phone_number = ").push_bind(phone_number);
        }
        if let Some(role) = changes.role {
            builder.push(", role = ").push_bind(role);
        }
        if let Some(is_active) = changes.is_active {
            builder.push(", is_active = ").push_bind(is_active);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(user_id)
            .push(" AND deleted_at IS NULL RETURNING *");

        let user = builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_verified(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn soft_delete(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &ListUsersFilter) -> Result<(Vec<User>, i64)> {
        fn push_filters<'a>(
            builder: &mut QueryBuilder<'a, sqlx::Postgres>,
            filter: &'a ListUsersFilter,
        ) {
            builder.push(" WHERE deleted_at IS NULL");
            if !filter.include_inactive {
                builder.push(" AND is_active = TRUE");
            }
            if let Some(role) = filter.role {
                builder.push(" AND role = ").push_bind(role);
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{search}%");
                builder
                    .push(" AND (name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR email ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new("SELECT * FROM users");
        push_filters(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn stats(&self) -> Result<UserStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_active) AS active,
                COUNT(*) FILTER (WHERE is_verified) AS verified,
                COUNT(*) FILTER (WHERE role = 'USER') AS users,
                COUNT(*) FILTER (WHERE role = 'ADMIN') AS admins,
                COUNT(*) FILTER (WHERE role = 'DRIVER') AS drivers
            FROM users
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            total: row.total,
            active: row.active,
            verified: row.verified,
            users: row.users,
            admins: row.admins,
            drivers: row.drivers,
        })
    }
}
