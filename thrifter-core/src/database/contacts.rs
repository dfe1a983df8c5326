//! Postgres implementation of [`ContactRepository`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use std::fmt;

use crate::auth::repositories::{ContactFilter, ContactRepository};
use crate::domain::contact::{Contact, NewContact};

pub struct PostgresContactRepository {
    pool: PgPool,
}

impl fmt::Debug for PostgresContactRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresContactRepository").finish()
    }
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    async fn insert(&self, contact: &NewContact) -> Result<Contact> {
        let inserted = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (first_name, last_name, email, phone_number, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(&contact.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn list(&self, filter: &ContactFilter) -> Result<(Vec<Contact>, i64)> {
        fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ContactFilter) {
            builder.push(" WHERE TRUE");
            if let Some(after) = filter.created_after {
                builder.push(" AND created_at >= ").push_bind(after);
            }
            if let Some(before) = filter.created_before {
                builder.push(" AND created_at < ").push_bind(before);
            }
        }

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM contacts");
        push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new("SELECT * FROM contacts");
        push_filters(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let contacts = builder
            .build_query_as::<Contact>()
            .fetch_all(&self.pool)
            .await?;

        Ok((contacts, total))
    }
}
