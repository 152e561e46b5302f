//! PostgreSQL document store: one `documents` table with JSONB bodies.

use super::sql::{build_count_sql, build_find_sql, BindValue};
use super::traits::{DocumentStore, NewDocument};
use crate::config::DatabaseConfig;
use crate::metrics::STORE_OPERATION_DURATION_SECONDS;
use crate::Result;
use anyhow::Context;
use async_trait::async_trait;
use fittrack_query::{FindQuery, Query};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::PgExecutor;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min_size)
            .max_connections(config.pool_max_size)
            .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn fetch_count<'c, E>(executor: E, sql: &str, binds: Vec<BindValue>) -> Result<u64>
where
    E: PgExecutor<'c>,
{
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    for value in binds {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::TextArray(vs) => query.bind(vs),
        };
    }
    let total = query.fetch_one(executor).await?;
    Ok(total.max(0) as u64)
}

async fn fetch_bodies<'c, E>(executor: E, sql: &str, binds: Vec<BindValue>) -> Result<Vec<JsonValue>>
where
    E: PgExecutor<'c>,
{
    let mut query = sqlx::query_scalar::<_, JsonValue>(sql);
    for value in binds {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::TextArray(vs) => query.bind(vs),
        };
    }
    Ok(query.fetch_all(executor).await?)
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64> {
        let _timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&["count"])
            .start_timer();
        let (sql, binds) = build_count_sql(collection, query);
        fetch_count(&self.pool, &sql, binds).await
    }

    async fn find(&self, collection: &str, find: &FindQuery) -> Result<Vec<JsonValue>> {
        let _timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&["find"])
            .start_timer();
        let (sql, binds) = build_find_sql(collection, find);
        fetch_bodies(&self.pool, &sql, binds).await
    }

    /// Both statements run in one read-only `REPEATABLE READ` transaction, so the
    /// total and the page describe the same snapshot.
    async fn count_and_find(
        &self,
        collection: &str,
        find: &FindQuery,
    ) -> Result<(u64, Vec<JsonValue>)> {
        let _timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&["count_and_find"])
            .start_timer();

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (count_sql, count_binds) = build_count_sql(collection, find.conditions());
        let total = fetch_count(&mut *tx, &count_sql, count_binds).await?;

        let (find_sql, find_binds) = build_find_sql(collection, find);
        let bodies = fetch_bodies(&mut *tx, &find_sql, find_binds).await?;

        tx.commit().await?;
        Ok((total, bodies))
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>> {
        let _timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&["get"])
            .start_timer();
        let body = sqlx::query_scalar::<_, JsonValue>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(body)
    }

    async fn get_many(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<JsonValue>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let _timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&["get_many"])
            .start_timer();
        let bodies = sqlx::query_scalar::<_, JsonValue>(
            "SELECT body FROM documents WHERE collection = $1 AND id = ANY($2)",
        )
        .bind(collection)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(bodies)
    }

    async fn insert(&self, collection: &str, document: NewDocument) -> Result<JsonValue> {
        let _timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&["insert"])
            .start_timer();
        let body = sqlx::query_scalar::<_, JsonValue>(
            "INSERT INTO documents (collection, id, body, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING body",
        )
        .bind(collection)
        .bind(document.id)
        .bind(&document.body)
        .bind(document.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(body)
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
