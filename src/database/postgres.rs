//! # PostgreSQL Order Table
//!
//! [`OrderTableStore`] over sqlx. The version check of
//! [`merge_if_match`](OrderTableStore::merge_if_match) is part of the
//! `UPDATE ... WHERE etag = $n`, so the check and the write are one statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{validate_table_name, OrderTableStore};
use crate::config::DatabaseConfig;
use crate::constants::{OrderStatus, ORDERS_PARTITION};
use crate::error::{RelayError, RelayResult};
use crate::models::{OrderPatch, OrderRow, OrderSeed};

const ORDER_COLUMNS: &str =
    "partition_key, row_key, customer, total, status, created_utc, processed_utc, etag";

/// Apply the bundled migrations (pgmq extension and the default orders table)
pub async fn run_migrations(pool: &PgPool) -> RelayResult<()> {
    info!("🏗️ Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|reason| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: reason.into(),
            })?;

        Ok(Self {
            partition_key: row.try_get("partition_key")?,
            order_id: row.try_get("row_key")?,
            customer: row.try_get("customer")?,
            total: row.try_get("total")?,
            status,
            created_utc: row.try_get::<DateTime<Utc>, _>("created_utc")?,
            processed_utc: row.try_get::<Option<DateTime<Utc>>, _>("processed_utc")?,
            etag: row.try_get("etag")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgOrderTable {
    pool: PgPool,
    table: String,
}

impl PgOrderTable {
    pub fn new(pool: PgPool, table: impl Into<String>) -> RelayResult<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    /// Open a pool from configuration
    pub async fn connect_pool(config: &DatabaseConfig) -> RelayResult<PgPool> {
        debug!(
            max_connections = config.max_connections,
            acquire_timeout_seconds = config.acquire_timeout_seconds,
            "Creating database pool"
        );

        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| RelayError::storage("connect", e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl OrderTableStore for PgOrderTable {
    async fn ensure_table(&self) -> RelayResult<()> {
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                partition_key TEXT NOT NULL,
                row_key TEXT NOT NULL,
                customer TEXT NOT NULL,
                total DOUBLE PRECISION NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                created_utc TIMESTAMPTZ NOT NULL,
                processed_utc TIMESTAMPTZ,
                etag UUID NOT NULL,
                PRIMARY KEY (partition_key, row_key)
            )",
            table = self.table
        );
        sqlx::query(&statement).execute(&self.pool).await?;

        info!(table = %self.table, "✅ Order table ready");
        Ok(())
    }

    async fn upsert(&self, seed: OrderSeed) -> RelayResult<OrderRow> {
        let statement = format!(
            "INSERT INTO {table} ({ORDER_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, NULL, $7)
             ON CONFLICT (partition_key, row_key) DO UPDATE SET
                customer = EXCLUDED.customer,
                total = EXCLUDED.total,
                status = EXCLUDED.status,
                created_utc = EXCLUDED.created_utc,
                processed_utc = NULL,
                etag = EXCLUDED.etag
             RETURNING {ORDER_COLUMNS}",
            table = self.table
        );

        let row = sqlx::query_as::<_, OrderRow>(&statement)
            .bind(ORDERS_PARTITION)
            .bind(&seed.order_id)
            .bind(&seed.customer)
            .bind(seed.total)
            .bind(seed.status.as_str())
            .bind(seed.created_utc)
            .bind(Uuid::new_v4())
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn get(&self, order_id: &str) -> RelayResult<Option<OrderRow>> {
        let statement = format!(
            "SELECT {ORDER_COLUMNS} FROM {table} WHERE partition_key = $1 AND row_key = $2",
            table = self.table
        );

        let row = sqlx::query_as::<_, OrderRow>(&statement)
            .bind(ORDERS_PARTITION)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn merge_if_match(
        &self,
        order_id: &str,
        patch: &OrderPatch,
        etag: Uuid,
    ) -> RelayResult<OrderRow> {
        let statement = format!(
            "UPDATE {table} SET
                status = COALESCE($3, status),
                processed_utc = COALESCE($4, processed_utc),
                etag = $5
             WHERE partition_key = $1 AND row_key = $2 AND etag = $6
             RETURNING {ORDER_COLUMNS}",
            table = self.table
        );

        let row = sqlx::query_as::<_, OrderRow>(&statement)
            .bind(ORDERS_PARTITION)
            .bind(order_id)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.processed_utc)
            .bind(Uuid::new_v4())
            .bind(etag)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| RelayError::conflict(order_id))
    }

    async fn query(&self, status: Option<&str>) -> RelayResult<Vec<OrderRow>> {
        let statement = format!(
            "SELECT {ORDER_COLUMNS} FROM {table}
             WHERE partition_key = $1 AND ($2::text IS NULL OR status = $2)",
            table = self.table
        );

        let rows = sqlx::query_as::<_, OrderRow>(&statement)
            .bind(ORDERS_PARTITION)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn health_check(&self) -> RelayResult<()> {
        let health: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        if health == 1 {
            Ok(())
        } else {
            Err(RelayError::storage("health_check", "unexpected probe result"))
        }
    }

    fn store_type(&self) -> &'static str {
        "postgres"
    }
}
