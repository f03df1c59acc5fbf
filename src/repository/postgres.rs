//! PostgreSQL order table.
//!
//! Each order is kept as a JSONB document next to the scalar columns used for
//! filtering and ordering. Updates lock the row and compare `version` before
//! writing.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use super::{OrderRepository, RepoError, RepoResult};
use crate::domain::aggregates::{Order, OrderPatch};

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Opens a pool and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(max_connections, "order database ready");
        Ok(Self::new(pool))
    }

    async fn fetch_orders(&self, sql: &str, bind: Option<&str>) -> RepoResult<Vec<Order>> {
        let mut query = sqlx::query_scalar::<_, Json<Order>>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }
}

/// `%query%` with LIKE wildcards in the query taken literally.
fn like_pattern(query: &str) -> String {
    let escaped = query.trim().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn next_sequence(&self) -> RepoResult<u64> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')").fetch_one(&self.pool).await?;
        Ok(seq as u64)
    }

    async fn create(&self, order: Order) -> RepoResult<Order> {
        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_id, order_status, payment_status, total_amount, version, created_at, updated_at, body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(order.id())
        .bind(order.order_number().as_str())
        .bind(order.customer_id())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.total_amount().amount())
        .bind(order.version() as i64)
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(Json(&order))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => match db.constraint() {
                Some("orders_pkey") => RepoError::Duplicate { field: "id", value: order.id().to_string() },
                _ => RepoError::Duplicate { field: "order_number", value: order.order_number().to_string() },
            },
            other => RepoError::Database(other),
        })?;
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Order>> {
        let row = sqlx::query_scalar::<_, Json<Order>>("SELECT body FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(order)| order))
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        self.fetch_orders("SELECT body FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, seq DESC", Some(customer_id))
            .await
    }

    async fn find_all(&self) -> RepoResult<Vec<Order>> {
        self.fetch_orders("SELECT body FROM orders ORDER BY created_at DESC, seq DESC", None).await
    }

    async fn update(&self, id: Uuid, expected_version: u64, patch: OrderPatch) -> RepoResult<Option<Order>> {
        let mut tx = self.pool.begin().await?;
        let current = sqlx::query_scalar::<_, Json<Order>>("SELECT body FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(Json(mut order)) = current else {
            return Ok(None);
        };
        if order.version() != expected_version {
            return Err(RepoError::Conflict { id, expected: expected_version });
        }
        order.merge(patch);
        sqlx::query(
            "UPDATE orders SET order_status = $2, payment_status = $3, version = $4, updated_at = $5, body = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.version() as i64)
        .bind(order.updated_at())
        .bind(Json(&order))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(order))
    }

    async fn search(&self, query: &str) -> RepoResult<Vec<Order>> {
        let pattern = like_pattern(query);
        self.fetch_orders(
            "SELECT body FROM orders \
             WHERE order_number ILIKE $1 OR order_status ILIKE $1 OR customer_id ILIKE $1 \
             ORDER BY created_at DESC, seq DESC",
            Some(&pattern),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(count as u64)
    }
}
