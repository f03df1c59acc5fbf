//! Repository Module
//!
//! Storage contract for orders plus its in-memory and PostgreSQL backings.
//! A lookup miss is `Ok(None)`; only storage faults are errors.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryOrderRepository;
pub use postgres::PgOrderRepository;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderPatch};

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("order {id} changed since version {expected}")]
    Conflict { id: Uuid, expected: u64 },

    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Next value of the order number sequence, starting at 1.
    async fn next_sequence(&self) -> RepoResult<u64>;

    async fn create(&self, order: Order) -> RepoResult<Order>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Order>>;

    /// Newest first.
    async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>>;

    /// Newest first.
    async fn find_all(&self) -> RepoResult<Vec<Order>>;

    /// Merges `patch` if the stored version still equals `expected_version`.
    async fn update(&self, id: Uuid, expected_version: u64, patch: OrderPatch) -> RepoResult<Option<Order>>;

    /// Case-insensitive substring search over order number, status and customer id.
    async fn search(&self, query: &str) -> RepoResult<Vec<Order>>;

    async fn delete(&self, id: Uuid) -> RepoResult<bool>;

    async fn count(&self) -> RepoResult<u64>;
}
