//! In-memory order table.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderRepository, RepoError, RepoResult};
use crate::domain::aggregates::{Order, OrderPatch};

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    // insertion order; newest-first reads walk it backwards
    orders: RwLock<Vec<Order>>,
    sequence: AtomicU64,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self { Self::default() }
}

fn newest_first<'a>(orders: impl DoubleEndedIterator<Item = &'a Order>) -> Vec<Order> {
    let mut out: Vec<Order> = orders.rev().cloned().collect();
    // stable: equal timestamps keep the later insertion first
    out.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    out
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn next_sequence(&self) -> RepoResult<u64> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn create(&self, order: Order) -> RepoResult<Order> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id() == order.id()) {
            return Err(RepoError::Duplicate { field: "id", value: order.id().to_string() });
        }
        if orders.iter().any(|o| o.order_number() == order.order_number()) {
            return Err(RepoError::Duplicate { field: "order_number", value: order.order_number().to_string() });
        }
        orders.push(order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().await.iter().find(|o| o.id() == id).cloned())
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.iter().filter(|o| o.customer_id() == customer_id)))
    }

    async fn find_all(&self) -> RepoResult<Vec<Order>> {
        Ok(newest_first(self.orders.read().await.iter()))
    }

    async fn update(&self, id: Uuid, expected_version: u64, patch: OrderPatch) -> RepoResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id() == id) else {
            return Ok(None);
        };
        if order.version() != expected_version {
            return Err(RepoError::Conflict { id, expected: expected_version });
        }
        order.merge(patch);
        Ok(Some(order.clone()))
    }

    async fn search(&self, query: &str) -> RepoResult<Vec<Order>> {
        let needle = query.trim().to_lowercase();
        let orders = self.orders.read().await;
        Ok(newest_first(orders.iter().filter(|o| o.matches(&needle))))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id() != id);
        Ok(orders.len() != before)
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.orders.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderStatus, PaymentStatus};
    use crate::repository::contract::{self, picked_up, seed};

    #[tokio::test]
    async fn test_shared_contract() {
        contract::run(&InMemoryOrderRepository::new()).await;
    }

    #[tokio::test]
    async fn test_find_by_id_is_idempotent() {
        let repo = InMemoryOrderRepository::new();
        let order = seed(&repo, "C1").await;
        let first = repo.find_by_id(order.id()).await.unwrap();
        let second = repo.find_by_id(order.id()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.unwrap().order_number().as_str(), "WW0001");
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_customer_newest_first() {
        let repo = InMemoryOrderRepository::new();
        let a = seed(&repo, "C1").await;
        seed(&repo, "C2").await;
        let b = seed(&repo, "C1").await;
        let ids: Vec<_> = repo.find_by_customer("C1").await.unwrap().iter().map(Order::id).collect();
        assert_eq!(ids, vec![b.id(), a.id()]);
        assert!(repo.find_by_customer("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_checks_version() {
        let repo = InMemoryOrderRepository::new();
        let order = seed(&repo, "C1").await;

        let updated = repo.update(order.id(), 0, picked_up()).await.unwrap().unwrap();
        assert_eq!(updated.status(), OrderStatus::PickedUp);
        assert!(updated.updated_at() >= order.updated_at());

        let stale = repo.update(order.id(), 0, OrderPatch::payment(PaymentStatus::Paid)).await;
        assert!(matches!(stale, Err(RepoError::Conflict { expected: 0, .. })));
        let stored = repo.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.payment_status(), PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_search_case_insensitive() {
        let repo = InMemoryOrderRepository::new();
        seed(&repo, "C1").await;
        seed(&repo, "Acme-42").await;
        assert_eq!(repo.search("ww000").await.unwrap().len(), 2);
        assert_eq!(repo.search("ACME").await.unwrap().len(), 1);
        assert_eq!(repo.search("Pending").await.unwrap().len(), 2);
        assert!(repo.search("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryOrderRepository::new();
        let order = seed(&repo, "C1").await;
        assert!(repo.delete(order.id()).await.unwrap());
        assert!(!repo.delete(order.id()).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_the_colliding_field() {
        let repo = InMemoryOrderRepository::new();
        let order = seed(&repo, "C1").await;
        let err = repo.create(order.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), format!("duplicate id: {}", order.id()));
    }
}
