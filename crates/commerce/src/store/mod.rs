//! Persistence boundary for orders.
//!
//! The surrounding system owns generic document CRUD; this trait exposes
//! exactly what the order lifecycle needs: a versioned snapshot read of the
//! provider-owned replica and an atomic conditional write of **both**
//! replicas. The two replicas are never independently mutable through this
//! interface - that is what keeps them byte-equivalent.

use async_trait::async_trait;
use thiserror::Error;

use grove_core::{OrderId, ProviderId, UserId};

use crate::models::order::Order;

pub mod memory;

pub use memory::MemoryStore;

/// Optimistic-concurrency token for a provider order replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(pub u64);

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced order does not exist.
    #[error("order not found")]
    NotFound,

    /// The order already exists (duplicate insert).
    #[error("order already exists")]
    AlreadyExists,

    /// Another transaction committed since the snapshot read.
    #[error("version conflict")]
    Conflict,

    /// Stored data cannot be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Order persistence with optimistic concurrency over the provider replica.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Snapshot-read the provider-owned replica with its version token.
    async fn provider_order(
        &self,
        provider: &ProviderId,
        order: &OrderId,
    ) -> Result<Option<(Order, Version)>, StoreError>;

    /// Read the customer-owned replica.
    async fn customer_order(
        &self,
        user: &UserId,
        order: &OrderId,
    ) -> Result<Option<Order>, StoreError>;

    /// Create both replicas of a new order (checkout).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the order id is taken.
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Atomically write both replicas, iff the provider replica still
    /// carries `expected`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the version moved; the caller should
    /// re-read and re-apply.
    async fn commit_order_replicas(
        &self,
        order: &Order,
        expected: Version,
    ) -> Result<(), StoreError>;
}

/// Document path of the provider-owned order replica.
///
/// Stable across deployments: refund idempotency keys are derived from it.
#[must_use]
pub fn provider_order_path(provider: &ProviderId, order: &OrderId) -> String {
    format!("commerce/v1/providers/{provider}/orders/{order}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_order_path_is_stable() {
        let path = provider_order_path(&ProviderId::new("P1"), &OrderId::new("O1"));
        assert_eq!(path, "commerce/v1/providers/P1/orders/O1");
    }
}
