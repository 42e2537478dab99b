//! In-memory order store.
//!
//! Reference implementation of [`OrderStore`] used by tests and embedded
//! deployments. Documents live in maps behind one async mutex; the commit
//! stamps `updated_at` the way a document store stamps a server timestamp.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use grove_core::{OrderId, ProviderId, UserId};

use crate::models::order::Order;

use super::{OrderStore, StoreError, Version};

#[derive(Default)]
struct Documents {
    provider_orders: HashMap<(ProviderId, OrderId), (Order, u64)>,
    customer_orders: HashMap<(UserId, OrderId), Order>,
}

/// In-memory [`OrderStore`].
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Documents>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn provider_order(
        &self,
        provider: &ProviderId,
        order: &OrderId,
    ) -> Result<Option<(Order, Version)>, StoreError> {
        let docs = self.docs.lock().await;
        Ok(docs
            .provider_orders
            .get(&(provider.clone(), order.clone()))
            .map(|(doc, version)| (doc.clone(), Version(*version))))
    }

    async fn customer_order(
        &self,
        user: &UserId,
        order: &OrderId,
    ) -> Result<Option<Order>, StoreError> {
        let docs = self.docs.lock().await;
        Ok(docs
            .customer_orders
            .get(&(user.clone(), order.clone()))
            .cloned())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().await;
        let provider_key = (order.provided_by.clone(), order.id.clone());
        if docs.provider_orders.contains_key(&provider_key) {
            return Err(StoreError::AlreadyExists);
        }
        docs.provider_orders.insert(provider_key, (order.clone(), 0));
        docs.customer_orders
            .insert((order.purchased_by.clone(), order.id.clone()), order.clone());
        Ok(())
    }

    async fn commit_order_replicas(
        &self,
        order: &Order,
        expected: Version,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().await;
        let provider_key = (order.provided_by.clone(), order.id.clone());
        let entry = docs
            .provider_orders
            .get_mut(&provider_key)
            .ok_or(StoreError::NotFound)?;
        if entry.1 != expected.0 {
            return Err(StoreError::Conflict);
        }

        let mut committed = order.clone();
        committed.updated_at = Utc::now();

        entry.0 = committed.clone();
        entry.1 += 1;
        docs.customer_orders
            .insert((order.purchased_by.clone(), order.id.clone()), committed);
        Ok(())
    }
}
