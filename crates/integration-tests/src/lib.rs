//! Integration tests for Grove.
//!
//! The tests drive the commerce engine end-to-end against the in-memory
//! order store and a scripted payment gateway - no network, no external
//! services. This crate's library is the shared test support:
//!
//! - [`ScriptedGateway`] - records refund calls, deduplicates by idempotency
//!   key the way the real gateway does, and can be scripted to decline.
//! - [`InterferingStore`] - wraps [`MemoryStore`] and provokes version
//!   conflicts by committing a concurrent touch before the commit under test.
//! - Builders for paid orders and operator claims.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p grove-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use grove_commerce::auth::OperatorClaims;
use grove_commerce::gateway::{GatewayError, PaymentGateway, RefundOutcome, RefundRequest};
use grove_commerce::models::order::{Order, OrderItem, PaymentOutcome};
use grove_commerce::store::{MemoryStore, OrderStore, StoreError, Version};
use grove_core::{
    CurrencyCode, OperatorRole, OrderId, OrderItemStatus, OrderItemType, ProductId, ProviderId,
    SkuId, UserId,
};

/// Initialize test logging once per process. Safe to call from every test.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Scripted gateway
// ============================================================================

#[derive(Default)]
struct GatewayState {
    refunds_by_key: HashMap<String, RefundOutcome>,
    calls: u32,
    declines_remaining: u32,
}

/// A payment gateway double with real idempotency-key semantics.
///
/// Every call is counted, but a key that was already refunded returns the
/// recorded outcome instead of moving money again - `real_refunds()` is the
/// number of refunds that actually "happened".
#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<GatewayState>,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that declines the next `count` calls before recovering.
    #[must_use]
    pub fn declining(count: u32) -> Self {
        Self {
            state: Mutex::new(GatewayState {
                declines_remaining: count,
                ..GatewayState::default()
            }),
        }
    }

    /// Total calls received, deduplicated or not.
    pub async fn calls(&self) -> u32 {
        self.state.lock().await.calls
    }

    /// Refunds that actually executed (one per unique idempotency key).
    pub async fn real_refunds(&self) -> usize {
        self.state.lock().await.refunds_by_key.len()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, GatewayError> {
        let mut state = self.state.lock().await;
        state.calls += 1;

        if state.declines_remaining > 0 {
            state.declines_remaining -= 1;
            return Err(GatewayError::Declined("scripted decline".to_owned()));
        }

        if let Some(existing) = state.refunds_by_key.get(&request.idempotency_key) {
            return Ok(existing.clone());
        }

        let refund_id = format!("re_{}", state.refunds_by_key.len() + 1);
        let raw = json!({
            "id": refund_id,
            "object": "refund",
            "status": "succeeded",
            "payment_intent": request.payment_intent,
            "reason": request.reason,
            "metadata": {
                "admin_id": request.metadata.admin_id.as_str(),
                "user_id": request.metadata.user_id.as_str(),
            },
        });
        let outcome = RefundOutcome {
            refund_id,
            status: "succeeded".to_owned(),
            raw,
        };
        state
            .refunds_by_key
            .insert(request.idempotency_key.clone(), outcome.clone());
        Ok(outcome)
    }
}

// ============================================================================
// Conflict-provoking store
// ============================================================================

/// Wraps a [`MemoryStore`] and, while armed, commits a concurrent no-op touch
/// right before each commit under test so the version check fails genuinely.
pub struct InterferingStore {
    inner: Arc<MemoryStore>,
    interferences: Mutex<u32>,
}

impl InterferingStore {
    /// Interfere with the next `count` commits.
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>, count: u32) -> Self {
        Self {
            inner,
            interferences: Mutex::new(count),
        }
    }

    /// Interfere with every commit until [`Self::stop_interfering`].
    #[must_use]
    pub fn persistent(inner: Arc<MemoryStore>) -> Self {
        Self::new(inner, u32::MAX)
    }

    pub async fn stop_interfering(&self) {
        *self.interferences.lock().await = 0;
    }

    async fn maybe_interfere(&self, order: &Order) -> Result<(), StoreError> {
        let mut remaining = self.interferences.lock().await;
        if *remaining == 0 {
            return Ok(());
        }
        *remaining -= 1;
        drop(remaining);

        let (current, version) = self
            .inner
            .provider_order(&order.provided_by, &order.id)
            .await?
            .ok_or(StoreError::NotFound)?;
        self.inner.commit_order_replicas(&current, version).await
    }
}

#[async_trait]
impl OrderStore for InterferingStore {
    async fn provider_order(
        &self,
        provider: &ProviderId,
        order: &OrderId,
    ) -> Result<Option<(Order, Version)>, StoreError> {
        self.inner.provider_order(provider, order).await
    }

    async fn customer_order(
        &self,
        user: &UserId,
        order: &OrderId,
    ) -> Result<Option<Order>, StoreError> {
        self.inner.customer_order(user, order).await
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.inner.insert_order(order).await
    }

    async fn commit_order_replicas(
        &self,
        order: &Order,
        expected: Version,
    ) -> Result<(), StoreError> {
        self.maybe_interfere(order).await?;
        self.inner.commit_order_replicas(order, expected).await
    }
}

// ============================================================================
// Builders
// ============================================================================

/// One JPY line: amount 1000, quantity 1, 10% tax.
#[must_use]
pub fn order_item(amount: i64, quantity: u32, tax_rate: f64) -> OrderItem {
    OrderItem {
        item_type: OrderItemType::Sku,
        product_id: Some(ProductId::new("PR1")),
        sku_id: Some(SkuId::new("S1")),
        quantity,
        currency: CurrencyCode::JPY,
        amount,
        discount: None,
        tax_rate,
        status: OrderItemStatus::None,
        category: "tea".to_owned(),
        name: "Sencha".to_owned(),
        caption: "100g".to_owned(),
        mediated_by: None,
    }
}

/// A paid order (payment intent `pi_123`) for `provider`, purchased by
/// `user`.
#[must_use]
pub fn paid_order(provider: &str, user: &str) -> Order {
    let mut order = Order::new(
        UserId::new(user),
        ProviderId::new(provider),
        CurrencyCode::JPY,
    );
    order.items.push(order_item(1000, 1, 0.1));
    order.recalculate();
    order
        .record_payment(
            PaymentOutcome::Succeeded,
            json!({"id": "pi_123", "object": "payment_intent"}),
        )
        .expect("fresh order accepts a payment outcome");
    order
}

/// Operator claims assigned to `provider`.
#[must_use]
pub fn operator_claims(provider: &str) -> OperatorClaims {
    OperatorClaims::new(
        UserId::new("operator-1"),
        OperatorRole::Operator,
        ProviderId::new(provider),
    )
}

/// Viewer claims assigned to `provider` (insufficient for refunds).
#[must_use]
pub fn viewer_claims(provider: &str) -> OperatorClaims {
    OperatorClaims::new(
        UserId::new("viewer-1"),
        OperatorRole::Viewer,
        ProviderId::new(provider),
    )
}
