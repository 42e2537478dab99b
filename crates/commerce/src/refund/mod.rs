//! Refund transaction coordinator.
//!
//! Performs a refund exactly once: ordered precondition checks before any
//! side effect, a single gateway call keyed by a deterministic idempotency
//! token, then an atomic dual-replica commit under optimistic concurrency.
//!
//! The gateway call is the only non-rollback-able step. Its idempotency key
//! is derived from the provider-order path, so however many times the
//! surrounding commit is retried - or the whole operation is re-invoked after
//! a crash - the gateway moves money at most once.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use grove_core::{OrderId, ProviderId};

use crate::auth::OperatorClaims;
use crate::error::{CommerceError, Result};
use crate::gateway::{
    PaymentGateway, REASON_REQUESTED_BY_CUSTOMER, RefundMetadata, RefundOutcome, RefundRequest,
};
use crate::models::order::Order;
use crate::store::{OrderStore, StoreError, Version, provider_order_path};

/// Commit attempts before giving up on a contended order.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Coordinates refunds across the gateway and both order replicas.
pub struct RefundService {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl RefundService {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Refund the order at `providers/{provider_id}/orders/{order_id}` in
    /// full.
    ///
    /// Preconditions, checked in order with the first failure winning, all
    /// before any external or persisted side effect:
    ///
    /// 1. The caller is authenticated (`claims` present).
    /// 2. The caller's role may manage orders.
    /// 3. The caller's assigned provider is the one being refunded.
    /// 4. The order exists and carries a payment intent reference.
    /// 5. The order is refundable (paid, not already refunded).
    ///
    /// On success both replicas carry the terminal refunded state and the
    /// gateway's refund object verbatim.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `PermissionDenied`, `InvalidArgument`,
    /// `Integrity`, and `PreconditionFailed` per the checks above;
    /// `ExternalService` when the gateway call fails (no local state
    /// mutated); `Internal` when commit retries are exhausted.
    #[instrument(skip(self, claims), fields(provider_id = %provider_id, order_id = %order_id))]
    pub async fn refund(
        &self,
        claims: Option<&OperatorClaims>,
        provider_id: &ProviderId,
        order_id: &OrderId,
    ) -> Result<Order> {
        let claims = claims.ok_or(CommerceError::Unauthenticated)?;
        if !claims.role.can_manage_orders() {
            return Err(CommerceError::PermissionDenied(
                "the caller does not have the right to change the order".to_owned(),
            ));
        }
        if claims.provider.as_ref() != Some(provider_id) {
            return Err(CommerceError::PermissionDenied(
                "the caller is not an operator of this provider".to_owned(),
            ));
        }

        let (order, version) = self
            .store
            .provider_order(provider_id, order_id)
            .await?
            .ok_or_else(|| {
                CommerceError::InvalidArgument(format!(
                    "provider {provider_id} has no order {order_id}"
                ))
            })?;

        // The replica was read from the provider's own collection; a mismatch
        // here means the document is filed under the wrong provider.
        if order.provided_by != *provider_id {
            return Err(CommerceError::PermissionDenied(
                "the caller is not an operator of this provider".to_owned(),
            ));
        }

        let payment_intent = order
            .payment_intent_id()
            .ok_or_else(|| {
                CommerceError::Integrity(
                    "order does not carry a payment intent reference".to_owned(),
                )
            })?
            .to_owned();

        order.ensure_refundable()?;

        let path = provider_order_path(provider_id, order_id);
        let request = RefundRequest {
            payment_intent,
            reason: REASON_REQUESTED_BY_CUSTOMER.to_owned(),
            refund_application_fee: false,
            reverse_transfer: order.has_transfer(),
            idempotency_key: format!("{path}-refund"),
            metadata: RefundMetadata {
                admin_id: provider_id.clone(),
                user_id: claims.uid.clone(),
            },
        };

        // The single external side effect. Everything after this point must
        // converge on the terminal state without calling the gateway again.
        let outcome = self.gateway.create_refund(&request).await?;
        info!(
            refund_id = %outcome.refund_id,
            status = %outcome.status,
            "gateway accepted refund"
        );

        self.commit_refund(order, version, &outcome).await
    }

    /// Write the terminal state to both replicas, re-reading and re-applying
    /// on version conflicts. Re-application is a no-op by value, so losing a
    /// race to a concurrent writer (fulfilment, another retry of this
    /// refund) cannot corrupt the outcome.
    async fn commit_refund(
        &self,
        mut order: Order,
        mut version: Version,
        outcome: &RefundOutcome,
    ) -> Result<Order> {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            order.apply_refund(outcome.raw.clone());
            match self.store.commit_order_replicas(&order, version).await {
                Ok(()) => return Ok(order),
                Err(StoreError::Conflict) => {
                    warn!(attempt, "replica commit conflicted; re-reading order");
                    let (fresh, fresh_version) = self
                        .store
                        .provider_order(&order.provided_by, &order.id)
                        .await?
                        .ok_or_else(|| {
                            CommerceError::Internal(
                                "order disappeared during refund commit".to_owned(),
                            )
                        })?;
                    order = fresh;
                    version = fresh_version;
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(CommerceError::Internal(
            "refund commit retries exhausted".to_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::UserId;

    #[test]
    fn test_idempotency_key_is_derived_from_the_order_path() {
        let path = provider_order_path(&ProviderId::new("P1"), &OrderId::new("O1"));
        let key = format!("{path}-refund");
        assert_eq!(key, "commerce/v1/providers/P1/orders/O1-refund");
        // same inputs, same key
        let again = format!(
            "{}-refund",
            provider_order_path(&ProviderId::new("P1"), &OrderId::new("O1"))
        );
        assert_eq!(key, again);
    }

    #[test]
    fn test_metadata_names_operator_and_provider() {
        let metadata = RefundMetadata {
            admin_id: ProviderId::new("P1"),
            user_id: UserId::new("U1"),
        };
        assert_eq!(metadata.admin_id.as_str(), "P1");
        assert_eq!(metadata.user_id.as_str(), "U1");
    }
}
