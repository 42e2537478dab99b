//! Order aggregate and its status state machine.
//!
//! An order exists as two denormalized replicas (customer-owned and
//! provider-owned) that must stay byte-equivalent; the [`crate::store`]
//! commit writes both. Orders are never deleted, only terminalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use grove_core::{
    CurrencyCode, DeliveryStatus, DisplayPrice, MediatorId, OrderId, OrderItemStatus,
    OrderItemType, PaymentStatus, ProductId, ProviderId, RefundStatus, SkuId, UserId,
};

use crate::models::cart::CartGroup;
use crate::models::shipping::Shipping;
use crate::pricing::{Discount, Priced};

/// Illegal status transition on an order or one of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("payment already recorded as {0:?}")]
    PaymentAlreadyRecorded(PaymentStatus),

    #[error("order has no succeeded payment")]
    NotPaid,

    #[error("order is already refunded")]
    AlreadyRefunded,

    #[error("invalid delivery transition: {from:?} -> {to:?}")]
    InvalidDeliveryTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("line item for sku {0} is already {1:?}")]
    ItemAlreadySettled(SkuId, OrderItemStatus),

    #[error("order has no line item for sku {0}")]
    NoSuchItem(SkuId),
}

/// Result of a payment confirmation, delivered by the payment webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// One purchased line on an order.
///
/// The descriptive fields (`name`, `caption`, `category`) are snapshots
/// captured at purchase time; later product edits never touch them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_type: OrderItemType,
    pub product_id: Option<ProductId>,
    pub sku_id: Option<SkuId>,
    pub quantity: u32,
    pub currency: CurrencyCode,
    /// Unit price in minor units.
    pub amount: i64,
    pub discount: Option<Discount>,
    /// Tax rate in `[0, 1]`.
    pub tax_rate: f64,
    pub status: OrderItemStatus,
    pub category: String,
    pub name: String,
    pub caption: String,
    pub mediated_by: Option<MediatorId>,
}

impl OrderItem {
    /// Price for display.
    #[must_use]
    pub const fn display_price(&self) -> DisplayPrice {
        DisplayPrice::new(self.amount, self.currency)
    }
}

impl Priced for OrderItem {
    fn amount(&self) -> i64 {
        self.amount
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn discount(&self) -> Option<Discount> {
        self.discount
    }

    fn tax_rate(&self) -> f64 {
        self.tax_rate
    }
}

/// An order placed by one user with one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub parent_id: Option<OrderId>,
    pub title: Option<String>,
    pub purchased_by: UserId,
    pub provided_by: ProviderId,
    pub shipping: Option<Shipping>,
    pub paid_at: Option<DateTime<Utc>>,
    pub currency: CurrencyCode,
    /// Running total across items, in minor units.
    pub amount: i64,
    pub items: Vec<OrderItem>,
    pub delivery_status: DeliveryStatus,
    pub payment_status: PaymentStatus,
    pub refund_status: RefundStatus,
    /// Monotonic: once true, never reset.
    pub is_cancelled: bool,
    /// Gateway payment object, stored verbatim for audit.
    pub payment_result: Option<Value>,
    /// Gateway transfer object when the payment was split to the provider.
    pub transfer_result: Option<Value>,
    /// Gateway refund object, stored verbatim for audit.
    pub refund_result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create an empty order shell.
    #[must_use]
    pub fn new(purchased_by: UserId, provided_by: ProviderId, currency: CurrencyCode) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            parent_id: None,
            title: None,
            purchased_by,
            provided_by,
            shipping: None,
            paid_at: None,
            currency,
            amount: 0,
            items: Vec::new(),
            delivery_status: DeliveryStatus::default(),
            payment_status: PaymentStatus::default(),
            refund_status: RefundStatus::default(),
            is_cancelled: false,
            payment_result: None,
            transfer_result: None,
            refund_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an order from one cart group at checkout, snapshotting every
    /// line.
    #[must_use]
    pub fn from_cart_group(
        purchased_by: UserId,
        group: &CartGroup,
        shipping: Option<Shipping>,
    ) -> Self {
        let mut order = Self::new(purchased_by, group.provided_by.clone(), group.currency);
        order.shipping = shipping;
        order.items = group
            .items()
            .iter()
            .map(|line| OrderItem {
                item_type: line.item_type,
                product_id: Some(line.product_id.clone()),
                sku_id: Some(line.sku_id.clone()),
                quantity: line.quantity,
                currency: line.currency,
                amount: line.amount,
                discount: line.discount,
                tax_rate: line.tax_rate,
                status: OrderItemStatus::None,
                category: line.category.clone(),
                name: line.name.clone(),
                caption: line.caption.clone(),
                mediated_by: line.mediated_by.clone(),
            })
            .collect();
        order.recalculate();
        order
    }

    /// Recompute the running `amount` from the items.
    pub fn recalculate(&mut self) {
        self.amount = self.items.iter().map(Priced::total).sum();
        self.touch();
    }

    /// Payment intent reference inside the stored payment result.
    #[must_use]
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.payment_result.as_ref()?.get("id")?.as_str()
    }

    /// Whether the payment recorded a transfer to the provider
    /// (split-payment model).
    #[must_use]
    pub const fn has_transfer(&self) -> bool {
        self.transfer_result.is_some()
    }

    /// Record the payment confirmation delivered by the webhook.
    ///
    /// `payment_status` is set exactly once; a second confirmation is an
    /// illegal transition.
    ///
    /// # Errors
    ///
    /// Returns `StateError::PaymentAlreadyRecorded` if a payment outcome was
    /// already recorded.
    pub fn record_payment(
        &mut self,
        outcome: PaymentOutcome,
        payment_result: Value,
    ) -> Result<(), StateError> {
        if self.payment_status != PaymentStatus::None {
            return Err(StateError::PaymentAlreadyRecorded(self.payment_status));
        }
        self.payment_status = match outcome {
            PaymentOutcome::Succeeded => {
                self.paid_at = Some(Utc::now());
                PaymentStatus::Succeeded
            }
            PaymentOutcome::Failed => PaymentStatus::Failed,
        };
        self.payment_result = Some(payment_result);
        self.touch();
        Ok(())
    }

    /// Advance the delivery status one step:
    /// `None -> Pending -> InTransit -> Delivered`.
    ///
    /// # Errors
    ///
    /// Returns `StateError::InvalidDeliveryTransition` for anything that is
    /// not the next step forward.
    pub fn set_delivery_status(&mut self, to: DeliveryStatus) -> Result<(), StateError> {
        use DeliveryStatus as D;
        let legal = matches!(
            (self.delivery_status, to),
            (D::None, D::Pending) | (D::Pending, D::InTransit) | (D::InTransit, D::Delivered)
        );
        if !legal {
            return Err(StateError::InvalidDeliveryTransition {
                from: self.delivery_status,
                to,
            });
        }
        self.delivery_status = to;
        self.touch();
        Ok(())
    }

    /// Mark one line fulfilled.
    ///
    /// # Errors
    ///
    /// Returns `StateError::NoSuchItem` if no line references `sku_id`, or
    /// `StateError::ItemAlreadySettled` if the line already left `None`.
    pub fn fulfill_item(&mut self, sku_id: &SkuId) -> Result<(), StateError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.sku_id.as_ref() == Some(sku_id))
            .ok_or_else(|| StateError::NoSuchItem(sku_id.clone()))?;
        if item.status != OrderItemStatus::None {
            return Err(StateError::ItemAlreadySettled(sku_id.clone(), item.status));
        }
        item.status = OrderItemStatus::Fulfilled;
        self.touch();
        Ok(())
    }

    /// Check that a refund may start: the payment succeeded and no refund
    /// has succeeded yet.
    ///
    /// # Errors
    ///
    /// Returns `StateError::NotPaid` or `StateError::AlreadyRefunded`.
    pub const fn ensure_refundable(&self) -> Result<(), StateError> {
        if !matches!(self.payment_status, PaymentStatus::Succeeded) {
            return Err(StateError::NotPaid);
        }
        if matches!(self.refund_status, RefundStatus::Succeeded) {
            return Err(StateError::AlreadyRefunded);
        }
        Ok(())
    }

    /// Apply the terminal refunded state: every line canceled,
    /// `refund_status = Succeeded`, `is_cancelled = true`, gateway result
    /// stored verbatim.
    ///
    /// Re-applying to an already-refunded order writes the same values again,
    /// so commit retries are safe.
    pub fn apply_refund(&mut self, refund_result: Value) {
        for item in &mut self.items {
            item.status = OrderItemStatus::Canceled;
        }
        self.refund_status = RefundStatus::Succeeded;
        self.is_cancelled = true;
        self.refund_result = Some(refund_result);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(amount: i64, quantity: u32, tax_rate: f64) -> OrderItem {
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
            category: String::new(),
            name: "Tea".to_owned(),
            caption: String::new(),
            mediated_by: None,
        }
    }

    fn paid_order() -> Order {
        let mut order = Order::new(
            UserId::new("U1"),
            ProviderId::new("P1"),
            CurrencyCode::JPY,
        );
        order.items.push(item(1000, 1, 0.1));
        order.recalculate();
        order
            .record_payment(PaymentOutcome::Succeeded, json!({"id": "pi_1"}))
            .expect("fresh order accepts payment");
        order
    }

    #[test]
    fn test_recalculate_sums_item_totals() {
        let mut order = Order::new(
            UserId::new("U1"),
            ProviderId::new("P1"),
            CurrencyCode::JPY,
        );
        order.items.push(item(1000, 2, 0.1));
        order.recalculate();
        // subtotal 2000 + tax 100
        assert_eq!(order.amount, 2100);
    }

    #[test]
    fn test_payment_is_recorded_once() {
        let mut order = paid_order();
        assert_eq!(order.payment_status, PaymentStatus::Succeeded);
        assert!(order.paid_at.is_some());
        assert_eq!(order.payment_intent_id(), Some("pi_1"));

        let err = order
            .record_payment(PaymentOutcome::Failed, json!({"id": "pi_2"}))
            .expect_err("second confirmation must fail");
        assert_eq!(
            err,
            StateError::PaymentAlreadyRecorded(PaymentStatus::Succeeded)
        );
    }

    #[test]
    fn test_delivery_advances_forward_only() {
        let mut order = paid_order();
        order
            .set_delivery_status(DeliveryStatus::Pending)
            .expect("none -> pending");
        order
            .set_delivery_status(DeliveryStatus::InTransit)
            .expect("pending -> in transit");

        let err = order
            .set_delivery_status(DeliveryStatus::Pending)
            .expect_err("going backwards must fail");
        assert!(matches!(err, StateError::InvalidDeliveryTransition { .. }));
    }

    #[test]
    fn test_fulfill_item_once() {
        let mut order = paid_order();
        order
            .fulfill_item(&SkuId::new("S1"))
            .expect("first fulfilment");
        let err = order
            .fulfill_item(&SkuId::new("S1"))
            .expect_err("second fulfilment must fail");
        assert!(matches!(err, StateError::ItemAlreadySettled(..)));

        let err = order
            .fulfill_item(&SkuId::new("S9"))
            .expect_err("unknown sku");
        assert!(matches!(err, StateError::NoSuchItem(..)));
    }

    #[test]
    fn test_unpaid_order_is_not_refundable() {
        let order = Order::new(
            UserId::new("U1"),
            ProviderId::new("P1"),
            CurrencyCode::JPY,
        );
        assert_eq!(order.ensure_refundable(), Err(StateError::NotPaid));
    }

    #[test]
    fn test_refund_terminalizes_and_is_idempotent() {
        let mut order = paid_order();
        order.ensure_refundable().expect("paid order is refundable");

        order.apply_refund(json!({"id": "re_1", "status": "succeeded"}));
        assert_eq!(order.refund_status, RefundStatus::Succeeded);
        assert!(order.is_cancelled);
        assert!(
            order
                .items
                .iter()
                .all(|i| i.status == OrderItemStatus::Canceled)
        );

        // Terminal state is stable under re-application.
        let before = serde_json::to_value(&order).expect("order serializes");
        let mut again = order.clone();
        again.apply_refund(json!({"id": "re_1", "status": "succeeded"}));
        let mut after = serde_json::to_value(&again).expect("order serializes");
        // updated_at moves; everything else must be identical
        after["updated_at"] = before["updated_at"].clone();
        assert_eq!(before, after);

        assert_eq!(
            order.ensure_refundable(),
            Err(StateError::AlreadyRefunded)
        );
    }

    #[test]
    fn test_payment_status_survives_refund() {
        let mut order = paid_order();
        order.apply_refund(json!({"id": "re_1"}));
        // refunds are tracked in refund_status; payment_status is history
        assert_eq!(order.payment_status, PaymentStatus::Succeeded);
    }
}
