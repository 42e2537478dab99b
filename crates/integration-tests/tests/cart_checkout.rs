//! End-to-end cart flows: publication gating, grouped adds, checkout into an
//! order, and payment recording.

use std::sync::Arc;

use grove_commerce::models::cart::{Cart, GroupId};
use grove_commerce::models::order::{Order, PaymentOutcome};
use grove_commerce::models::sku::{Sku, Stock};
use grove_commerce::store::{MemoryStore, OrderStore};
use grove_core::{
    CurrencyCode, DeliveryStatus, MediatorId, PaymentStatus, ProductId, ProviderId, SkuId,
    StockId, UserId,
};

use grove_integration_tests::init_tracing;

fn sencha_sku() -> Sku {
    let mut sku = Sku::new(ProviderId::new("P1"), ProductId::new("PR1"));
    sku.id = SkuId::new("S1");
    sku.name = "Sencha".to_owned();
    sku.caption = "100g".to_owned();
    sku.category = "tea".to_owned();
    sku.amount = 1000;
    sku.currency = CurrencyCode::JPY;
    sku.tax_rate = 0.1;
    sku
}

#[test]
fn test_sku_must_be_stocked_before_going_on_sale() {
    init_tracing();
    let mut sku = sencha_sku();

    let denied = sku.publish(&[]);
    assert!(!denied.allowed);
    assert_eq!(denied.reason.as_deref(), Some("no stock"));
    assert!(!sku.is_available);

    let allowed = sku.publish(&[Stock::new(StockId::new("ST1"), 10)]);
    assert!(allowed.allowed);
    assert!(sku.is_available);
}

#[tokio::test]
async fn test_cart_checkout_creates_consistent_replicas() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut sku = sencha_sku();
    sku.publish(&[Stock::new(StockId::new("ST1"), 10)]);

    // shopper adds the same SKU twice via a referral link
    let mut cart = Cart::new(UserId::new("U1"));
    cart.add_sku(&sku, Some(MediatorId::new("M1")));
    cart.add_sku(&sku, Some(MediatorId::new("M2")));

    let group_id = GroupId::derive(&sku.provided_by, &sku.product_id);
    let group = cart.group(&group_id).expect("group exists");
    assert_eq!(group.items().len(), 1);
    assert_eq!(group.items()[0].quantity, 2);
    // attribution belongs to whoever created the line
    assert_eq!(group.items()[0].mediated_by, Some(MediatorId::new("M1")));
    // amount 1000 x2 + 10% tax on the unit amount
    assert_eq!(group.subtotal(), 2000);
    assert_eq!(group.tax(), 100);
    assert_eq!(group.total(), 2100);

    // checkout snapshots the group into an order
    let mut order = Order::from_cart_group(cart.owned_by.clone(), group, None);
    assert_eq!(order.provided_by, sku.provided_by);
    assert_eq!(order.currency, CurrencyCode::JPY);
    assert_eq!(order.amount, 2100);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].name, "Sencha");
    assert_eq!(order.items[0].mediated_by, Some(MediatorId::new("M1")));

    order
        .record_payment(
            PaymentOutcome::Succeeded,
            serde_json::json!({"id": "pi_123"}),
        )
        .expect("payment records once");
    store.insert_order(&order).await.expect("insert");

    let (provider_copy, _) = store
        .provider_order(&order.provided_by, &order.id)
        .await
        .expect("store read")
        .expect("provider replica exists");
    let customer_copy = store
        .customer_order(&order.purchased_by, &order.id)
        .await
        .expect("store read")
        .expect("customer replica exists");
    assert_eq!(provider_copy.payment_status, PaymentStatus::Succeeded);
    assert_eq!(
        serde_json::to_value(&provider_copy).expect("order serializes"),
        serde_json::to_value(&customer_copy).expect("order serializes"),
    );
}

#[test]
fn test_multi_provider_cart_checks_out_one_order_per_group() {
    init_tracing();
    let sku_a = sencha_sku();
    let mut sku_b = Sku::new(ProviderId::new("P2"), ProductId::new("PR2"));
    sku_b.id = SkuId::new("S2");
    sku_b.name = "Matcha bowl".to_owned();
    sku_b.amount = 2500;
    sku_b.currency = CurrencyCode::JPY;

    let mut cart = Cart::new(UserId::new("U1"));
    cart.add_sku(&sku_a, None);
    cart.add_sku(&sku_b, None);
    assert_eq!(cart.groups().count(), 2);

    let orders: Vec<Order> = cart
        .groups()
        .map(|group| Order::from_cart_group(cart.owned_by.clone(), group, None))
        .collect();
    assert_eq!(orders.len(), 2);
    let providers: Vec<&str> = orders.iter().map(|o| o.provided_by.as_str()).collect();
    assert!(providers.contains(&"P1"));
    assert!(providers.contains(&"P2"));
}

#[test]
fn test_emptied_group_leaves_the_cart() {
    init_tracing();
    let sku = sencha_sku();
    let mut cart = Cart::new(UserId::new("U1"));
    cart.add_sku(&sku, None);

    let group_id = GroupId::derive(&sku.provided_by, &sku.product_id);
    assert!(cart.delete_sku(&group_id, &sku.id));
    assert!(cart.group(&group_id).is_none());
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_fulfilment_advances_after_checkout() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let sku = sencha_sku();
    let mut cart = Cart::new(UserId::new("U1"));
    cart.add_sku(&sku, None);

    let group_id = GroupId::derive(&sku.provided_by, &sku.product_id);
    let group = cart.group(&group_id).expect("group exists");
    let mut order = Order::from_cart_group(cart.owned_by.clone(), group, None);
    order
        .record_payment(
            PaymentOutcome::Succeeded,
            serde_json::json!({"id": "pi_123"}),
        )
        .expect("payment records once");
    store.insert_order(&order).await.expect("insert");

    let (mut stored, version) = store
        .provider_order(&order.provided_by, &order.id)
        .await
        .expect("store read")
        .expect("provider replica exists");
    stored
        .set_delivery_status(DeliveryStatus::Pending)
        .expect("none -> pending");
    stored.fulfill_item(&sku.id).expect("line fulfils once");
    store
        .commit_order_replicas(&stored, version)
        .await
        .expect("commit");

    let customer_copy = store
        .customer_order(&order.purchased_by, &order.id)
        .await
        .expect("store read")
        .expect("customer replica exists");
    assert_eq!(customer_copy.delivery_status, DeliveryStatus::Pending);
}
