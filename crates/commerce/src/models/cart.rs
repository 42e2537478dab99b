//! Cart aggregation engine.
//!
//! A cart is partitioned into groups, one per (provider, product) scope, so
//! checkout can turn each group into a single-provider order. The engine
//! mutates in memory only; the caller persists the whole cart document as one
//! atomic write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grove_core::{CartId, CurrencyCode, MediatorId, OrderItemType, ProductId, ProviderId, SkuId, UserId};

use crate::models::sku::Sku;
use crate::pricing::{Discount, Priced};

/// Deterministic key of a cart group.
///
/// Derived from the provider and product identities, so repeated additions of
/// SKUs from the same scope always land in the same group regardless of call
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Derive the group key for a (provider, product) pairing.
    #[must_use]
    pub fn derive(provider: &ProviderId, product: &ProductId) -> Self {
        Self(format!("{provider}:{product}"))
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line in a cart group, snapshotting the SKU at add time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub item_type: OrderItemType,
    pub product_id: ProductId,
    pub sku_id: SkuId,
    pub quantity: u32,
    pub currency: CurrencyCode,
    /// Unit price in minor units.
    pub amount: i64,
    pub discount: Option<Discount>,
    /// Tax rate in `[0, 1]`.
    pub tax_rate: f64,
    pub category: String,
    pub name: String,
    pub caption: String,
    /// Referrer attribution, stamped when the line is created and never
    /// overwritten by later additions.
    pub mediated_by: Option<MediatorId>,
}

impl CartItem {
    /// Snapshot a SKU into a new cart line with quantity 1.
    #[must_use]
    pub fn from_sku(sku: &Sku, mediated_by: Option<MediatorId>) -> Self {
        Self {
            item_type: OrderItemType::Sku,
            product_id: sku.product_id.clone(),
            sku_id: sku.id.clone(),
            quantity: 1,
            currency: sku.currency,
            amount: sku.amount,
            discount: None,
            tax_rate: sku.tax_rate,
            category: sku.category.clone(),
            name: sku.name.clone(),
            caption: sku.caption.clone(),
            mediated_by,
        }
    }
}

impl Priced for CartItem {
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

/// The cart lines belonging to one (provider, product) scope.
///
/// The line list is private so merging stays the only way to add a SKU
/// twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartGroup {
    pub group_id: GroupId,
    pub provided_by: ProviderId,
    pub product_id: ProductId,
    pub currency: CurrencyCode,
    items: Vec<CartItem>,
}

impl CartGroup {
    /// Create an empty group for a (provider, product) scope.
    #[must_use]
    pub fn new(provided_by: ProviderId, product_id: ProductId, currency: CurrencyCode) -> Self {
        Self {
            group_id: GroupId::derive(&provided_by, &product_id),
            provided_by,
            product_id,
            currency,
            items: Vec::new(),
        }
    }

    /// Create a group scoped to the SKU's provider and product.
    #[must_use]
    pub fn from_sku(sku: &Sku) -> Self {
        Self::new(sku.provided_by.clone(), sku.product_id.clone(), sku.currency)
    }

    /// Lines in this group, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a SKU to the group.
    ///
    /// If a line for this SKU already exists its quantity is incremented;
    /// otherwise a new line is appended with `mediated_by` stamped on it.
    pub fn add_sku(&mut self, sku: &Sku, mediated_by: Option<MediatorId>) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.sku_id == sku.id) {
            existing.quantity += 1;
        } else {
            self.items.push(CartItem::from_sku(sku, mediated_by));
        }
    }

    /// Remove the line matching `sku_id`.
    ///
    /// Returns whether a line was removed. The group does not remove itself
    /// from the parent cart when it becomes empty; that is the caller's job.
    pub fn delete_sku(&mut self, sku_id: &SkuId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.sku_id != *sku_id);
        self.items.len() != before
    }

    /// Sum of line subtotals, in minor units.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.items.iter().map(Priced::subtotal).sum()
    }

    /// Sum of line taxes, in minor units.
    #[must_use]
    pub fn tax(&self) -> i64 {
        self.items.iter().map(Priced::tax).sum()
    }

    /// Sum of line totals, in minor units.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.items.iter().map(Priced::total).sum()
    }
}

/// A user's shopping cart: a set of groups keyed by [`GroupId`].
///
/// Invariant: no group in the map is empty. Mutations that empty a group drop
/// it from the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub owned_by: UserId,
    groups: BTreeMap<GroupId, CartGroup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for a user. The cart shares the user's id, since
    /// each user owns exactly one cart document.
    #[must_use]
    pub fn new(owned_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(owned_by.as_str()),
            owned_by,
            groups: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a group by key. Absence is not an error; it just means no SKU
    /// from that scope has been added yet.
    #[must_use]
    pub fn group(&self, group_id: &GroupId) -> Option<&CartGroup> {
        self.groups.get(group_id)
    }

    /// Groups in key order.
    pub fn groups(&self) -> impl Iterator<Item = &CartGroup> {
        self.groups.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Insert or replace a group under its own key, dropping it instead if it
    /// is empty.
    pub fn set_group(&mut self, group: CartGroup) {
        if group.is_empty() {
            self.groups.remove(&group.group_id);
        } else {
            self.groups.insert(group.group_id.clone(), group);
        }
        self.touch();
    }

    /// Add a SKU, routing it to its (provider, product) group and creating
    /// the group on first use.
    pub fn add_sku(&mut self, sku: &Sku, mediated_by: Option<MediatorId>) {
        let group_id = GroupId::derive(&sku.provided_by, &sku.product_id);
        self.groups
            .entry(group_id)
            .or_insert_with(|| CartGroup::from_sku(sku))
            .add_sku(sku, mediated_by);
        self.touch();
    }

    /// Remove a SKU line from a group, pruning the group if that emptied it.
    ///
    /// Returns whether a line was removed.
    pub fn delete_sku(&mut self, group_id: &GroupId, sku_id: &SkuId) -> bool {
        let Some(group) = self.groups.get_mut(group_id) else {
            return false;
        };
        let removed = group.delete_sku(sku_id);
        if group.is_empty() {
            self.groups.remove(group_id);
        }
        if removed {
            self.touch();
        }
        removed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::ProviderId;

    fn sku(provider: &str, product: &str, sku_id: &str, amount: i64) -> Sku {
        let mut s = Sku::new(ProviderId::new(provider), ProductId::new(product));
        s.id = SkuId::new(sku_id);
        s.name = format!("{sku_id} name");
        s.amount = amount;
        s.tax_rate = 0.1;
        s
    }

    #[test]
    fn test_group_id_is_deterministic() {
        let a = GroupId::derive(&ProviderId::new("P1"), &ProductId::new("PR1"));
        let b = GroupId::derive(&ProviderId::new("P1"), &ProductId::new("PR1"));
        assert_eq!(a, b);
        assert_ne!(a, GroupId::derive(&ProviderId::new("P2"), &ProductId::new("PR1")));
    }

    #[test]
    fn test_add_same_sku_twice_merges() {
        let mut cart = Cart::new(UserId::new("U1"));
        let s = sku("P1", "PR1", "S1", 1000);
        cart.add_sku(&s, None);
        cart.add_sku(&s, None);

        let group_id = GroupId::derive(&s.provided_by, &s.product_id);
        let group = cart.group(&group_id).expect("group must exist");
        assert_eq!(group.items().len(), 1);
        assert_eq!(group.items()[0].quantity, 2);
    }

    #[test]
    fn test_mediator_stamped_on_creation_only() {
        let mut cart = Cart::new(UserId::new("U1"));
        let s = sku("P1", "PR1", "S1", 1000);
        cart.add_sku(&s, Some(MediatorId::new("M1")));
        cart.add_sku(&s, Some(MediatorId::new("M2")));

        let group_id = GroupId::derive(&s.provided_by, &s.product_id);
        let group = cart.group(&group_id).expect("group must exist");
        assert_eq!(group.items()[0].mediated_by, Some(MediatorId::new("M1")));
    }

    #[test]
    fn test_skus_from_different_scopes_get_separate_groups() {
        let mut cart = Cart::new(UserId::new("U1"));
        cart.add_sku(&sku("P1", "PR1", "S1", 1000), None);
        cart.add_sku(&sku("P2", "PR2", "S2", 500), None);
        assert_eq!(cart.groups().count(), 2);
    }

    #[test]
    fn test_delete_last_sku_prunes_group() {
        let mut cart = Cart::new(UserId::new("U1"));
        let s = sku("P1", "PR1", "S1", 1000);
        cart.add_sku(&s, None);

        let group_id = GroupId::derive(&s.provided_by, &s.product_id);
        assert!(cart.delete_sku(&group_id, &s.id));
        assert!(cart.group(&group_id).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_delete_missing_sku_reports_false() {
        let mut cart = Cart::new(UserId::new("U1"));
        let s = sku("P1", "PR1", "S1", 1000);
        cart.add_sku(&s, None);

        let group_id = GroupId::derive(&s.provided_by, &s.product_id);
        assert!(!cart.delete_sku(&group_id, &SkuId::new("S9")));
        assert!(cart.group(&group_id).is_some());
    }

    #[test]
    fn test_set_group_drops_empty_group() {
        let mut cart = Cart::new(UserId::new("U1"));
        let s = sku("P1", "PR1", "S1", 1000);
        cart.add_sku(&s, None);

        let group_id = GroupId::derive(&s.provided_by, &s.product_id);
        let mut group = cart.group(&group_id).expect("group must exist").clone();
        group.delete_sku(&s.id);
        cart.set_group(group);
        assert!(cart.group(&group_id).is_none());
    }

    #[test]
    fn test_group_totals() {
        let mut cart = Cart::new(UserId::new("U1"));
        let s = sku("P1", "PR1", "S1", 1000);
        cart.add_sku(&s, None);
        cart.add_sku(&s, None);

        let group_id = GroupId::derive(&s.provided_by, &s.product_id);
        let group = cart.group(&group_id).expect("group must exist");
        // amount=1000, quantity=2, tax_rate=0.1
        assert_eq!(group.subtotal(), 2000);
        assert_eq!(group.tax(), 100);
        assert_eq!(group.total(), 2100);
    }
}
