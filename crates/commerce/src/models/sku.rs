//! SKU (sellable variant) and stock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grove_core::{CurrencyCode, DisplayPrice, InventoryKind, ProductId, ProviderId, SkuId, StockId};

use crate::inventory::Publishability;

/// How a SKU's inventory is tracked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub kind: InventoryKind,
}

/// A purchasable variant of a product with its own price and inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub id: SkuId,
    pub provided_by: ProviderId,
    pub product_id: ProductId,
    pub name: String,
    pub caption: String,
    pub category: String,
    /// Unit price in minor units.
    pub amount: i64,
    pub currency: CurrencyCode,
    /// Tax rate in `[0, 1]`.
    pub tax_rate: f64,
    pub inventory: Inventory,
    /// Whether the SKU is published for sale.
    pub is_available: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sku {
    /// Create an unpublished SKU with empty snapshot fields.
    #[must_use]
    pub fn new(provided_by: ProviderId, product_id: ProductId) -> Self {
        let now = Utc::now();
        Self {
            id: SkuId::generate(),
            provided_by,
            product_id,
            name: "No name".to_owned(),
            caption: String::new(),
            category: String::new(),
            amount: 0,
            currency: CurrencyCode::default(),
            tax_rate: 0.0,
            inventory: Inventory::default(),
            is_available: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attempt the false→true availability transition.
    ///
    /// Finite-inventory SKUs are gated on the aggregate stock count; the
    /// returned decision says whether the toggle happened and, if not, why.
    pub fn publish(&mut self, stocks: &[Stock]) -> Publishability {
        let decision = Publishability::check(self, stocks);
        if decision.allowed {
            self.is_available = true;
            self.updated_at = Utc::now();
        }
        decision
    }

    /// Remove the SKU from sale. Always allowed.
    pub fn unpublish(&mut self) {
        self.is_available = false;
        self.updated_at = Utc::now();
    }

    /// Price for display.
    #[must_use]
    pub const fn display_price(&self) -> DisplayPrice {
        DisplayPrice::new(self.amount, self.currency)
    }
}

/// A child stock record contributing to a SKU's aggregate count.
///
/// Counts are signed: adjustments and reservations may go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: StockId,
    pub count: i64,
}

impl Stock {
    #[must_use]
    pub const fn new(id: StockId, count: i64) -> Self {
        Self { id, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sku_starts_unpublished() {
        let sku = Sku::new(ProviderId::new("P1"), ProductId::new("PR1"));
        assert!(!sku.is_available);
    }

    #[test]
    fn test_unpublish_is_unconditional() {
        let mut sku = Sku::new(ProviderId::new("P1"), ProductId::new("PR1"));
        sku.is_available = true;
        sku.unpublish();
        assert!(!sku.is_available);
    }
}
