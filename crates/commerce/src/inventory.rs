//! Publication gate for SKU availability.
//!
//! Toggling a SKU on sale is a normal, expected-to-sometimes-fail user
//! action, so a denied check is an advisory reason string rather than an
//! error. The gate only applies to the false→true transition; taking a SKU
//! off sale is never blocked.

use grove_core::InventoryKind;

use crate::models::sku::{Sku, Stock};

/// Reason reported when a finite-inventory SKU has nothing to sell.
pub const REASON_NO_STOCK: &str = "no stock";

/// Advisory decision on whether a SKU may be published for sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publishability {
    /// Whether the SKU may transition to available.
    pub allowed: bool,
    /// Why publication was denied, when it was.
    pub reason: Option<String>,
}

impl Publishability {
    /// Evaluate the gate for `sku` given its child stock records.
    ///
    /// Finite inventory requires a positive aggregate count; infinite
    /// inventory is always publishable.
    #[must_use]
    pub fn check(sku: &Sku, stocks: &[Stock]) -> Self {
        match sku.inventory.kind {
            InventoryKind::Infinite => Self::allowed(),
            InventoryKind::Finite => {
                let count: i64 = stocks.iter().map(|s| s.count).sum();
                if count <= 0 {
                    Self::denied(REASON_NO_STOCK)
                } else {
                    Self::allowed()
                }
            }
        }
    }

    const fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_owned()),
        }
    }
}
