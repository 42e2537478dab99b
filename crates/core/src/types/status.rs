//! Status enums for orders, line items, inventory, and operators.

use serde::{Deserialize, Serialize};

/// Kind of purchasable referenced by an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemType {
    /// A concrete product variant.
    #[default]
    Sku,
    /// A recurring plan (billing handled outside this core).
    Plan,
}

/// Per-line fulfilment status on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    #[default]
    None,
    Fulfilled,
    Canceled,
}

/// Order delivery status, driven by fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    None,
    Pending,
    InTransit,
    Delivered,
}

/// Order payment status, set once by payment confirmation.
///
/// A refund never rewrites this field; refunds are tracked by
/// [`RefundStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    None,
    Succeeded,
    Failed,
}

/// Order refund status. Terminal once `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    #[default]
    None,
    Succeeded,
    Failed,
}

/// How a SKU's stock is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InventoryKind {
    /// Stock counted by child stock records; publication is gated on the sum.
    #[default]
    Finite,
    /// Never runs out (e.g. digital goods).
    Infinite,
}

/// Provider operator role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    /// Full access to the provider's store, including refunds.
    Admin,
    /// Day-to-day order management, including refunds.
    Operator,
    /// Read-only access to store data.
    Viewer,
}

impl OperatorRole {
    /// Whether this role may mutate orders (fulfil, refund).
    #[must_use]
    pub const fn can_manage_orders(self) -> bool {
        matches!(self, Self::Admin | Self::Operator)
    }
}

impl std::fmt::Display for OperatorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Operator => write!(f, "operator"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for OperatorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "operator" => Ok(Self::Operator),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid operator role: {s}")),
        }
    }
}
