//! Domain models: orders, carts, SKUs, and shipping snapshots.

pub mod cart;
pub mod order;
pub mod shipping;
pub mod sku;

pub use cart::{Cart, CartGroup, CartItem, GroupId};
pub use order::{Order, OrderItem, PaymentOutcome, StateError};
pub use shipping::{Address, AddressPart, Shipping};
pub use sku::{Inventory, Sku, Stock};
