//! Core types for Grove.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod country;
pub mod id;
pub mod price;
pub mod status;

pub use country::CountryCode;
pub use id::*;
pub use price::{CurrencyCode, DisplayPrice, ParseCurrencyError};
pub use status::*;
