//! Grove Core - Shared types library.
//!
//! This crate provides common types used across all Grove components:
//! - `commerce` - Order, cart, and refund domain engine
//! - `integration-tests` - End-to-end flows against the in-memory store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no document-store access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, currencies, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
