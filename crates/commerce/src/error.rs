//! Unified error taxonomy for commerce operations.
//!
//! Precondition and authorization failures are raised before any external or
//! persisted side effect and are safe to surface verbatim to the caller.
//! External-service and store errors are propagated, never swallowed; the
//! core performs no compensating writes.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::order::StateError;
use crate::store::StoreError;

/// Top-level error type for commerce operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The caller presented no authenticated identity.
    #[error("the operation must be called while authenticated")]
    Unauthenticated,

    /// Role or ownership check failed.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The request is malformed (missing order id, unknown order, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An order status transition was illegal (e.g. double refund).
    #[error("precondition failed: {0}")]
    PreconditionFailed(#[from] StateError),

    /// Stored data is missing something it must carry (e.g. payment intent).
    #[error("data integrity: {0}")]
    Integrity(String),

    /// The payment gateway call failed or timed out.
    #[error("payment gateway error: {0}")]
    ExternalService(#[from] GatewayError),

    /// The document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected failure inside a transaction.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for `CommerceError`.
pub type Result<T> = std::result::Result<T, CommerceError>;
