//! External payment gateway interface.
//!
//! One operation matters to this core: creating a refund. The request
//! carries a deterministic idempotency key so the gateway deduplicates
//! retried calls; the raw response is preserved verbatim for audit.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use grove_core::{ProviderId, UserId};

pub mod stripe;

pub use stripe::StripeGateway;

/// Refund reason reported to the gateway.
pub const REASON_REQUESTED_BY_CUSTOMER: &str = "requested_by_customer";

/// Who initiated a refund, recorded in gateway metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundMetadata {
    /// Provider whose operator requested the refund.
    pub admin_id: ProviderId,
    /// The operator's user id.
    pub user_id: UserId,
}

/// A refund to execute against the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    /// Payment intent being reversed.
    pub payment_intent: String,
    /// Refund reason code.
    pub reason: String,
    /// Whether the platform's application fee is refunded too. Always false
    /// here; the platform keeps its fee.
    pub refund_application_fee: bool,
    /// Whether to pull the funds back from the provider's transfer
    /// (split-payment model).
    pub reverse_transfer: bool,
    /// Deduplication key; the gateway executes at most one refund per key.
    pub idempotency_key: String,
    pub metadata: RefundMetadata,
}

/// Gateway-side result of a refund, kept verbatim in `raw`.
#[derive(Debug, Clone)]
pub struct RefundOutcome {
    /// Gateway id of the refund object.
    pub refund_id: String,
    /// Gateway-reported status (e.g. `succeeded`, `pending`).
    pub status: String,
    /// Full response body as received.
    pub raw: Value,
}

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure, including timeouts.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the refund.
    #[error("gateway declined refund: {0}")]
    Declined(String),

    /// The gateway answered with something unexpected.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
}

/// The refund operation of the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Execute a refund.
    ///
    /// Implementations must honor `request.idempotency_key`: a retried call
    /// with the same key must not move money twice.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure, decline, or a response
    /// that cannot be interpreted.
    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, GatewayError>;
}
