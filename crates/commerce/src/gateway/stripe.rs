//! Stripe implementation of the payment gateway.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

use crate::config::GatewayConfig;

use super::{GatewayError, PaymentGateway, RefundOutcome, RefundRequest};

/// Stripe refund client.
///
/// Talks to `POST /v1/refunds` with form-encoded parameters, bearer auth,
/// and the `Idempotency-Key` header. Every request is bounded by the
/// configured timeout; a timed-out refund surfaces as a transport error and
/// is safe to retry under the same key.
pub struct StripeGateway {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl StripeGateway {
    /// Build a client from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(idempotency_key = %request.idempotency_key))]
    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, GatewayError> {
        let params = [
            ("payment_intent", request.payment_intent.as_str()),
            ("reason", request.reason.as_str()),
            (
                "refund_application_fee",
                bool_param(request.refund_application_fee),
            ),
            ("reverse_transfer", bool_param(request.reverse_transfer)),
            ("metadata[admin_id]", request.metadata.admin_id.as_str()),
            ("metadata[user_id]", request.metadata.user_id.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown gateway error")
                .to_owned();
            return Err(GatewayError::Declined(message));
        }

        let refund_id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GatewayError::MalformedResponse("refund response has no id".to_owned())
            })?
            .to_owned();
        let refund_status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();

        Ok(RefundOutcome {
            refund_id,
            status: refund_status,
            raw: body,
        })
    }
}

const fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
