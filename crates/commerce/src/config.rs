//! Commerce configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GROVE_STRIPE_API_KEY` - Payment gateway secret key
//!
//! ## Optional
//! - `GROVE_GATEWAY_BASE_URL` - Gateway API origin (default: <https://api.stripe.com>)
//! - `GROVE_GATEWAY_TIMEOUT_SECS` - Refund call timeout (default: 15)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Commerce engine configuration.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Payment gateway configuration.
    pub gateway: GatewayConfig,
}

/// Payment gateway client configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway secret key (bearer auth).
    pub api_key: SecretString,
    /// Gateway API origin.
    pub base_url: String,
    /// Upper bound on any single gateway call.
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CommerceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if a required variable is absent
    /// and `ConfigError::InvalidEnvVar` if a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require_env("GROVE_STRIPE_API_KEY")?;

        let base_url = std::env::var("GROVE_GATEWAY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_BASE_URL.to_owned());

        let timeout_secs = match std::env::var("GROVE_GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("GROVE_GATEWAY_TIMEOUT_SECS".to_owned(), e.to_string())
            })?,
            Err(_) => DEFAULT_GATEWAY_TIMEOUT_SECS,
        };

        Ok(Self {
            gateway: GatewayConfig {
                api_key: SecretString::from(api_key),
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    let value =
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))?;
    if value.is_empty() {
        return Err(ConfigError::MissingEnvVar(name.to_owned()));
    }
    Ok(value)
}
