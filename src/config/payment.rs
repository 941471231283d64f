//! Payment configuration
//!
//! Stripe credentials are injected into the verifier and processor at
//! startup. Nothing reads them from a global.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound for `audit_retention_days` (ten years).
pub const MAX_AUDIT_RETENTION_DAYS: i64 = 3650;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key; only its mode prefix is used here.
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret. Absence is reported per request.
    #[serde(default)]
    pub stripe_webhook_secret: Option<SecretString>,

    /// Maximum accepted age of a signed delivery, in seconds
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Days to keep webhook audit records; unset keeps them forever
    #[serde(default)]
    pub audit_retention_days: Option<i64>,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    /// Webhook secret, if one is configured and non-empty.
    pub fn webhook_secret(&self) -> Option<SecretString> {
        self.stripe_webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
            .cloned()
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }

        // Verify key prefixes for safety
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if let Some(secret) = self.webhook_secret() {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }

        if !(1..=3600).contains(&self.signature_tolerance_secs) {
            return Err(ValidationError::InvalidSignatureTolerance);
        }
        if let Some(days) = self.audit_retention_days {
            if !(1..=MAX_AUDIT_RETENTION_DAYS).contains(&days) {
                return Err(ValidationError::InvalidRetention);
            }
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: SecretString::new(String::new()),
            stripe_webhook_secret: None,
            signature_tolerance_secs: default_signature_tolerance(),
            audit_retention_days: None,
        }
    }
}

fn default_signature_tolerance() -> i64 {
    300
}
