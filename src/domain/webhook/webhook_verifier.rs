//! Stripe webhook signature verification.
//!
//! Implements verification of Stripe webhook signatures using HMAC-SHA256.
//! Includes timestamp validation to prevent replay attacks.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Default maximum age for webhook events (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signatures (HMAC-SHA256). Stripe sends several while rolling secrets.
    pub v1_signatures: Vec<Vec<u8>>,
    /// Optional v0 legacy signature.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v0=<legacy>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::SignatureMismatch` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures: Vec<Vec<u8>> = Vec::new();
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| mismatch("invalid header format"))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| mismatch("invalid timestamp"))?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value.trim()).map_err(|_| mismatch("invalid v1 signature hex"))?,
                    );
                }
                "v0" => {
                    v0_signature = Some(
                        hex::decode(value.trim()).map_err(|_| mismatch("invalid v0 signature hex"))?,
                    );
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| mismatch("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(mismatch("missing v1 signature"));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
            v0_signature,
        })
    }
}

fn mismatch(reason: &str) -> WebhookError {
    WebhookError::SignatureMismatch(reason.to_string())
}

/// Verifier for Stripe webhook signatures.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from the Stripe dashboard.
    secret: Option<SecretString>,
    /// Maximum accepted event age in seconds.
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    /// Creates a verifier. A `None` secret rejects every request as misconfigured.
    pub fn new(secret: Option<SecretString>, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Convenience constructor with the default tolerance.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self::new(Some(SecretString::new(secret.into())), DEFAULT_TOLERANCE_SECS)
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Ensure a secret is configured
    /// 2. Parse the signature header
    /// 3. Validate timestamp is within acceptable range
    /// 4. Compare against every v1 signature in constant time
    /// 5. Parse the JSON payload into a StripeEvent
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify_and_parse`](Self::verify_and_parse) with an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let secret = self
            .secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                WebhookError::ConfigurationError("stripe_webhook_secret is not set".to_string())
            })?;

        let header = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| mismatch("missing Stripe-Signature header"))?;
        let header = SignatureHeader::parse(header)?;

        self.validate_timestamp(header.timestamp, now)?;

        let expected = compute_signature(secret, header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(mismatch("no matching v1 signature"));
        }

        StripeEvent::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64, now: i64) -> Result<(), WebhookError> {
        let age = now
            .checked_sub(timestamp)
            .ok_or_else(|| mismatch("invalid timestamp"))?;

        if age > self.tolerance_secs {
            return Err(mismatch("timestamp outside tolerance"));
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(mismatch("timestamp in the future"));
        }

        Ok(())
    }
}

/// Computes the HMAC-SHA256 signature over `"<timestamp>.<payload>"`.
fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::ConfigurationError(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a `Stripe-Signature` header value for the given payload.
///
/// Used by test fixtures and local tooling that replays events.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = compute_signature(secret, timestamp, payload)
        .map(hex::encode)
        .unwrap_or_default();
    format!("t={},v1={}", timestamp, signature)
}
