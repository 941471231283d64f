//! Webhook error types for Stripe webhook handling.
//!
//! Defines every error condition that can occur while verifying, routing and
//! reconciling a webhook, with HTTP status mapping and benign-miss semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No webhook signing secret is configured.
    #[error("Webhook secret not configured: {0}")]
    ConfigurationError(String),

    /// Header missing or malformed, timestamp stale, or HMAC mismatch.
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    /// Authenticated body or its data object is not well formed.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Correlation metadata key absent from the event object.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// The referenced local record does not exist.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Storage operation failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl WebhookError {
    /// Returns true for outcomes that are acknowledged and audited as
    /// `ignored` rather than `error`.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingMetadata(_)
                | WebhookError::EntityNotFound(_)
                | WebhookError::Ignored(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Only errors raised before dispatch reach the response: verification
    /// failures are 400 so Stripe does not retry, storage failures are 500
    /// so it does.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::ConfigurationError(_)
            | WebhookError::SignatureMismatch(_)
            | WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,

            WebhookError::MissingMetadata(_)
            | WebhookError::EntityNotFound(_)
            | WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            WebhookError::SignatureMismatch(_) => "SIGNATURE_MISMATCH",
            WebhookError::InvalidPayload(_) => "INVALID_PAYLOAD",
            WebhookError::MissingMetadata(_) => "MISSING_METADATA",
            WebhookError::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            WebhookError::Ignored(_) => "IGNORED",
            WebhookError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    // ══════════════════════════════════════════════════════════════
    // Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn missing_metadata_displays_field_name() {
        let err = WebhookError::MissingMetadata("subscription_id");
        assert_eq!(format!("{}", err), "Missing metadata: subscription_id");
    }

    #[test]
    fn signature_mismatch_displays_reason() {
        let err = WebhookError::SignatureMismatch("timestamp outside tolerance".to_string());
        assert_eq!(
            format!("{}", err),
            "Signature mismatch: timestamp outside tolerance"
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Benign Classification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn misses_are_benign() {
        assert!(WebhookError::MissingMetadata("subscription_id").is_benign());
        assert!(WebhookError::EntityNotFound("sub_1".to_string()).is_benign());
        assert!(WebhookError::Ignored("unhandled".to_string()).is_benign());
    }

    #[test]
    fn failures_are_not_benign() {
        assert!(!WebhookError::Persistence("down".to_string()).is_benign());
        assert!(!WebhookError::InvalidPayload("bad".to_string()).is_benign());
        assert!(!WebhookError::SignatureMismatch("bad".to_string()).is_benign());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verification_failures_return_bad_request() {
        for err in [
            WebhookError::ConfigurationError("unset".to_string()),
            WebhookError::SignatureMismatch("mismatch".to_string()),
            WebhookError::InvalidPayload("syntax".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn persistence_returns_internal_error() {
        let err = WebhookError::Persistence("connection lost".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn ignored_returns_ok() {
        let err = WebhookError::Ignored("not relevant".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn domain_error_becomes_persistence() {
        let err: WebhookError = DomainError::new(ErrorCode::DatabaseError, "pool closed").into();
        assert!(matches!(err, WebhookError::Persistence(_)));
        assert_eq!(err.code(), "PERSISTENCE_ERROR");
    }
}
