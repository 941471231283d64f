//! Response bodies for the webhook endpoints.

use serde::Serialize;

use crate::application::ProcessOutcome;

/// Acknowledgement returned to Stripe for every accepted delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub event_id: String,
    pub outcome: String,
}

impl WebhookAckResponse {
    pub fn new(event_id: impl Into<String>, outcome: ProcessOutcome) -> Self {
        Self {
            received: true,
            event_id: event_id.into(),
            outcome: outcome.as_str().to_string(),
        }
    }
}

/// Standard error response for rejected deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
