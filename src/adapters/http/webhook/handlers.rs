//! HTTP handlers for webhook endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::WebhookProcessor;
use crate::domain::webhook::{StripeWebhookVerifier, WebhookError};

use super::dto::{ErrorResponse, WebhookAckResponse};

/// Header carrying Stripe's `t=...,v1=...` signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook endpoints.
#[derive(Clone)]
pub struct WebhookAppState {
    pub processor: Arc<WebhookProcessor>,
    pub verifier: Arc<StripeWebhookVerifier>,
}

impl WebhookAppState {
    pub fn new(processor: WebhookProcessor, verifier: StripeWebhookVerifier) -> Self {
        Self {
            processor: Arc::new(processor),
            verifier: Arc::new(verifier),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/stripe - Handle a Stripe webhook delivery.
///
/// The raw body is verified before it is parsed, so the extractor must be
/// `Bytes` rather than `Json`.
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let event = state.verifier.verify_and_parse(&body, signature)?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        livemode = event.livemode,
        "Received Stripe webhook"
    );

    let outcome = state.processor.process(&event).await?;

    Ok(Json(WebhookAckResponse::new(event.id, outcome)))
}

/// GET /webhooks/health - Liveness probe.
pub async fn webhook_health() -> impl IntoResponse {
    (StatusCode::OK, "Webhook endpoint is healthy")
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Webhook rejected with server error");
        } else {
            tracing::warn!(code = self.0.code(), error = %self.0, "Webhook rejected");
        }

        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
