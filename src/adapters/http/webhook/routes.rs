//! Axum router configuration for webhook endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{handle_stripe_webhook, webhook_health, WebhookAppState};

/// Create the webhook API router.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks (no auth, signature verified)
/// - `GET /health` - Liveness probe
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/stripe", post(handle_stripe_webhook))
        .route("/health", get(webhook_health))
}

/// Create the webhook module router, mounted at `/webhooks`.
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().nest("/webhooks", webhook_routes())
}
