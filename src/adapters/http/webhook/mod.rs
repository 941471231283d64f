//! HTTP adapter for Stripe webhook endpoints.
//!
//! - `POST /webhooks/stripe` - Verify, reconcile and audit a Stripe event
//! - `GET /webhooks/health` - Liveness probe for the webhook endpoint

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{WebhookApiError, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
