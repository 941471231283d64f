//! Webhook reconciliation - routes verified Stripe events to handlers that
//! bring local billing records in line with Stripe.
//!
//! ## Flow
//!
//! 1. `WebhookProcessor` short-circuits deliveries already audited as final
//! 2. `WebhookRouter` looks up the handler for the event kind
//! 3. The handler mutates subscriptions/invoices through the ports
//! 4. `AuditLogger` appends one `WebhookEventRecord` for the delivery

mod audit_logger;
mod history;
mod invoice;
mod payment_intent;
mod processor;
mod router;
mod subscription_lifecycle;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::domain::foundation::SubscriptionId;
use crate::domain::webhook::{StripeEvent, StripeEventType, WebhookError};
use crate::ports::{
    InvoiceRepository, PlanRepository, SubscriptionHistoryRepository, SubscriptionRepository,
};

pub use audit_logger::AuditLogger;
pub use history::HistoryRecorder;
pub use invoice::{InvoicePaidHandler, InvoicePaymentFailedHandler};
pub use payment_intent::{PaymentIntentFailedHandler, PaymentIntentSucceededHandler};
pub use processor::{ProcessOutcome, WebhookProcessor};
pub use router::WebhookRouter;
pub use subscription_lifecycle::{
    SubscriptionDeletedHandler, SubscriptionSyncHandler, TrialWillEndHandler,
};

/// Handler for one or more Stripe event kinds.
///
/// Handlers must be idempotent: applying the same event twice leaves the
/// same state as applying it once.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Returns the event kind(s) this handler processes.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Handles the webhook event.
    ///
    /// Returns the local subscription the event was reconciled against, if
    /// any. Benign misses are returned as `MissingMetadata`,
    /// `EntityNotFound` or `Ignored`.
    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError>;
}

/// The storage ports the reconciliation handlers write through.
#[derive(Clone)]
pub struct BillingRepositories {
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub history: Arc<dyn SubscriptionHistoryRepository>,
}

/// Decodes `data.object` into a typed Stripe object.
fn decode_object<T: DeserializeOwned>(event: &StripeEvent) -> Result<T, WebhookError> {
    event.deserialize_object().map_err(|e| {
        WebhookError::InvalidPayload(format!("{} object: {}", event.event_type, e))
    })
}
