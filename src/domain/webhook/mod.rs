//! Webhook module - Stripe webhook ingestion types.
//!
//! Contains the event envelope, typed payload objects, signature
//! verification, error semantics and the audit record.

mod audit;
mod stripe_event;
mod stripe_objects;
mod webhook_errors;
mod webhook_verifier;

pub use audit::{AuditStatus, WebhookEventRecord};
#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use stripe_objects::{
    epoch, StripeInvoice, StripeList, StripePaymentError, StripePaymentIntent, StripePrice,
    StripeStatusTransitions, StripeSubscription, StripeSubscriptionItem, META_ACTION_TYPE,
    META_PACKAGE_ID, META_SUBSCRIPTION_ID,
};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{
    sign_payload, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS,
};
