//! Application layer - Handlers that orchestrate domain operations.
//!
//! This layer coordinates between the webhook domain types and the storage
//! ports. It owns no I/O of its own.

pub mod handlers;

pub use handlers::webhook::{
    AuditLogger, BillingRepositories, ProcessOutcome, WebhookEventHandler, WebhookProcessor,
    WebhookRouter,
};
