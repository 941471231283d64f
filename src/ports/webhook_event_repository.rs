//! WebhookEventRepository port - Audit log of processed Stripe webhooks.
//!
//! Stores the outcome, payload and linked subscription of every processed
//! delivery, keyed by Stripe event id. The same table backs the duplicate
//! delivery check.
//!
//! Stripe may deliver the same webhook multiple times, so all webhook
//! handlers MUST be idempotent.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::WebhookEventRecord;

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations should use database constraints (UNIQUE on event_id)
/// to prevent race conditions during concurrent webhook processing.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously processed event by its Stripe event ID.
    ///
    /// Returns `None` if the event hasn't been processed yet.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempt to save a webhook event record.
    ///
    /// Uses `ON CONFLICT DO NOTHING` semantics to handle race conditions.
    /// Returns `SaveResult::Inserted` if this is the first time seeing the event,
    /// or `SaveResult::AlreadyExists` if another delivery already inserted it.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Delete records processed before the given time.
    ///
    /// Returns the number of records deleted.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}
