//! Subscription history port (append-only).

use async_trait::async_trait;

use crate::domain::billing::SubscriptionHistoryEntry;
use crate::domain::foundation::{DomainError, SubscriptionId};

#[async_trait]
pub trait SubscriptionHistoryRepository: Send + Sync {
    /// Append one entry. Entries are never updated or deleted.
    async fn append(&self, entry: &SubscriptionHistoryEntry) -> Result<(), DomainError>;

    /// Entries for a subscription, oldest first.
    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<SubscriptionHistoryEntry>, DomainError>;
}
