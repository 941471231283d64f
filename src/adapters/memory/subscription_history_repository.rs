//! In-memory SubscriptionHistoryRepository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::SubscriptionHistoryEntry;
use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::ports::SubscriptionHistoryRepository;

#[derive(Default)]
pub struct InMemorySubscriptionHistoryRepository {
    entries: RwLock<Vec<SubscriptionHistoryEntry>>,
}

impl InMemorySubscriptionHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, in append order.
    pub async fn all(&self) -> Vec<SubscriptionHistoryEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl SubscriptionHistoryRepository for InMemorySubscriptionHistoryRepository {
    async fn append(&self, entry: &SubscriptionHistoryEntry) -> Result<(), DomainError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<SubscriptionHistoryEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| &e.subscription_id == subscription_id)
            .cloned()
            .collect())
    }
}
