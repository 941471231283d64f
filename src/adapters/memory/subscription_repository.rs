//! In-memory SubscriptionRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, UserId};
use crate::ports::SubscriptionRepository;

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    rows: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn stripe_id_taken(
    rows: &HashMap<SubscriptionId, Subscription>,
    subscription: &Subscription,
) -> bool {
    match &subscription.stripe_subscription_id {
        None => false,
        Some(stripe_id) => rows.values().any(|row| {
            row.id != subscription.id && row.stripe_subscription_id.as_ref() == Some(stripe_id)
        }),
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&subscription.id) || stripe_id_taken(&rows, subscription) {
            return Err(DomainError::new(
                ErrorCode::DuplicateExternalId,
                "Subscription already exists",
            )
            .with_detail("subscription_id", subscription.id.to_string()));
        }
        rows.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", subscription.id),
            ));
        }
        if stripe_id_taken(&rows, subscription) {
            return Err(DomainError::new(
                ErrorCode::DuplicateExternalId,
                "Stripe subscription id already linked",
            ));
        }
        rows.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|row| row.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
            .cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows = self.rows.read().await;
        let mut found: Vec<Subscription> = rows
            .values()
            .filter(|row| &row.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
