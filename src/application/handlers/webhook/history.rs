//! Appends subscription history entries on status and plan changes.

use std::sync::Arc;

use crate::domain::billing::{
    classify_transition, PlanChangeIntent, Subscription, SubscriptionHistoryEntry,
    SubscriptionState,
};
use crate::domain::webhook::StripeEvent;
use crate::ports::SubscriptionHistoryRepository;

/// Records history for handler mutations. Write failures are logged only.
#[derive(Clone)]
pub struct HistoryRecorder {
    repository: Arc<dyn SubscriptionHistoryRepository>,
}

impl HistoryRecorder {
    pub fn new(repository: Arc<dyn SubscriptionHistoryRepository>) -> Self {
        Self { repository }
    }

    /// Appends an entry if `before` and the subscription's current state differ.
    pub async fn record(
        &self,
        subscription: &Subscription,
        before: &SubscriptionState,
        intent: Option<PlanChangeIntent>,
        event: &StripeEvent,
    ) {
        let after = subscription.state();
        let Some(action) = classify_transition(before, &after, intent) else {
            return;
        };

        let entry = SubscriptionHistoryEntry::transition(subscription.id, action, before, &after)
            .with_reason(format!("stripe webhook {}", event.event_type))
            .with_metadata(serde_json::json!({ "event_id": event.id }));

        if let Err(e) = self.repository.append(&entry).await {
            tracing::error!(
                subscription_id = %subscription.id,
                action = %action,
                error = %e,
                "Failed to append subscription history"
            );
        }
    }
}
