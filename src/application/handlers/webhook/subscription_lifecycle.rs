//! Subscription lifecycle handlers.
//!
//! All three look the local row up by Stripe subscription id and never
//! create one: rows originate from the purchase flow.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::webhook::{epoch, StripeEvent, StripeEventType, StripeSubscription, WebhookError};
use crate::ports::{PlanRepository, SubscriptionRepository};

use super::{decode_object, HistoryRecorder, WebhookEventHandler};

async fn load_by_stripe_id(
    subscriptions: &dyn SubscriptionRepository,
    stripe_subscription_id: &str,
) -> Result<Subscription, WebhookError> {
    subscriptions
        .find_by_stripe_subscription_id(stripe_subscription_id)
        .await?
        .ok_or_else(|| {
            WebhookError::EntityNotFound(format!("subscription {}", stripe_subscription_id))
        })
}

/// Handles `customer.subscription.created` and `.updated` by copying
/// Stripe's view of the subscription onto the local row.
pub struct SubscriptionSyncHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
    history: HistoryRecorder,
}

impl SubscriptionSyncHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
        history: HistoryRecorder,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            history,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionSyncHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::SubscriptionCreated,
            StripeEventType::SubscriptionUpdated,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let remote: StripeSubscription = decode_object(event)?;
        let snapshot = remote.to_snapshot()?;
        let mut subscription = load_by_stripe_id(self.subscriptions.as_ref(), &remote.id).await?;
        let before = subscription.state();

        let changes = subscription.sync_from(&snapshot);

        if let Some((old_price, new_price)) = &changes.price_change {
            tracing::info!(
                subscription_id = %subscription.id,
                old_price = ?old_price,
                new_price = %new_price,
                "Subscription price changed"
            );
            if let Some(plan) = self.plans.find_by_stripe_price_id(new_price).await? {
                subscription.change_plan(plan.id.to_string());
            }
        }

        self.subscriptions.update(&subscription).await?;
        self.history.record(&subscription, &before, None, event).await;

        tracing::info!(
            subscription_id = %subscription.id,
            stripe_subscription_id = %remote.id,
            previous_status = %changes.previous_status,
            status = %subscription.status,
            "Subscription synced from Stripe"
        );

        Ok(Some(subscription.id))
    }
}

/// Handles `customer.subscription.deleted`.
pub struct SubscriptionDeletedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    history: HistoryRecorder,
}

impl SubscriptionDeletedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, history: HistoryRecorder) -> Self {
        Self {
            subscriptions,
            history,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionDeletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::SubscriptionDeleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let remote: StripeSubscription = decode_object(event)?;
        let mut subscription = load_by_stripe_id(self.subscriptions.as_ref(), &remote.id).await?;
        let before = subscription.state();

        subscription.cancel(epoch(remote.canceled_at, "canceled_at")?);

        self.subscriptions.update(&subscription).await?;
        self.history.record(&subscription, &before, None, event).await;

        tracing::info!(
            subscription_id = %subscription.id,
            stripe_subscription_id = %remote.id,
            "Subscription canceled"
        );

        Ok(Some(subscription.id))
    }
}

/// Handles `customer.subscription.trial_will_end`. Lookup only.
pub struct TrialWillEndHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl TrialWillEndHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl WebhookEventHandler for TrialWillEndHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::TrialWillEnd]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let remote: StripeSubscription = decode_object(event)?;
        let subscription = load_by_stripe_id(self.subscriptions.as_ref(), &remote.id).await?;

        let trial_end = epoch(remote.trial_end, "trial_end")?.or(subscription.trial_end);
        let days_left = trial_end
            .map(|end| end.duration_since(&Timestamp::now()).num_days().max(0))
            .unwrap_or(0);

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user_id,
            days_left = days_left,
            "Trial ending soon"
        );

        Ok(Some(subscription.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::webhook::test_support::Stores;
    use crate::domain::billing::{BillingInterval, HistoryAction, Plan, SubscriptionStatus};
    use crate::domain::foundation::UserId;
    use crate::domain::webhook::StripeEventBuilder;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn sync_handler(stores: &Stores) -> SubscriptionSyncHandler {
        SubscriptionSyncHandler::new(
            stores.subscriptions.clone(),
            stores.plans.clone(),
            HistoryRecorder::new(stores.history.clone()),
        )
    }

    fn subscription_event(event_type: &str, object: serde_json::Value) -> StripeEvent {
        StripeEventBuilder::new()
            .event_type(event_type)
            .object(object)
            .build()
    }

    async fn stored_subscription(stores: &Stores) -> Subscription {
        let sub = Subscription::new(UserId::new(), "basic").with_stripe_ids("cus_1", "sub_1");
        stores.subscriptions.save(&sub).await.unwrap();
        sub
    }

    // ══════════════════════════════════════════════════════════════
    // Created / Updated
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn update_copies_status_and_period() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let event = subscription_event(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "status": "active",
                "current_period_start": 1697408000,
                "current_period_end": 1700000000,
                "cancel_at_period_end": true
            }),
        );

        let linked = sync_handler(&stores).handle(&event).await.unwrap();

        assert_eq!(linked, Some(sub.id));
        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert!(stored.cancel_at_period_end);
        assert_eq!(
            stored.current_period_end.unwrap().as_datetime().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[tokio::test]
    async fn update_without_period_keeps_stored_period() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let handler = sync_handler(&stores);
        let with_period = subscription_event(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "status": "active",
                "current_period_start": 1697408000,
                "current_period_end": 1700000000
            }),
        );
        let without_period = subscription_event(
            "customer.subscription.updated",
            json!({"id": "sub_1", "status": "past_due"}),
        );

        handler.handle(&with_period).await.unwrap();
        handler.handle(&without_period).await.unwrap();

        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::PastDue);
        assert_eq!(
            stored.current_period_start.map(|t| t.as_unix_secs()),
            Some(1_697_408_000)
        );
        assert_eq!(
            stored.current_period_end.map(|t| t.as_unix_secs()),
            Some(1_700_000_000)
        );
    }

    #[tokio::test]
    async fn price_change_to_known_plan_switches_plan() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let plan = Plan::new("Pro", Decimal::new(2999, 2), BillingInterval::Month)
            .with_stripe_price("price_pro");
        stores.plans.save(&plan).await.unwrap();
        let event = subscription_event(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "status": "active",
                "items": {"data": [{"price": {"id": "price_pro"}}]}
            }),
        );

        sync_handler(&stores).handle(&event).await.unwrap();

        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.stripe_price_id.as_deref(), Some("price_pro"));
        assert_eq!(stored.plan_id, plan.id.to_string());
    }

    #[tokio::test]
    async fn price_change_to_unmapped_price_keeps_plan() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let event = subscription_event(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "status": "active",
                "items": {"data": [{"price": {"id": "price_unmapped"}}]}
            }),
        );

        sync_handler(&stores).handle(&event).await.unwrap();

        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.stripe_price_id.as_deref(), Some("price_unmapped"));
        assert_eq!(stored.plan_id, "basic");
    }

    #[tokio::test]
    async fn unknown_stripe_subscription_creates_nothing() {
        let stores = Stores::new();
        let event = subscription_event(
            "customer.subscription.updated",
            json!({"id": "sub_missing", "status": "active"}),
        );

        let err = sync_handler(&stores).handle(&event).await.unwrap_err();

        assert!(matches!(err, WebhookError::EntityNotFound(_)));
        assert!(stores.subscriptions.is_empty().await);
    }

    #[tokio::test]
    async fn created_event_uses_same_sync() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let event = subscription_event(
            "customer.subscription.created",
            json!({"id": "sub_1", "status": "trialing", "trial_end": 1700000000}),
        );

        sync_handler(&stores).handle(&event).await.unwrap();

        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert!(stored.is_trial());
        assert_eq!(stored.trial_end.map(|t| t.as_unix_secs()), Some(1_700_000_000));
    }

    // ══════════════════════════════════════════════════════════════
    // Deleted
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn delete_cancels_and_stamps_time() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let handler = SubscriptionDeletedHandler::new(
            stores.subscriptions.clone(),
            HistoryRecorder::new(stores.history.clone()),
        );
        let event = subscription_event(
            "customer.subscription.deleted",
            json!({"id": "sub_1", "status": "canceled", "canceled_at": 1700000000}),
        );

        handler.handle(&event).await.unwrap();

        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Canceled);
        assert_eq!(stored.canceled_at.map(|t| t.as_unix_secs()), Some(1_700_000_000));
        let history = stores.history.all().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, HistoryAction::Canceled);
    }

    // ══════════════════════════════════════════════════════════════
    // Trial Will End
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn trial_will_end_links_without_mutating() {
        let stores = Stores::new();
        let sub = stored_subscription(&stores).await;
        let handler = TrialWillEndHandler::new(stores.subscriptions.clone());
        let event = subscription_event(
            "customer.subscription.trial_will_end",
            json!({"id": "sub_1", "status": "trialing"}),
        );

        let linked = handler.handle(&event).await.unwrap();

        assert_eq!(linked, Some(sub.id));
        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored, sub);
    }
}
