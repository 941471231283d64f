//! Payment intent handlers.
//!
//! Payment intents carry the local subscription id in their metadata, set
//! when checkout created the intent.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::billing::{PlanChangeIntent, Subscription};
use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::webhook::{
    StripeEvent, StripeEventType, StripePaymentIntent, WebhookError, META_ACTION_TYPE,
    META_PACKAGE_ID, META_SUBSCRIPTION_ID,
};
use crate::ports::SubscriptionRepository;

use super::{decode_object, HistoryRecorder, WebhookEventHandler};

/// Resolves the subscription referenced by `metadata.subscription_id`.
async fn load_from_metadata(
    subscriptions: &dyn SubscriptionRepository,
    intent: &StripePaymentIntent,
) -> Result<Subscription, WebhookError> {
    let raw_id = intent
        .metadata_value(META_SUBSCRIPTION_ID)
        .ok_or(WebhookError::MissingMetadata(META_SUBSCRIPTION_ID))?;

    let id: SubscriptionId = raw_id
        .parse()
        .map_err(|_| WebhookError::EntityNotFound(format!("subscription {}", raw_id)))?;

    subscriptions
        .find_by_id(&id)
        .await?
        .ok_or_else(|| WebhookError::EntityNotFound(format!("subscription {}", id)))
}

/// Handles `payment_intent.succeeded`: activates the subscription and
/// applies a plan change requested at checkout.
pub struct PaymentIntentSucceededHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    history: HistoryRecorder,
}

impl PaymentIntentSucceededHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, history: HistoryRecorder) -> Self {
        Self {
            subscriptions,
            history,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentIntentSucceededHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::PaymentIntentSucceeded]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let intent: StripePaymentIntent = decode_object(event)?;
        let mut subscription = load_from_metadata(self.subscriptions.as_ref(), &intent).await?;
        let before = subscription.state();

        subscription.record_payment(&intent.id, Timestamp::now());

        let plan_change = intent
            .metadata_value(META_ACTION_TYPE)
            .and_then(PlanChangeIntent::from_metadata);
        let package_id = intent.metadata_value(META_PACKAGE_ID);
        if let (Some(_), Some(package_id)) = (plan_change, package_id) {
            subscription.change_plan(package_id);
        }

        self.subscriptions.update(&subscription).await?;
        self.history
            .record(&subscription, &before, plan_change, event)
            .await;

        tracing::info!(
            subscription_id = %subscription.id,
            payment_intent_id = %intent.id,
            plan_id = %subscription.plan_id,
            "Payment succeeded, subscription activated"
        );

        Ok(Some(subscription.id))
    }
}

/// Handles `payment_intent.payment_failed`: marks the subscription past due.
pub struct PaymentIntentFailedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    history: HistoryRecorder,
}

impl PaymentIntentFailedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, history: HistoryRecorder) -> Self {
        Self {
            subscriptions,
            history,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentIntentFailedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::PaymentIntentFailed]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let intent: StripePaymentIntent = decode_object(event)?;
        let mut subscription = load_from_metadata(self.subscriptions.as_ref(), &intent).await?;
        let before = subscription.state();

        subscription.mark_past_due();

        self.subscriptions.update(&subscription).await?;
        self.history.record(&subscription, &before, None, event).await;

        let reason = intent
            .last_payment_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .unwrap_or("unknown");
        tracing::info!(
            subscription_id = %subscription.id,
            payment_intent_id = %intent.id,
            reason = reason,
            "Payment failed, subscription marked past due"
        );

        Ok(Some(subscription.id))
    }
}
