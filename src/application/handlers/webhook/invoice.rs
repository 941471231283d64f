//! Invoice handlers.
//!
//! Both upsert the invoice by Stripe id, then touch the linked local
//! subscription if one exists. A missing subscription is not an error.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::billing::Invoice;
use crate::domain::foundation::{from_minor_units, Currency, SubscriptionId, Timestamp};
use crate::domain::webhook::{StripeEvent, StripeEventType, StripeInvoice, WebhookError};
use crate::ports::{InvoiceRepository, SubscriptionRepository};

use super::{decode_object, HistoryRecorder, WebhookEventHandler};

/// Builds the local invoice fields shared by both handlers.
fn invoice_from_stripe(remote: &StripeInvoice, amount: Decimal) -> Result<Invoice, WebhookError> {
    let currency = match remote.currency.as_deref() {
        Some(code) => Currency::new(code).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?,
        None => Currency::usd(),
    };

    let mut invoice = Invoice::new(&remote.id, amount, currency);
    invoice.stripe_customer_id = remote.customer.clone();
    invoice.stripe_subscription_id = remote.subscription.clone();
    invoice.customer_email = remote.customer_email.clone();
    invoice.description = remote.description.clone();
    if let Some(metadata) = &remote.metadata {
        invoice.metadata = metadata.clone();
    }
    Ok(invoice)
}

/// Handles `invoice.payment_succeeded`.
pub struct InvoicePaidHandler {
    invoices: Arc<dyn InvoiceRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl InvoicePaidHandler {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            invoices,
            subscriptions,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for InvoicePaidHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::InvoicePaid]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let remote: StripeInvoice = decode_object(event)?;
        let paid_at = remote.paid_at()?.unwrap_or_else(Timestamp::now);

        let invoice =
            invoice_from_stripe(&remote, from_minor_units(remote.amount_paid))?.mark_paid(paid_at);
        let outcome = self.invoices.upsert(&invoice).await?;

        tracing::info!(
            stripe_invoice_id = %remote.id,
            amount = %invoice.amount,
            currency = %invoice.currency,
            outcome = ?outcome,
            "Invoice paid"
        );

        let Some(stripe_subscription_id) = remote.subscription.as_deref() else {
            return Ok(None);
        };
        match self
            .subscriptions
            .find_by_stripe_subscription_id(stripe_subscription_id)
            .await?
        {
            Some(mut subscription) => {
                subscription.record_invoice_paid(paid_at);
                self.subscriptions.update(&subscription).await?;
                Ok(Some(subscription.id))
            }
            None => {
                tracing::debug!(
                    stripe_subscription_id = %stripe_subscription_id,
                    "Paid invoice references no local subscription"
                );
                Ok(None)
            }
        }
    }
}

/// Handles `invoice.payment_failed`.
pub struct InvoicePaymentFailedHandler {
    invoices: Arc<dyn InvoiceRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    history: HistoryRecorder,
}

impl InvoicePaymentFailedHandler {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        history: HistoryRecorder,
    ) -> Self {
        Self {
            invoices,
            subscriptions,
            history,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for InvoicePaymentFailedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::InvoicePaymentFailed]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
        let remote: StripeInvoice = decode_object(event)?;

        let invoice = invoice_from_stripe(&remote, from_minor_units(remote.amount_due))?
            .mark_payment_failed(Timestamp::now());
        self.invoices.upsert(&invoice).await?;

        tracing::info!(
            stripe_invoice_id = %remote.id,
            amount_due = %invoice.amount,
            "Invoice payment failed"
        );

        let Some(stripe_subscription_id) = remote.subscription.as_deref() else {
            return Ok(None);
        };
        let Some(mut subscription) = self
            .subscriptions
            .find_by_stripe_subscription_id(stripe_subscription_id)
            .await?
        else {
            tracing::debug!(
                stripe_subscription_id = %stripe_subscription_id,
                "Failed invoice references no local subscription"
            );
            return Ok(None);
        };

        let before = subscription.state();
        subscription.mark_past_due();
        self.subscriptions.update(&subscription).await?;
        self.history.record(&subscription, &before, None, event).await;

        Ok(Some(subscription.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::webhook::test_support::Stores;
    use crate::domain::billing::{InvoiceStatus, Subscription, SubscriptionStatus};
    use crate::domain::foundation::UserId;
    use crate::domain::webhook::StripeEventBuilder;
    use serde_json::json;
    use std::str::FromStr;

    fn paid_handler(stores: &Stores) -> InvoicePaidHandler {
        InvoicePaidHandler::new(stores.invoices.clone(), stores.subscriptions.clone())
    }

    fn failed_handler(stores: &Stores) -> InvoicePaymentFailedHandler {
        InvoicePaymentFailedHandler::new(
            stores.invoices.clone(),
            stores.subscriptions.clone(),
            HistoryRecorder::new(stores.history.clone()),
        )
    }

    fn invoice_event(event_type: &str, object: serde_json::Value) -> StripeEvent {
        StripeEventBuilder::new()
            .event_type(event_type)
            .object(object)
            .build()
    }

    // ══════════════════════════════════════════════════════════════
    // Invoice Paid
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn paid_invoice_stores_exact_amount() {
        let stores = Stores::new();
        let event = invoice_event(
            "invoice.payment_succeeded",
            json!({
                "id": "in_1",
                "customer": "cus_1",
                "customer_email": "jane@example.com",
                "amount_paid": 2599,
                "currency": "usd",
                "status_transitions": {"paid_at": 1700000000}
            }),
        );

        let linked = paid_handler(&stores).handle(&event).await.unwrap();

        assert_eq!(linked, None);
        let stored = stores.invoices.find_by_stripe_invoice_id("in_1").await.unwrap().unwrap();
        assert_eq!(stored.amount, Decimal::from_str("25.99").unwrap());
        assert_eq!(stored.currency.as_str(), "usd");
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.paid_at.map(|t| t.as_unix_secs()), Some(1_700_000_000));
        assert_eq!(stored.customer_email.as_deref(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn missing_currency_defaults_to_usd() {
        let stores = Stores::new();
        let event = invoice_event(
            "invoice.payment_succeeded",
            json!({"id": "in_1", "amount_paid": 100}),
        );

        paid_handler(&stores).handle(&event).await.unwrap();

        let stored = stores.invoices.find_by_stripe_invoice_id("in_1").await.unwrap().unwrap();
        assert_eq!(stored.currency, Currency::usd());
        assert!(stored.paid_at.is_some());
    }

    #[tokio::test]
    async fn redelivery_updates_single_row() {
        let stores = Stores::new();
        let event = invoice_event(
            "invoice.payment_succeeded",
            json!({"id": "in_1", "amount_paid": 2599}),
        );

        paid_handler(&stores).handle(&event).await.unwrap();
        paid_handler(&stores).handle(&event).await.unwrap();

        assert_eq!(stores.invoices.len().await, 1);
    }

    #[tokio::test]
    async fn paid_invoice_stamps_linked_subscription() {
        let stores = Stores::new();
        let sub = Subscription::new(UserId::new(), "pro").with_stripe_ids("cus_1", "sub_1");
        stores.subscriptions.save(&sub).await.unwrap();
        let event = invoice_event(
            "invoice.payment_succeeded",
            json!({
                "id": "in_1",
                "subscription": "sub_1",
                "amount_paid": 2599,
                "status_transitions": {"paid_at": 1700000000}
            }),
        );

        let linked = paid_handler(&stores).handle(&event).await.unwrap();

        assert_eq!(linked, Some(sub.id));
        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(
            stored.last_invoice_paid_at.map(|t| t.as_unix_secs()),
            Some(1_700_000_000)
        );
    }

    #[tokio::test]
    async fn bad_currency_is_invalid_payload() {
        let stores = Stores::new();
        let event = invoice_event(
            "invoice.payment_succeeded",
            json!({"id": "in_1", "amount_paid": 100, "currency": "dollars"}),
        );

        let err = paid_handler(&stores).handle(&event).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidPayload(_)));
        assert!(stores.invoices.is_empty().await);
    }

    // ══════════════════════════════════════════════════════════════
    // Invoice Payment Failed
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn failed_invoice_uses_amount_due_and_marks_subscription() {
        let stores = Stores::new();
        let mut sub = Subscription::new(UserId::new(), "pro").with_stripe_ids("cus_1", "sub_1");
        sub.status = SubscriptionStatus::Active;
        stores.subscriptions.save(&sub).await.unwrap();
        let event = invoice_event(
            "invoice.payment_failed",
            json!({"id": "in_2", "subscription": "sub_1", "amount_due": 4999, "amount_paid": 0}),
        );

        failed_handler(&stores).handle(&event).await.unwrap();

        let invoice = stores.invoices.find_by_stripe_invoice_id("in_2").await.unwrap().unwrap();
        assert_eq!(invoice.amount, Decimal::from_str("49.99").unwrap());
        assert_eq!(invoice.status, InvoiceStatus::PaymentFailed);
        assert!(invoice.payment_failed_at.is_some());

        let stored = stores.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::PastDue);
        assert_eq!(stores.history.all().await.len(), 1);
    }

    #[tokio::test]
    async fn repeated_failure_keeps_first_failure_time() {
        let stores = Stores::new();
        let event = invoice_event(
            "invoice.payment_failed",
            json!({"id": "in_2", "amount_due": 4999}),
        );

        failed_handler(&stores).handle(&event).await.unwrap();
        let first = stores
            .invoices
            .find_by_stripe_invoice_id("in_2")
            .await
            .unwrap()
            .unwrap()
            .payment_failed_at;
        failed_handler(&stores).handle(&event).await.unwrap();

        let stored = stores.invoices.find_by_stripe_invoice_id("in_2").await.unwrap().unwrap();
        assert_eq!(stored.payment_failed_at, first);
        assert_eq!(stores.history.all().await.len(), 0);
    }
}
