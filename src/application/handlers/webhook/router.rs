//! Event router - maps an event kind to its reconciliation handler.
//!
//! Pure table lookup; no I/O. Unknown kinds have no route and are left to
//! the processor to acknowledge.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::webhook::StripeEventType;

use super::{
    BillingRepositories, HistoryRecorder, InvoicePaidHandler, InvoicePaymentFailedHandler,
    PaymentIntentFailedHandler, PaymentIntentSucceededHandler, SubscriptionDeletedHandler,
    SubscriptionSyncHandler, TrialWillEndHandler, WebhookEventHandler,
};

/// Dispatch table from event kind to handler.
#[derive(Clone, Default)]
pub struct WebhookRouter {
    routes: HashMap<StripeEventType, Arc<dyn WebhookEventHandler>>,
}

impl WebhookRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with a handler for every known event kind.
    pub fn with_default_handlers(repos: &BillingRepositories) -> Self {
        let history = HistoryRecorder::new(repos.history.clone());

        Self::new()
            .register(Arc::new(PaymentIntentSucceededHandler::new(
                repos.subscriptions.clone(),
                history.clone(),
            )))
            .register(Arc::new(PaymentIntentFailedHandler::new(
                repos.subscriptions.clone(),
                history.clone(),
            )))
            .register(Arc::new(SubscriptionSyncHandler::new(
                repos.subscriptions.clone(),
                repos.plans.clone(),
                history.clone(),
            )))
            .register(Arc::new(SubscriptionDeletedHandler::new(
                repos.subscriptions.clone(),
                history.clone(),
            )))
            .register(Arc::new(InvoicePaidHandler::new(
                repos.invoices.clone(),
                repos.subscriptions.clone(),
            )))
            .register(Arc::new(InvoicePaymentFailedHandler::new(
                repos.invoices.clone(),
                repos.subscriptions.clone(),
                history,
            )))
            .register(Arc::new(TrialWillEndHandler::new(repos.subscriptions.clone())))
    }

    /// Registers a handler for every kind it reports. Later registrations win.
    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        for kind in handler.handles() {
            self.routes.insert(kind, handler.clone());
        }
        self
    }

    /// Looks up the handler for an event kind.
    pub fn route(&self, kind: &StripeEventType) -> Option<Arc<dyn WebhookEventHandler>> {
        self.routes.get(kind).cloned()
    }

    /// Kinds with a registered handler.
    pub fn routed_kinds(&self) -> Vec<StripeEventType> {
        self.routes.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::webhook::test_support::Stores;
    use crate::domain::foundation::SubscriptionId;
    use crate::domain::webhook::{StripeEvent, WebhookError};
    use async_trait::async_trait;

    struct NamedHandler {
        kinds: Vec<StripeEventType>,
    }

    #[async_trait]
    impl WebhookEventHandler for NamedHandler {
        fn handles(&self) -> Vec<StripeEventType> {
            self.kinds.clone()
        }

        async fn handle(&self, _event: &StripeEvent) -> Result<Option<SubscriptionId>, WebhookError> {
            Ok(None)
        }
    }

    #[test]
    fn default_router_covers_every_known_kind() {
        let stores = Stores::new();
        let router = WebhookRouter::with_default_handlers(&stores.repositories());

        for kind in StripeEventType::KNOWN {
            assert!(router.route(&kind).is_some(), "no route for {}", kind);
        }
        assert_eq!(router.routed_kinds().len(), StripeEventType::KNOWN.len());
    }

    #[test]
    fn unknown_kind_has_no_route() {
        let stores = Stores::new();
        let router = WebhookRouter::with_default_handlers(&stores.repositories());

        let kind = StripeEventType::Unknown("charge.refunded".to_string());
        assert!(router.route(&kind).is_none());
    }

    #[test]
    fn one_handler_can_serve_several_kinds() {
        let handler = Arc::new(NamedHandler {
            kinds: vec![
                StripeEventType::SubscriptionCreated,
                StripeEventType::SubscriptionUpdated,
            ],
        });

        let router = WebhookRouter::new().register(handler);

        assert!(router.route(&StripeEventType::SubscriptionCreated).is_some());
        assert!(router.route(&StripeEventType::SubscriptionUpdated).is_some());
        assert!(router.route(&StripeEventType::InvoicePaid).is_none());
    }
}
