//! Webhook processor - Orchestrates idempotent webhook event handling.
//!
//! The processor follows these steps:
//! 1. Check if the event already has a final audit record (duplicate delivery)
//! 2. Route to the handler for the event kind
//! 3. Record the processing outcome (success, ignored, or error)
//!
//! Handler failures are audited and acknowledged; only a storage failure
//! before dispatch surfaces as an error, so Stripe redelivers.

use std::sync::Arc;

use crate::domain::webhook::{StripeEvent, WebhookError, WebhookEventRecord};
use crate::ports::WebhookEventRepository;

use super::{AuditLogger, WebhookRouter};

/// What happened to a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Handler ran and succeeded.
    Processed,
    /// Acknowledged without effect (benign miss or unhandled kind).
    Ignored,
    /// Handler failed; the failure is audited.
    Failed,
    /// A final audit record already existed; the handler was not re-run.
    Duplicate,
}

impl ProcessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessOutcome::Processed => "processed",
            ProcessOutcome::Ignored => "ignored",
            ProcessOutcome::Failed => "failed",
            ProcessOutcome::Duplicate => "duplicate",
        }
    }
}

/// Processes verified webhook events.
pub struct WebhookProcessor {
    router: WebhookRouter,
    events: Arc<dyn WebhookEventRepository>,
    audit: AuditLogger,
    /// Mode of the configured API key; mismatching events are logged.
    expected_livemode: Option<bool>,
}

impl WebhookProcessor {
    pub fn new(router: WebhookRouter, events: Arc<dyn WebhookEventRepository>) -> Self {
        let audit = AuditLogger::new(events.clone());
        Self {
            router,
            events,
            audit,
            expected_livemode: None,
        }
    }

    pub fn with_expected_livemode(mut self, livemode: bool) -> Self {
        self.expected_livemode = Some(livemode);
        self
    }

    /// Process a verified event.
    ///
    /// # Errors
    ///
    /// - `Persistence` if the duplicate check could not read the audit log
    pub async fn process(&self, event: &StripeEvent) -> Result<ProcessOutcome, WebhookError> {
        if let Some(expected) = self.expected_livemode {
            if expected != event.livemode {
                tracing::warn!(
                    event_id = %event.id,
                    event_livemode = event.livemode,
                    "Webhook livemode does not match configured API key"
                );
            }
        }

        if let Some(existing) = self.events.find_by_event_id(&event.id).await? {
            if existing.status.is_final() {
                tracing::info!(
                    event_id = %event.id,
                    previous_status = %existing.status,
                    "Duplicate webhook delivery, skipping"
                );
                return Ok(ProcessOutcome::Duplicate);
            }
            tracing::info!(
                event_id = %event.id,
                previous_status = %existing.status,
                "Re-running webhook after non-final outcome"
            );
        }

        let kind = event.kind();
        let payload = event.to_json();

        let result = match self.router.route(&kind) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "unhandled event type {}",
                event.event_type
            ))),
        };

        let (record, outcome) = match result {
            Ok(subscription_id) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Webhook processed"
                );
                (
                    WebhookEventRecord::success(&event.id, &event.event_type, payload)
                        .for_subscription(subscription_id),
                    ProcessOutcome::Processed,
                )
            }
            Err(e) if e.is_benign() => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    reason = %e,
                    "Webhook acknowledged without changes"
                );
                (
                    WebhookEventRecord::ignored(&event.id, &event.event_type, e.to_string(), payload),
                    ProcessOutcome::Ignored,
                )
            }
            Err(e) => {
                tracing::error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %e,
                    "Webhook handler failed"
                );
                (
                    WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string(), payload),
                    ProcessOutcome::Failed,
                )
            }
        };

        self.audit.record(record).await;
        Ok(outcome)
    }
}
