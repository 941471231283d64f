//! Webhook audit records.
//!
//! One record per processed delivery, keyed by Stripe event id. Records are
//! append-only; a redelivery never overwrites the first outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{SubscriptionId, Timestamp, ValidationError};

/// Outcome of processing a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Error,
    Pending,
    /// Acknowledged without effect: benign miss or unhandled type.
    Ignored,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Error => "error",
            AuditStatus::Pending => "pending",
            AuditStatus::Ignored => "ignored",
        }
    }

    /// Returns true if a redelivery must not re-run the handler.
    pub fn is_final(&self) -> bool {
        matches!(self, AuditStatus::Success | AuditStatus::Ignored)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditStatus::Success),
            "error" => Ok(AuditStatus::Error),
            "pending" => Ok(AuditStatus::Pending),
            "ignored" => Ok(AuditStatus::Ignored),
            other => Err(ValidationError::unknown_variant("audit status", other)),
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Stripe event type string, as received.
    pub event_type: String,

    /// Local subscription the event was reconciled against, if any.
    pub subscription_id: Option<SubscriptionId>,

    pub status: AuditStatus,

    /// Error or ignore reason.
    pub error_message: Option<String>,

    /// Original event payload for debugging.
    pub payload: serde_json::Value,

    pub processed_at: Timestamp,
    pub created_at: Timestamp,
}

impl WebhookEventRecord {
    fn with_status(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        status: AuditStatus,
        error_message: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            subscription_id: None,
            status,
            error_message,
            payload,
            processed_at: now,
            created_at: now,
        }
    }

    /// Creates a new success record.
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_status(event_id, event_type, AuditStatus::Success, None, payload)
    }

    /// Creates a new ignored record.
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_status(
            event_id,
            event_type,
            AuditStatus::Ignored,
            Some(reason.into()),
            payload,
        )
    }

    /// Creates a new failure record.
    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_status(
            event_id,
            event_type,
            AuditStatus::Error,
            Some(error.into()),
            payload,
        )
    }

    /// Links the record to a local subscription.
    pub fn for_subscription(mut self, subscription_id: Option<SubscriptionId>) -> Self {
        self.subscription_id = subscription_id;
        self
    }
}
