//! Typed views of the Stripe objects carried in `data.object`.
//!
//! Fields are lenient: anything the reconciler does not read is skipped, and
//! optional provider fields default rather than fail the decode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::billing::{SubscriptionSnapshot, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

use super::WebhookError;

// ════════════════════════════════════════════════════════════════════════════════
// PaymentIntent
// ════════════════════════════════════════════════════════════════════════════════

/// Metadata key carrying the local subscription id.
pub const META_SUBSCRIPTION_ID: &str = "subscription_id";
/// Metadata key carrying the target plan on upgrade/downgrade.
pub const META_PACKAGE_ID: &str = "package_id";
/// Metadata key carrying the checkout action (`upgrade`, `downgrade`, ...).
pub const META_ACTION_TYPE: &str = "action_type";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntent {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub last_payment_error: Option<StripePaymentError>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StripePaymentIntent {
    /// Returns a non-empty metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub canceled_at: Option<i64>,
    #[serde(default)]
    pub trial_start: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub items: Option<StripeList<StripeSubscriptionItem>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub price: Option<StripePrice>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePrice {
    pub id: String,
}

impl StripeSubscription {
    /// Price id of the first subscription item, if any.
    pub fn first_price_id(&self) -> Option<&str> {
        self.items
            .as_ref()?
            .data
            .first()?
            .price
            .as_ref()
            .map(|p| p.id.as_str())
    }

    /// Converts the provider object into the state copied onto a local record.
    pub fn to_snapshot(&self) -> Result<SubscriptionSnapshot, WebhookError> {
        let status: SubscriptionStatus = self
            .status
            .parse()
            .map_err(|e| WebhookError::InvalidPayload(format!("{}", e)))?;

        Ok(SubscriptionSnapshot {
            status,
            current_period_start: epoch(self.current_period_start, "current_period_start")?,
            current_period_end: epoch(self.current_period_end, "current_period_end")?,
            cancel_at_period_end: self.cancel_at_period_end,
            canceled_at: epoch(self.canceled_at, "canceled_at")?,
            trial_start: epoch(self.trial_start, "trial_start")?,
            trial_end: epoch(self.trial_end, "trial_end")?,
            price_id: self.first_price_id().map(str::to_string),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoice
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoice {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status_transitions: Option<StripeStatusTransitions>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeStatusTransitions {
    #[serde(default)]
    pub paid_at: Option<i64>,
}

impl StripeInvoice {
    /// Paid time reported by Stripe, if any.
    pub fn paid_at(&self) -> Result<Option<Timestamp>, WebhookError> {
        epoch(
            self.status_transitions.as_ref().and_then(|t| t.paid_at),
            "status_transitions.paid_at",
        )
    }
}

/// Converts optional epoch seconds, rejecting unrepresentable values.
pub fn epoch(secs: Option<i64>, field: &str) -> Result<Option<Timestamp>, WebhookError> {
    match secs {
        None => Ok(None),
        Some(secs) => Timestamp::from_unix_secs(secs)
            .map(Some)
            .ok_or_else(|| WebhookError::InvalidPayload(format!("{} out of range", field))),
    }
}
