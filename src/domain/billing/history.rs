//! Subscription history trail.
//!
//! Entries are append-only and describe a single status or plan transition.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{HistoryEntryId, SubscriptionId, Timestamp, ValidationError};

use super::SubscriptionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Upgraded,
    Downgraded,
    Canceled,
    Reactivated,
    Renewed,
    PaymentFailed,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Upgraded => "upgraded",
            HistoryAction::Downgraded => "downgraded",
            HistoryAction::Canceled => "canceled",
            HistoryAction::Reactivated => "reactivated",
            HistoryAction::Renewed => "renewed",
            HistoryAction::PaymentFailed => "payment_failed",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(HistoryAction::Created),
            "upgraded" => Ok(HistoryAction::Upgraded),
            "downgraded" => Ok(HistoryAction::Downgraded),
            "canceled" => Ok(HistoryAction::Canceled),
            "reactivated" => Ok(HistoryAction::Reactivated),
            "renewed" => Ok(HistoryAction::Renewed),
            "payment_failed" => Ok(HistoryAction::PaymentFailed),
            other => Err(ValidationError::unknown_variant("history action", other)),
        }
    }
}

/// Direction of an explicit plan change requested at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChangeIntent {
    Upgrade,
    Downgrade,
}

impl PlanChangeIntent {
    /// Parses the `action_type` metadata value. Anything else is not a plan change.
    pub fn from_metadata(value: &str) -> Option<Self> {
        match value {
            "upgrade" => Some(PlanChangeIntent::Upgrade),
            "downgrade" => Some(PlanChangeIntent::Downgrade),
            _ => None,
        }
    }
}

/// A status/plan pair captured before and after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionState {
    pub status: SubscriptionStatus,
    pub plan_id: String,
}

/// Picks the history action for a transition, or `None` if nothing changed.
///
/// An explicit upgrade/downgrade wins over the status-derived action.
pub fn classify_transition(
    before: &SubscriptionState,
    after: &SubscriptionState,
    intent: Option<PlanChangeIntent>,
) -> Option<HistoryAction> {
    let plan_changed = before.plan_id != after.plan_id;
    let status_changed = before.status != after.status;

    if !plan_changed && !status_changed {
        return None;
    }

    if plan_changed {
        match intent {
            Some(PlanChangeIntent::Upgrade) => return Some(HistoryAction::Upgraded),
            Some(PlanChangeIntent::Downgrade) => return Some(HistoryAction::Downgraded),
            None => {}
        }
    }

    if !status_changed {
        return Some(HistoryAction::Renewed);
    }

    use SubscriptionStatus::*;
    let action = match (before.status, after.status) {
        (_, Canceled) => HistoryAction::Canceled,
        (_, PastDue | Unpaid) => HistoryAction::PaymentFailed,
        (Canceled | PastDue | Unpaid | Paused, Active | Trialing) => HistoryAction::Reactivated,
        (Incomplete | IncompleteExpired, Active | Trialing) => HistoryAction::Created,
        _ => HistoryAction::Renewed,
    };
    Some(action)
}

/// One row of the subscription history trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionHistoryEntry {
    pub id: HistoryEntryId,
    pub subscription_id: SubscriptionId,
    pub action: HistoryAction,
    pub old_plan_id: Option<String>,
    pub new_plan_id: Option<String>,
    pub old_status: Option<SubscriptionStatus>,
    pub new_status: Option<SubscriptionStatus>,
    pub reason: Option<String>,
    pub metadata: JsonValue,
    pub created_at: Timestamp,
}

impl SubscriptionHistoryEntry {
    /// Records a transition between two captured states.
    pub fn transition(
        subscription_id: SubscriptionId,
        action: HistoryAction,
        before: &SubscriptionState,
        after: &SubscriptionState,
    ) -> Self {
        Self {
            id: HistoryEntryId::new(),
            subscription_id,
            action,
            old_plan_id: Some(before.plan_id.clone()),
            new_plan_id: Some(after.plan_id.clone()),
            old_status: Some(before.status),
            new_status: Some(after.status),
            reason: None,
            metadata: JsonValue::Object(Default::default()),
            created_at: Timestamp::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}
