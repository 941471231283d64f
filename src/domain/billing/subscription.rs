//! Subscription entity.
//!
//! A Subscription is the local mirror of a user's Stripe billing
//! relationship. Rows are created when a purchase starts locally and are
//! mutated by every subscription-related webhook; they are never deleted,
//! `canceled` marks end of life.
//!
//! # Invariants
//!
//! - `stripe_subscription_id` is unique when present (enforced by storage)
//! - `updated_at` moves forward on every mutation

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};

use super::{SubscriptionState, SubscriptionStatus};

/// Local subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,

    /// Internal plan identifier.
    pub plan_id: String,

    pub status: SubscriptionStatus,

    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,

    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,

    pub cancel_at_period_end: bool,
    pub canceled_at: Option<Timestamp>,

    pub last_payment_at: Option<Timestamp>,
    pub last_invoice_paid_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Provider-side subscription state copied onto the local record.
///
/// Built by the webhook layer from a Stripe subscription object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub status: SubscriptionStatus,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<Timestamp>,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
    /// Price of the first subscription item, if the payload listed items.
    pub price_id: Option<String>,
}

/// What a snapshot sync changed, for logging and history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncChanges {
    pub previous_status: SubscriptionStatus,
    /// `(old, new)` price ids when the first item's price differs.
    pub price_change: Option<(Option<String>, String)>,
}

impl Subscription {
    /// Creates a subscription when a purchase is initiated locally.
    ///
    /// The Stripe identifiers are attached later by the purchase flow.
    pub fn new(user_id: UserId, plan_id: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan_id: plan_id.into(),
            status: SubscriptionStatus::Incomplete,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            stripe_price_id: None,
            stripe_payment_intent_id: None,
            current_period_start: None,
            current_period_end: None,
            trial_start: None,
            trial_end: None,
            cancel_at_period_end: false,
            canceled_at: None,
            last_payment_at: None,
            last_invoice_paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches the Stripe customer and subscription identifiers.
    pub fn with_stripe_ids(
        mut self,
        customer_id: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        self.stripe_customer_id = Some(customer_id.into());
        self.stripe_subscription_id = Some(subscription_id.into());
        self
    }

    /// Returns true if the subscription currently grants access.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true while the subscription is in its trial period.
    pub fn is_trial(&self) -> bool {
        self.status == SubscriptionStatus::Trialing
    }

    /// Whole days until the current period ends, floored at zero.
    ///
    /// Returns 0 when the period end is unknown.
    pub fn days_until_renewal(&self, now: Timestamp) -> i64 {
        self.current_period_end
            .map(|end| end.duration_since(&now).num_days().max(0))
            .unwrap_or(0)
    }

    /// Captures the fields tracked by the history trail.
    pub fn state(&self) -> SubscriptionState {
        SubscriptionState {
            status: self.status,
            plan_id: self.plan_id.clone(),
        }
    }

    /// Records a successful payment intent and activates the subscription.
    pub fn record_payment(&mut self, payment_intent_id: impl Into<String>, paid_at: Timestamp) {
        self.status = SubscriptionStatus::Active;
        self.stripe_payment_intent_id = Some(payment_intent_id.into());
        self.last_payment_at = Some(paid_at);
        self.touch();
    }

    /// Overwrites the internal plan identifier.
    pub fn change_plan(&mut self, plan_id: impl Into<String>) {
        self.plan_id = plan_id.into();
        self.touch();
    }

    /// Marks the subscription past due after a failed charge.
    pub fn mark_past_due(&mut self) {
        self.status = SubscriptionStatus::PastDue;
        self.touch();
    }

    /// Ends the subscription. Keeps a previously stamped time when none is given.
    pub fn cancel(&mut self, canceled_at: Option<Timestamp>) {
        self.status = SubscriptionStatus::Canceled;
        if canceled_at.is_some() {
            self.canceled_at = canceled_at;
        }
        self.touch();
    }

    /// Stamps the time the most recent invoice was paid.
    pub fn record_invoice_paid(&mut self, paid_at: Timestamp) {
        self.last_invoice_paid_at = Some(paid_at);
        self.touch();
    }

    /// Copies provider state onto this record.
    ///
    /// Optional fields absent from the snapshot leave stored values untouched.
    pub fn sync_from(&mut self, snapshot: &SubscriptionSnapshot) -> SyncChanges {
        let previous_status = self.status;

        self.status = snapshot.status;
        self.cancel_at_period_end = snapshot.cancel_at_period_end;

        if snapshot.current_period_start.is_some() {
            self.current_period_start = snapshot.current_period_start;
        }
        if snapshot.current_period_end.is_some() {
            self.current_period_end = snapshot.current_period_end;
        }
        if snapshot.canceled_at.is_some() {
            self.canceled_at = snapshot.canceled_at;
        }
        if snapshot.trial_start.is_some() {
            self.trial_start = snapshot.trial_start;
        }
        if snapshot.trial_end.is_some() {
            self.trial_end = snapshot.trial_end;
        }

        let mut price_change = None;
        if let Some(price_id) = &snapshot.price_id {
            if self.stripe_price_id.as_deref() != Some(price_id.as_str()) {
                price_change = Some((self.stripe_price_id.clone(), price_id.clone()));
                self.stripe_price_id = Some(price_id.clone());
            }
        }

        self.touch();

        SyncChanges {
            previous_status,
            price_change,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn snapshot(status: SubscriptionStatus) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            status,
            current_period_start: Some(ts(1_697_408_000)),
            current_period_end: Some(ts(1_700_000_000)),
            cancel_at_period_end: false,
            canceled_at: None,
            trial_start: None,
            trial_end: None,
            price_id: None,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Construction and Queries
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn new_subscription_starts_incomplete() {
        let sub = Subscription::new(UserId::new(), "pro");

        assert_eq!(sub.status, SubscriptionStatus::Incomplete);
        assert_eq!(sub.plan_id, "pro");
        assert!(sub.stripe_subscription_id.is_none());
        assert!(!sub.is_active());
    }

    #[test]
    fn with_stripe_ids_attaches_identifiers() {
        let sub = Subscription::new(UserId::new(), "pro").with_stripe_ids("cus_1", "sub_1");

        assert_eq!(sub.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(sub.stripe_subscription_id.as_deref(), Some("sub_1"));
    }

    #[test]
    fn trialing_is_active_and_trial() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.status = SubscriptionStatus::Trialing;

        assert!(sub.is_active());
        assert!(sub.is_trial());
    }

    #[test]
    fn days_until_renewal_counts_whole_days() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        let now = ts(1_700_000_000);
        sub.current_period_end = Some(now.add_days(10));

        assert_eq!(sub.days_until_renewal(now), 10);
    }

    #[test]
    fn days_until_renewal_is_zero_when_past_or_unknown() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        let now = ts(1_700_000_000);
        assert_eq!(sub.days_until_renewal(now), 0);

        sub.current_period_end = Some(now.add_days(-3));
        assert_eq!(sub.days_until_renewal(now), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Mutations
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn record_payment_activates_and_stamps() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        let paid_at = ts(1_700_000_000);

        sub.record_payment("pi_123", paid_at);

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.stripe_payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!(sub.last_payment_at, Some(paid_at));
    }

    #[test]
    fn cancel_keeps_existing_timestamp_when_none_given() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.canceled_at = Some(ts(1_600_000_000));

        sub.cancel(None);

        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.canceled_at, Some(ts(1_600_000_000)));
    }

    #[test]
    fn cancel_overwrites_timestamp_when_given() {
        let mut sub = Subscription::new(UserId::new(), "pro");

        sub.cancel(Some(ts(1_700_000_000)));

        assert_eq!(sub.canceled_at, Some(ts(1_700_000_000)));
    }

    #[test]
    fn mark_past_due_is_idempotent() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.mark_past_due();
        sub.mark_past_due();
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
    }

    // ══════════════════════════════════════════════════════════════
    // Snapshot Sync
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn sync_copies_status_and_period() {
        let mut sub = Subscription::new(UserId::new(), "pro");

        let changes = sub.sync_from(&snapshot(SubscriptionStatus::Active));

        assert_eq!(changes.previous_status, SubscriptionStatus::Incomplete);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.current_period_end, Some(ts(1_700_000_000)));
        assert!(changes.price_change.is_none());
    }

    #[test]
    fn sync_without_period_keeps_stored_bounds() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.sync_from(&snapshot(SubscriptionStatus::Active));
        let mut snap = snapshot(SubscriptionStatus::PastDue);
        snap.current_period_start = None;
        snap.current_period_end = None;

        sub.sync_from(&snap);

        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert_eq!(sub.current_period_start, Some(ts(1_697_408_000)));
        assert_eq!(sub.current_period_end, Some(ts(1_700_000_000)));
    }

    #[test]
    fn sync_detects_price_change() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.stripe_price_id = Some("price_old".to_string());
        let mut snap = snapshot(SubscriptionStatus::Active);
        snap.price_id = Some("price_new".to_string());

        let changes = sub.sync_from(&snap);

        assert_eq!(
            changes.price_change,
            Some((Some("price_old".to_string()), "price_new".to_string()))
        );
        assert_eq!(sub.stripe_price_id.as_deref(), Some("price_new"));
    }

    #[test]
    fn sync_with_same_price_reports_no_change() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.stripe_price_id = Some("price_1".to_string());
        let mut snap = snapshot(SubscriptionStatus::Active);
        snap.price_id = Some("price_1".to_string());

        assert!(sub.sync_from(&snap).price_change.is_none());
    }

    #[test]
    fn sync_keeps_optional_fields_absent_from_snapshot() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        sub.canceled_at = Some(ts(1_600_000_000));
        sub.trial_end = Some(ts(1_650_000_000));

        sub.sync_from(&snapshot(SubscriptionStatus::Active));

        assert_eq!(sub.canceled_at, Some(ts(1_600_000_000)));
        assert_eq!(sub.trial_end, Some(ts(1_650_000_000)));
    }

    #[test]
    fn sync_twice_is_stable() {
        let mut sub = Subscription::new(UserId::new(), "pro");
        let mut snap = snapshot(SubscriptionStatus::PastDue);
        snap.price_id = Some("price_1".to_string());
        snap.cancel_at_period_end = true;

        sub.sync_from(&snap);
        let first = sub.clone();
        let changes = sub.sync_from(&snap);

        assert_eq!(changes.previous_status, SubscriptionStatus::PastDue);
        assert!(changes.price_change.is_none());
        assert_eq!(sub.status, first.status);
        assert_eq!(sub.current_period_start, first.current_period_start);
        assert_eq!(sub.cancel_at_period_end, first.cancel_at_period_end);
    }
}
