//! Lifecycle status enumerations for billing records.
//!
//! Stripe owns the subscription lifecycle, so local statuses mirror its
//! strings exactly and accept any provider-driven transition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription lifecycle status as reported by Stripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    /// Initial state until the first payment confirms the subscription.
    #[default]
    Incomplete,
    IncompleteExpired,
    Paused,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 8] = [
        SubscriptionStatus::Trialing,
        SubscriptionStatus::Active,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::Canceled,
        SubscriptionStatus::Unpaid,
        SubscriptionStatus::Incomplete,
        SubscriptionStatus::IncompleteExpired,
        SubscriptionStatus::Paused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Paused => "paused",
        }
    }

    /// Returns true if the subscription currently grants paid access.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }

    /// Returns true for statuses that signal a payment problem.
    pub fn is_delinquent(&self) -> bool {
        matches!(self, SubscriptionStatus::PastDue | SubscriptionStatus::Unpaid)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::unknown_variant("subscription status", s))
    }
}

/// Local invoice status.
///
/// `PaymentFailed` is a local addition; Stripe keeps such invoices `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Open,
    Paid,
    PaymentFailed,
    Uncollectible,
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 6] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Open,
        InvoiceStatus::Paid,
        InvoiceStatus::PaymentFailed,
        InvoiceStatus::Uncollectible,
        InvoiceStatus::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Open => "open",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::PaymentFailed => "payment_failed",
            InvoiceStatus::Uncollectible => "uncollectible",
            InvoiceStatus::Void => "void",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::unknown_variant("invoice status", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_status_parses_every_stripe_value() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn subscription_status_rejects_unknown_value() {
        let err = "frozen".parse::<SubscriptionStatus>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVariant { .. }));
    }

    #[test]
    fn subscription_status_defaults_to_incomplete() {
        assert_eq!(SubscriptionStatus::default(), SubscriptionStatus::Incomplete);
    }

    #[test]
    fn active_and_trialing_grant_access() {
        assert!(SubscriptionStatus::Active.is_active());
        assert!(SubscriptionStatus::Trialing.is_active());
        assert!(!SubscriptionStatus::PastDue.is_active());
        assert!(!SubscriptionStatus::Canceled.is_active());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&SubscriptionStatus::IncompleteExpired).unwrap();
        assert_eq!(json, "\"incomplete_expired\"");
        let json = serde_json::to_string(&InvoiceStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"payment_failed\"");
    }

    #[test]
    fn invoice_status_round_trips_strings() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<InvoiceStatus>().is_err());
    }
}
