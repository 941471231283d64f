//! Invoice entity.
//!
//! Invoices are keyed by their Stripe id and written through an upsert, so a
//! redelivered event reapplies the same fields instead of creating a copy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{Currency, InvoiceId, Timestamp};

use super::InvoiceStatus;

/// Local invoice record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub stripe_invoice_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub paid_at: Option<Timestamp>,
    pub payment_failed_at: Option<Timestamp>,
    pub description: Option<String>,
    pub metadata: JsonValue,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Whether an upsert created a new row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl Invoice {
    /// Creates a draft invoice for the given Stripe id.
    pub fn new(stripe_invoice_id: impl Into<String>, amount: Decimal, currency: Currency) -> Self {
        let now = Timestamp::now();
        Self {
            id: InvoiceId::new(),
            stripe_invoice_id: stripe_invoice_id.into(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            customer_email: None,
            amount,
            currency,
            status: InvoiceStatus::Draft,
            paid_at: None,
            payment_failed_at: None,
            description: None,
            metadata: JsonValue::Object(Default::default()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the invoice paid at the given time.
    pub fn mark_paid(mut self, paid_at: Timestamp) -> Self {
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(paid_at);
        self
    }

    /// Marks the invoice as having a failed charge at the given time.
    pub fn mark_payment_failed(mut self, failed_at: Timestamp) -> Self {
        self.status = InvoiceStatus::PaymentFailed;
        self.payment_failed_at = Some(failed_at);
        self
    }

    /// Applies an incoming version of this invoice onto the stored one.
    ///
    /// The local id and creation time are kept. The first recorded failure
    /// time wins, and optional fields missing from `incoming` keep their
    /// stored values.
    pub fn merge_from(&mut self, incoming: Invoice) {
        self.stripe_customer_id = incoming.stripe_customer_id.or(self.stripe_customer_id.take());
        self.stripe_subscription_id = incoming
            .stripe_subscription_id
            .or(self.stripe_subscription_id.take());
        self.customer_email = incoming.customer_email.or(self.customer_email.take());
        self.amount = incoming.amount;
        self.currency = incoming.currency;
        self.status = incoming.status;
        self.paid_at = incoming.paid_at.or(self.paid_at);
        self.payment_failed_at = self.payment_failed_at.or(incoming.payment_failed_at);
        self.description = incoming.description.or(self.description.take());
        self.metadata = incoming.metadata;
        self.updated_at = Timestamp::now();
    }
}
