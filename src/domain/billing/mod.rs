//! Billing module - Locally persisted billing records.
//!
//! Subscriptions, invoices, plans, payment methods and the subscription
//! history trail. Stripe is the source of truth; these entities mirror it.

mod history;
mod invoice;
mod payment_method;
mod plan;
mod status;
mod subscription;

pub use history::{
    classify_transition, HistoryAction, PlanChangeIntent, SubscriptionHistoryEntry,
    SubscriptionState,
};
pub use invoice::{Invoice, UpsertOutcome};
pub use payment_method::{PaymentMethod, PaymentMethodKind};
pub use plan::{BillingInterval, Plan};
pub use status::{InvoiceStatus, SubscriptionStatus};
pub use subscription::{Subscription, SubscriptionSnapshot, SyncChanges};

