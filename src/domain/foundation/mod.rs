//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the billing domain.

mod errors;
mod ids;
mod money;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{HistoryEntryId, InvoiceId, PaymentMethodId, PlanId, SubscriptionId, UserId};
pub use money::{from_minor_units, round_money, Currency, MONEY_SCALE};
pub use timestamp::Timestamp;
