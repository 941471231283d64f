//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! Status and kind enums are stored as their `as_str` text and parsed back
//! on read; a value the domain does not know is a database error.

mod invoice_repository;
mod payment_method_repository;
mod plan_repository;
mod subscription_history_repository;
mod subscription_repository;
mod webhook_event_repository;

pub use invoice_repository::PostgresInvoiceRepository;
pub use payment_method_repository::PostgresPaymentMethodRepository;
pub use plan_repository::PostgresPlanRepository;
pub use subscription_history_repository::PostgresSubscriptionHistoryRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, ValidationError};

pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = ValidationError>,
{
    value.parse().map_err(|e: ValidationError| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid value in {}: {}", column, e),
        )
    })
}

pub(crate) fn timestamp(value: DateTime<Utc>) -> Timestamp {
    Timestamp::from_datetime(value)
}

pub(crate) fn timestamp_opt(value: Option<DateTime<Utc>>) -> Option<Timestamp> {
    value.map(Timestamp::from_datetime)
}
