//! PostgreSQL implementation of InvoiceRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Invoice, UpsertOutcome};
use crate::domain::foundation::{Currency, DomainError, InvoiceId};
use crate::ports::InvoiceRepository;

use super::{parse_column, timestamp, timestamp_opt};

pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    stripe_invoice_id: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    customer_email: Option<String>,
    amount: Decimal,
    currency: String,
    status: String,
    paid_at: Option<DateTime<Utc>>,
    payment_failed_at: Option<DateTime<Utc>>,
    description: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: InvoiceId::from_uuid(row.id),
            stripe_invoice_id: row.stripe_invoice_id,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            customer_email: row.customer_email,
            amount: row.amount,
            currency: Currency::new(&row.currency)?,
            status: parse_column(&row.status, "invoices.status")?,
            paid_at: timestamp_opt(row.paid_at),
            payment_failed_at: timestamp_opt(row.payment_failed_at),
            description: row.description,
            metadata: row.metadata,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        })
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn upsert(&self, invoice: &Invoice) -> Result<UpsertOutcome, DomainError> {
        // xmax is 0 only for a freshly inserted tuple.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (
                id, stripe_invoice_id, stripe_customer_id, stripe_subscription_id,
                customer_email, amount, currency, status, paid_at, payment_failed_at,
                description, metadata, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (stripe_invoice_id) DO UPDATE SET
                stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, invoices.stripe_customer_id),
                stripe_subscription_id = COALESCE(EXCLUDED.stripe_subscription_id, invoices.stripe_subscription_id),
                customer_email = COALESCE(EXCLUDED.customer_email, invoices.customer_email),
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                status = EXCLUDED.status,
                paid_at = COALESCE(EXCLUDED.paid_at, invoices.paid_at),
                payment_failed_at = COALESCE(invoices.payment_failed_at, EXCLUDED.payment_failed_at),
                description = COALESCE(EXCLUDED.description, invoices.description),
                metadata = EXCLUDED.metadata,
                updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(&invoice.stripe_invoice_id)
        .bind(&invoice.stripe_customer_id)
        .bind(&invoice.stripe_subscription_id)
        .bind(&invoice.customer_email)
        .bind(invoice.amount)
        .bind(invoice.currency.as_str())
        .bind(invoice.status.as_str())
        .bind(invoice.paid_at.map(|t| *t.as_datetime()))
        .bind(invoice.payment_failed_at.map(|t| *t.as_datetime()))
        .bind(&invoice.description)
        .bind(&invoice.metadata)
        .bind(invoice.created_at.as_datetime())
        .bind(invoice.updated_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to upsert invoice", e))?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn find_by_stripe_invoice_id(
        &self,
        stripe_invoice_id: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, stripe_invoice_id, stripe_customer_id, stripe_subscription_id,
                   customer_email, amount, currency, status, paid_at, payment_failed_at,
                   description, metadata, created_at, updated_at
            FROM invoices
            WHERE stripe_invoice_id = $1
            "#,
        )
        .bind(stripe_invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find invoice", e))?;

        row.map(Invoice::try_from).transpose()
    }
}
