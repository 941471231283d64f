//! PostgreSQL implementation of PaymentMethodRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::PaymentMethod;
use crate::domain::foundation::{DomainError, PaymentMethodId, UserId};
use crate::ports::PaymentMethodRepository;

use super::{parse_column, timestamp};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, stripe_payment_method_id, stripe_customer_id, kind, brand, last4,
           exp_month, exp_year, is_default, is_active, created_at, updated_at
    FROM payment_methods
"#;

pub struct PostgresPaymentMethodRepository {
    pool: PgPool,
}

impl PostgresPaymentMethodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentMethodRow {
    id: Uuid,
    user_id: Uuid,
    stripe_payment_method_id: String,
    stripe_customer_id: Option<String>,
    kind: String,
    brand: Option<String>,
    last4: Option<String>,
    exp_month: Option<i32>,
    exp_year: Option<i32>,
    is_default: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentMethodRow> for PaymentMethod {
    type Error = DomainError;

    fn try_from(row: PaymentMethodRow) -> Result<Self, Self::Error> {
        Ok(PaymentMethod {
            id: PaymentMethodId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            stripe_payment_method_id: row.stripe_payment_method_id,
            stripe_customer_id: row.stripe_customer_id,
            kind: parse_column(&row.kind, "payment_methods.kind")?,
            brand: row.brand,
            last4: row.last4,
            exp_month: row.exp_month,
            exp_year: row.exp_year,
            is_default: row.is_default,
            is_active: row.is_active,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        })
    }
}

#[async_trait]
impl PaymentMethodRepository for PostgresPaymentMethodRepository {
    async fn save(&self, payment_method: &PaymentMethod) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_methods (
                id, user_id, stripe_payment_method_id, stripe_customer_id, kind, brand,
                last4, exp_month, exp_year, is_default, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (stripe_payment_method_id) DO UPDATE SET
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                kind = EXCLUDED.kind,
                brand = EXCLUDED.brand,
                last4 = EXCLUDED.last4,
                exp_month = EXCLUDED.exp_month,
                exp_year = EXCLUDED.exp_year,
                is_default = EXCLUDED.is_default,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(payment_method.id.as_uuid())
        .bind(payment_method.user_id.as_uuid())
        .bind(&payment_method.stripe_payment_method_id)
        .bind(&payment_method.stripe_customer_id)
        .bind(payment_method.kind.as_str())
        .bind(&payment_method.brand)
        .bind(&payment_method.last4)
        .bind(payment_method.exp_month)
        .bind(payment_method.exp_year)
        .bind(payment_method.is_default)
        .bind(payment_method.is_active)
        .bind(payment_method.created_at.as_datetime())
        .bind(payment_method.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to save payment method", e))?;

        Ok(())
    }

    async fn find_by_stripe_id(
        &self,
        stripe_payment_method_id: &str,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE stripe_payment_method_id = $1",
            SELECT_COLUMNS
        ))
        .bind(stripe_payment_method_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find payment method", e))?;

        row.map(PaymentMethod::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PaymentMethod>, DomainError> {
        let rows: Vec<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND is_active ORDER BY is_default DESC, created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list payment methods", e))?;

        rows.into_iter().map(PaymentMethod::try_from).collect()
    }
}
