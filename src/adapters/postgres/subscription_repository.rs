//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, UserId};
use crate::ports::SubscriptionRepository;

use super::{parse_column, timestamp, timestamp_opt};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, plan_id, status, stripe_customer_id, stripe_subscription_id,
           stripe_price_id, stripe_payment_intent_id, current_period_start,
           current_period_end, trial_start, trial_end, cancel_at_period_end,
           canceled_at, last_payment_at, last_invoice_paid_at, created_at, updated_at
    FROM subscriptions
"#;

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: String,
    status: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    stripe_price_id: Option<String>,
    stripe_payment_intent_id: Option<String>,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    trial_start: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    canceled_at: Option<DateTime<Utc>>,
    last_payment_at: Option<DateTime<Utc>>,
    last_invoice_paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            plan_id: row.plan_id,
            status: parse_column(&row.status, "subscriptions.status")?,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_price_id: row.stripe_price_id,
            stripe_payment_intent_id: row.stripe_payment_intent_id,
            current_period_start: timestamp_opt(row.current_period_start),
            current_period_end: timestamp_opt(row.current_period_end),
            trial_start: timestamp_opt(row.trial_start),
            trial_end: timestamp_opt(row.trial_end),
            cancel_at_period_end: row.cancel_at_period_end,
            canceled_at: timestamp_opt(row.canceled_at),
            last_payment_at: timestamp_opt(row.last_payment_at),
            last_invoice_paid_at: timestamp_opt(row.last_invoice_paid_at),
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        })
    }
}

fn map_write_error(context: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some("subscriptions_stripe_subscription_id_key") {
            return DomainError::new(
                ErrorCode::DuplicateExternalId,
                "Stripe subscription id already linked",
            );
        }
    }
    DomainError::database(context, e)
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, status, stripe_customer_id, stripe_subscription_id,
                stripe_price_id, stripe_payment_intent_id, current_period_start,
                current_period_end, trial_start, trial_end, cancel_at_period_end,
                canceled_at, last_payment_at, last_invoice_paid_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(&subscription.plan_id)
        .bind(subscription.status.as_str())
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_price_id)
        .bind(&subscription.stripe_payment_intent_id)
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.trial_start.map(|t| *t.as_datetime()))
        .bind(subscription.trial_end.map(|t| *t.as_datetime()))
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(subscription.last_payment_at.map(|t| *t.as_datetime()))
        .bind(subscription.last_invoice_paid_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to save subscription", e))?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan_id = $2,
                status = $3,
                stripe_customer_id = $4,
                stripe_subscription_id = $5,
                stripe_price_id = $6,
                stripe_payment_intent_id = $7,
                current_period_start = $8,
                current_period_end = $9,
                trial_start = $10,
                trial_end = $11,
                cancel_at_period_end = $12,
                canceled_at = $13,
                last_payment_at = $14,
                last_invoice_paid_at = $15,
                updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(&subscription.plan_id)
        .bind(subscription.status.as_str())
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_price_id)
        .bind(&subscription.stripe_payment_intent_id)
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.trial_start.map(|t| *t.as_datetime()))
        .bind(subscription.trial_end.map(|t| *t.as_datetime()))
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(subscription.last_payment_at.map(|t| *t.as_datetime()))
        .bind(subscription.last_invoice_paid_at.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to update subscription", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", subscription.id),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE stripe_subscription_id = $1", SELECT_COLUMNS))
                .bind(stripe_subscription_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}
