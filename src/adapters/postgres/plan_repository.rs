//! PostgreSQL implementation of PlanRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::Plan;
use crate::domain::foundation::{Currency, DomainError, ErrorCode, PlanId};
use crate::ports::PlanRepository;

use super::{parse_column, timestamp};

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, description, price, currency, billing_interval, stripe_price_id,
           stripe_product_id, features, limits, is_active, is_popular, created_at, updated_at
    FROM plans
"#;

pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    currency: String,
    billing_interval: String,
    stripe_price_id: Option<String>,
    stripe_product_id: Option<String>,
    features: serde_json::Value,
    limits: serde_json::Value,
    is_active: bool,
    is_popular: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            currency: Currency::new(&row.currency)?,
            interval: parse_column(&row.billing_interval, "plans.billing_interval")?,
            stripe_price_id: row.stripe_price_id,
            stripe_product_id: row.stripe_product_id,
            features: row.features,
            limits: row.limits,
            is_active: row.is_active,
            is_popular: row.is_popular,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        })
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO plans (
                id, name, description, price, currency, billing_interval, stripe_price_id,
                stripe_product_id, features, limits, is_active, is_popular, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                currency = EXCLUDED.currency,
                billing_interval = EXCLUDED.billing_interval,
                stripe_price_id = EXCLUDED.stripe_price_id,
                stripe_product_id = EXCLUDED.stripe_product_id,
                features = EXCLUDED.features,
                limits = EXCLUDED.limits,
                is_active = EXCLUDED.is_active,
                is_popular = EXCLUDED.is_popular,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.currency.as_str())
        .bind(plan.interval.as_str())
        .bind(&plan.stripe_price_id)
        .bind(&plan.stripe_product_id)
        .bind(&plan.features)
        .bind(&plan.limits)
        .bind(plan.is_active)
        .bind(plan.is_popular)
        .bind(plan.created_at.as_datetime())
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("plans_stripe_price_id_key") {
                    return DomainError::new(
                        ErrorCode::DuplicateExternalId,
                        "Stripe price already mapped to another plan",
                    );
                }
            }
            DomainError::database("Failed to save plan", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to find plan", e))?;

        row.map(Plan::try_from).transpose()
    }

    async fn find_by_stripe_price_id(&self, price_id: &str) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> =
            sqlx::query_as(&format!("{} WHERE stripe_price_id = $1", SELECT_COLUMNS))
                .bind(price_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to find plan", e))?;

        row.map(Plan::try_from).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "{} WHERE is_active ORDER BY price ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list plans", e))?;

        rows.into_iter().map(Plan::try_from).collect()
    }
}
