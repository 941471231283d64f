//! PostgreSQL implementation of SubscriptionHistoryRepository. Append-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{SubscriptionHistoryEntry, SubscriptionStatus};
use crate::domain::foundation::{DomainError, HistoryEntryId, SubscriptionId};
use crate::ports::SubscriptionHistoryRepository;

use super::{parse_column, timestamp};

pub struct PostgresSubscriptionHistoryRepository {
    pool: PgPool,
}

impl PostgresSubscriptionHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    subscription_id: Uuid,
    action: String,
    old_plan_id: Option<String>,
    new_plan_id: Option<String>,
    old_status: Option<String>,
    new_status: Option<String>,
    reason: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn parse_status(
    value: Option<String>,
    column: &str,
) -> Result<Option<SubscriptionStatus>, DomainError> {
    value.map(|s| parse_column(&s, column)).transpose()
}

impl TryFrom<HistoryRow> for SubscriptionHistoryEntry {
    type Error = DomainError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionHistoryEntry {
            id: HistoryEntryId::from_uuid(row.id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            action: parse_column(&row.action, "subscription_history.action")?,
            old_plan_id: row.old_plan_id,
            new_plan_id: row.new_plan_id,
            old_status: parse_status(row.old_status, "subscription_history.old_status")?,
            new_status: parse_status(row.new_status, "subscription_history.new_status")?,
            reason: row.reason,
            metadata: row.metadata,
            created_at: timestamp(row.created_at),
        })
    }
}

#[async_trait]
impl SubscriptionHistoryRepository for PostgresSubscriptionHistoryRepository {
    async fn append(&self, entry: &SubscriptionHistoryEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_history (
                id, subscription_id, action, old_plan_id, new_plan_id,
                old_status, new_status, reason, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.subscription_id.as_uuid())
        .bind(entry.action.as_str())
        .bind(&entry.old_plan_id)
        .bind(&entry.new_plan_id)
        .bind(entry.old_status.map(|s| s.as_str()))
        .bind(entry.new_status.map(|s| s.as_str()))
        .bind(&entry.reason)
        .bind(&entry.metadata)
        .bind(entry.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to append subscription history", e))?;

        Ok(())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<SubscriptionHistoryEntry>, DomainError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_id, action, old_plan_id, new_plan_id,
                   old_status, new_status, reason, metadata, created_at
            FROM subscription_history
            WHERE subscription_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(subscription_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list subscription history", e))?;

        rows.into_iter().map(SubscriptionHistoryEntry::try_from).collect()
    }
}
