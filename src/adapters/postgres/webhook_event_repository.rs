//! PostgreSQL implementation of WebhookEventRepository.
//!
//! The event id is the primary key, so a concurrent duplicate delivery
//! loses the insert race instead of writing a second record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::webhook::WebhookEventRecord;
use crate::ports::{SaveResult, WebhookEventRepository};

use super::{parse_column, timestamp};

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    subscription_id: Option<Uuid>,
    status: String,
    error_message: Option<String>,
    payload: serde_json::Value,
    processed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            status: parse_column(&row.status, "webhook_events.status")?,
            error_message: row.error_message,
            payload: row.payload,
            processed_at: timestamp(row.processed_at),
            created_at: timestamp(row.created_at),
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, subscription_id, status, error_message,
                   payload, processed_at, created_at
            FROM webhook_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find webhook event", e))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                event_id, event_type, subscription_id, status, error_message,
                payload, processed_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.subscription_id.map(|id| *id.as_uuid()))
        .bind(record.status.as_str())
        .bind(&record.error_message)
        .bind(&record.payload)
        .bind(record.processed_at.as_datetime())
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to save webhook event", e))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE processed_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to purge webhook events", e))?;

        Ok(result.rows_affected())
    }
}
