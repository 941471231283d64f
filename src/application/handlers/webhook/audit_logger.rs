//! Audit logger - appends one record per processed webhook delivery.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::webhook::WebhookEventRecord;
use crate::ports::{SaveResult, WebhookEventRepository};

/// Writes audit records. Never fails the caller: conflicts and storage
/// errors are logged and swallowed.
#[derive(Clone)]
pub struct AuditLogger {
    repository: Arc<dyn WebhookEventRepository>,
}

impl AuditLogger {
    pub fn new(repository: Arc<dyn WebhookEventRepository>) -> Self {
        Self { repository }
    }

    pub async fn record(&self, record: WebhookEventRecord) {
        let event_id = record.event_id.clone();
        let status = record.status;

        match self.repository.save(record).await {
            Ok(SaveResult::Inserted) => {
                tracing::debug!(event_id = %event_id, status = %status, "Webhook audit recorded");
            }
            Ok(SaveResult::AlreadyExists) => {
                tracing::warn!(
                    event_id = %event_id,
                    status = %status,
                    "Webhook audit already exists, keeping first record"
                );
            }
            Err(e) => {
                tracing::error!(
                    event_id = %event_id,
                    status = %status,
                    error = %e,
                    "Failed to write webhook audit record"
                );
            }
        }
    }

    /// Deletes audit records processed more than `retention_days` ago.
    pub async fn purge_older_than(&self, retention_days: i64) -> Result<u64, DomainError> {
        let cutoff = Timestamp::now()
            .checked_sub_days(retention_days)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("retention of {} days is out of range", retention_days),
                )
            })?;
        let deleted = self.repository.delete_before(cutoff).await?;
        tracing::info!(
            deleted = deleted,
            retention_days = retention_days,
            "Purged webhook audit records"
        );
        Ok(deleted)
    }
}
