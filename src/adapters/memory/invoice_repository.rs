//! In-memory InvoiceRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::{Invoice, UpsertOutcome};
use crate::domain::foundation::DomainError;
use crate::ports::InvoiceRepository;

/// Invoices keyed by Stripe invoice id.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    rows: RwLock<HashMap<String, Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn upsert(&self, invoice: &Invoice) -> Result<UpsertOutcome, DomainError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&invoice.stripe_invoice_id) {
            Some(existing) => {
                existing.merge_from(invoice.clone());
                Ok(UpsertOutcome::Updated)
            }
            None => {
                rows.insert(invoice.stripe_invoice_id.clone(), invoice.clone());
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn find_by_stripe_invoice_id(
        &self,
        stripe_invoice_id: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        Ok(self.rows.read().await.get(stripe_invoice_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{from_minor_units, Currency};

    #[tokio::test]
    async fn second_upsert_updates_in_place() {
        let repo = InMemoryInvoiceRepository::new();
        let first = Invoice::new("in_1", from_minor_units(100), Currency::usd());
        let second = Invoice::new("in_1", from_minor_units(2599), Currency::usd());

        assert_eq!(repo.upsert(&first).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(repo.upsert(&second).await.unwrap(), UpsertOutcome::Updated);

        let stored = repo.find_by_stripe_invoice_id("in_1").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.amount, from_minor_units(2599));
        assert_eq!(repo.len().await, 1);
    }
}
