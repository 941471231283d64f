//! Invoice repository port.

use async_trait::async_trait;

use crate::domain::billing::{Invoice, UpsertOutcome};
use crate::domain::foundation::DomainError;

/// Repository port for Invoice persistence.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Insert the invoice, or update the row with the same Stripe invoice id.
    ///
    /// Must be a single conditional write (`ON CONFLICT (stripe_invoice_id)`),
    /// never a read followed by an insert. On update the stored local id and
    /// creation time are kept, as is the first `payment_failed_at`.
    async fn upsert(&self, invoice: &Invoice) -> Result<UpsertOutcome, DomainError>;

    /// Find an invoice by its Stripe invoice id (`in_...`).
    async fn find_by_stripe_invoice_id(
        &self,
        stripe_invoice_id: &str,
    ) -> Result<Option<Invoice>, DomainError>;
}
