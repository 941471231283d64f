//! Payment method port.
//!
//! Payment methods are written by the account settings flow; the webhook
//! core only reads them.

use async_trait::async_trait;

use crate::domain::billing::PaymentMethod;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    /// Save a payment method.
    ///
    /// # Errors
    ///
    /// - `DuplicateExternalId` if the Stripe payment method id is already stored
    async fn save(&self, payment_method: &PaymentMethod) -> Result<(), DomainError>;

    async fn find_by_stripe_id(
        &self,
        stripe_payment_method_id: &str,
    ) -> Result<Option<PaymentMethod>, DomainError>;

    /// Active payment methods for a user, default first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PaymentMethod>, DomainError>;
}
