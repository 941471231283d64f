//! In-memory PaymentMethodRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::PaymentMethod;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::PaymentMethodRepository;

/// Payment methods keyed by Stripe payment method id.
#[derive(Default)]
pub struct InMemoryPaymentMethodRepository {
    rows: RwLock<HashMap<String, PaymentMethod>>,
}

impl InMemoryPaymentMethodRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentMethodRepository for InMemoryPaymentMethodRepository {
    async fn save(&self, payment_method: &PaymentMethod) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&payment_method.stripe_payment_method_id) {
            if existing.id != payment_method.id {
                return Err(DomainError::new(
                    ErrorCode::DuplicateExternalId,
                    "Payment method already stored",
                ));
            }
        }
        rows.insert(
            payment_method.stripe_payment_method_id.clone(),
            payment_method.clone(),
        );
        Ok(())
    }

    async fn find_by_stripe_id(
        &self,
        stripe_payment_method_id: &str,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        Ok(self.rows.read().await.get(stripe_payment_method_id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PaymentMethod>, DomainError> {
        let rows = self.rows.read().await;
        let mut methods: Vec<PaymentMethod> = rows
            .values()
            .filter(|pm| &pm.user_id == user_id && pm.is_active)
            .cloned()
            .collect();
        methods.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PaymentMethodKind;

    #[tokio::test]
    async fn default_method_is_listed_first() {
        let repo = InMemoryPaymentMethodRepository::new();
        let user = UserId::new();
        let card = PaymentMethod::new(user, "pm_card", PaymentMethodKind::Card).with_card("visa", "4242");
        let mut bank = PaymentMethod::new(user, "pm_bank", PaymentMethodKind::BankAccount);
        bank.is_default = true;

        repo.save(&card).await.unwrap();
        repo.save(&bank).await.unwrap();

        let listed = repo.list_for_user(&user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].display_label(), "Bank Account Payment Method");
    }

    #[tokio::test]
    async fn same_stripe_id_for_new_row_is_rejected() {
        let repo = InMemoryPaymentMethodRepository::new();
        let user = UserId::new();
        repo.save(&PaymentMethod::new(user, "pm_1", PaymentMethodKind::Card))
            .await
            .unwrap();

        let err = repo
            .save(&PaymentMethod::new(user, "pm_1", PaymentMethodKind::Card))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateExternalId);
        assert!(repo.find_by_stripe_id("pm_1").await.unwrap().is_some());
    }
}
