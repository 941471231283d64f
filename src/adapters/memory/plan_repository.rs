//! In-memory PlanRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::Plan;
use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::ports::PlanRepository;

#[derive(Default)]
pub struct InMemoryPlanRepository {
    rows: RwLock<HashMap<PlanId, Plan>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        let price_taken = plan.stripe_price_id.as_ref().is_some_and(|price| {
            rows.values()
                .any(|row| row.id != plan.id && row.stripe_price_id.as_ref() == Some(price))
        });
        if price_taken {
            return Err(DomainError::new(
                ErrorCode::DuplicateExternalId,
                "Stripe price already mapped to another plan",
            ));
        }
        rows.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_stripe_price_id(&self, price_id: &str) -> Result<Option<Plan>, DomainError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|plan| plan.stripe_price_id.as_deref() == Some(price_id))
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Plan>, DomainError> {
        let rows = self.rows.read().await;
        let mut plans: Vec<Plan> = rows.values().filter(|p| p.is_active).cloned().collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price));
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BillingInterval;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn finds_plan_by_price_and_lists_active_by_price() {
        let repo = InMemoryPlanRepository::new();
        let pro = Plan::new("Pro", Decimal::new(2999, 2), BillingInterval::Month)
            .with_stripe_price("price_pro");
        let basic = Plan::new("Basic", Decimal::new(999, 2), BillingInterval::Month);
        let mut retired = Plan::new("Old", Decimal::new(500, 2), BillingInterval::Month);
        retired.is_active = false;

        for plan in [&pro, &basic, &retired] {
            repo.save(plan).await.unwrap();
        }

        let found = repo.find_by_stripe_price_id("price_pro").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(pro.id));

        let names: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Basic".to_string(), "Pro".to_string()]);
    }

    #[tokio::test]
    async fn price_cannot_map_to_two_plans() {
        let repo = InMemoryPlanRepository::new();
        let a = Plan::new("A", Decimal::ONE, BillingInterval::Month).with_stripe_price("price_1");
        let b = Plan::new("B", Decimal::ONE, BillingInterval::Month).with_stripe_price("price_1");

        repo.save(&a).await.unwrap();
        assert!(repo.save(&b).await.is_err());
    }
}
