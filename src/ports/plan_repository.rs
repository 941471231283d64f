//! Plan catalog port.

use async_trait::async_trait;

use crate::domain::billing::Plan;
use crate::domain::foundation::{DomainError, PlanId};

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// Find the plan mapped to a Stripe price id (`price_...`).
    async fn find_by_stripe_price_id(&self, price_id: &str) -> Result<Option<Plan>, DomainError>;

    /// Active plans ordered by price.
    async fn list_active(&self) -> Result<Vec<Plan>, DomainError>;
}
