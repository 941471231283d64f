//! Subscription repository port.
//!
//! Subscriptions are created by the purchase flow and mutated by webhooks.
//! Webhook handlers only ever look up by Stripe id and update; they never
//! create rows.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, SubscriptionId, UserId};

/// Repository port for Subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Save a new subscription.
    ///
    /// # Errors
    ///
    /// - `DuplicateExternalId` if the Stripe subscription id is already taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Update an existing subscription.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the subscription doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Find a subscription by its local ID.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by its Stripe subscription id (`sub_...`).
    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// All subscriptions owned by a user, newest first.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;
}
