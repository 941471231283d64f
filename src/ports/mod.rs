//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Billing Ports
//!
//! - `SubscriptionRepository` - Subscription lookup and update
//! - `InvoiceRepository` - Invoice upsert keyed by Stripe id
//! - `PlanRepository` - Plan catalog, looked up by Stripe price
//! - `PaymentMethodRepository` - Saved payment methods
//! - `SubscriptionHistoryRepository` - Append-only transition trail
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - Audit log and duplicate delivery tracking

mod invoice_repository;
mod payment_method_repository;
mod plan_repository;
mod subscription_history_repository;
mod subscription_repository;
mod webhook_event_repository;

pub use invoice_repository::InvoiceRepository;
pub use payment_method_repository::PaymentMethodRepository;
pub use plan_repository::PlanRepository;
pub use subscription_history_repository::SubscriptionHistoryRepository;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_event_repository::{SaveResult, WebhookEventRepository};
