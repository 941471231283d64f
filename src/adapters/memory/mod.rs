//! In-memory adapters.
//!
//! Back every port with a `tokio::sync::RwLock` map. Used by the test suites
//! and by local runs without a database (`database.url` unset).

mod invoice_repository;
mod payment_method_repository;
mod plan_repository;
mod subscription_history_repository;
mod subscription_repository;
mod webhook_event_repository;

pub use invoice_repository::InMemoryInvoiceRepository;
pub use payment_method_repository::InMemoryPaymentMethodRepository;
pub use plan_repository::InMemoryPlanRepository;
pub use subscription_history_repository::InMemorySubscriptionHistoryRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
