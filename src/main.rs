//! Billing Reconciler service
//!
//! ## Endpoints
//!
//! - `POST /webhooks/stripe` - Stripe webhook ingestion
//! - `GET /webhooks/health` - Liveness probe

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use billing_reconciler::adapters::http::{webhook_router, WebhookAppState};
use billing_reconciler::adapters::memory::{
    InMemoryInvoiceRepository, InMemoryPlanRepository, InMemorySubscriptionHistoryRepository,
    InMemorySubscriptionRepository, InMemoryWebhookEventRepository,
};
use billing_reconciler::adapters::postgres::{
    PostgresInvoiceRepository, PostgresPlanRepository, PostgresSubscriptionHistoryRepository,
    PostgresSubscriptionRepository, PostgresWebhookEventRepository,
};
use billing_reconciler::application::{
    AuditLogger, BillingRepositories, WebhookProcessor, WebhookRouter,
};
use billing_reconciler::config::{AppConfig, StorageBackend};
use billing_reconciler::domain::webhook::StripeWebhookVerifier;
use billing_reconciler::ports::WebhookEventRepository;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Storage ports selected at startup.
struct Stores {
    repositories: BillingRepositories,
    events: Arc<dyn WebhookEventRepository>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        live_mode = config.payment.is_live_mode(),
        "Starting billing reconciler"
    );

    let stores = build_stores(&config).await?;

    if let Some(days) = config.payment.audit_retention_days {
        spawn_audit_purge(AuditLogger::new(stores.events.clone()), days);
    }

    let webhook_secret = config.payment.webhook_secret();
    if webhook_secret.is_none() {
        tracing::warn!("No Stripe webhook secret configured; every delivery will be rejected");
    }
    let verifier =
        StripeWebhookVerifier::new(webhook_secret, config.payment.signature_tolerance_secs);
    let processor = WebhookProcessor::new(
        WebhookRouter::with_default_handlers(&stores.repositories),
        stores.events,
    )
    .with_expected_livemode(config.payment.is_live_mode());

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let app = webhook_router()
        .with_state(WebhookAppState::new(processor, verifier))
        .layer(middleware);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

async fn build_stores(config: &AppConfig) -> Result<Stores, BoxError> {
    let db = &config.database;
    let url = match (db.backend(), db.postgres_url()) {
        (StorageBackend::Postgres, Some(url)) => url,
        _ => {
            tracing::warn!("No database URL configured, using in-memory stores");
            return Ok(Stores {
                repositories: BillingRepositories {
                    subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                    invoices: Arc::new(InMemoryInvoiceRepository::new()),
                    plans: Arc::new(InMemoryPlanRepository::new()),
                    history: Arc::new(InMemorySubscriptionHistoryRepository::new()),
                },
                events: Arc::new(InMemoryWebhookEventRepository::new()),
            });
        }
    };

    let pool = PgPoolOptions::new()
        .min_connections(db.min_connections)
        .max_connections(db.max_connections)
        .acquire_timeout(db.acquire_timeout())
        .idle_timeout(db.idle_timeout())
        .max_lifetime(db.max_lifetime())
        .connect(url)
        .await?;
    tracing::info!(max_connections = db.max_connections, "Database pool created");

    if db.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Stores {
        repositories: BillingRepositories {
            subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
            invoices: Arc::new(PostgresInvoiceRepository::new(pool.clone())),
            plans: Arc::new(PostgresPlanRepository::new(pool.clone())),
            history: Arc::new(PostgresSubscriptionHistoryRepository::new(pool.clone())),
        },
        events: Arc::new(PostgresWebhookEventRepository::new(pool)),
    })
}

fn spawn_audit_purge(audit: AuditLogger, retention_days: i64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = audit.purge_older_than(retention_days).await {
                tracing::error!(error = %e, "Webhook audit purge failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
