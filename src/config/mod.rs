//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BILLING_RECONCILER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use billing_reconciler::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::{DatabaseConfig, StorageBackend};
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BILLING_RECONCILER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BILLING_RECONCILER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING_RECONCILER__PAYMENT__STRIPE_WEBHOOK_SECRET=...` -> `payment.stripe_webhook_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("BILLING_RECONCILER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// A missing database URL is accepted outside production, where the
    /// service falls back to in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate(self.is_production())?;
        self.payment.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "BILLING_RECONCILER__DATABASE__URL",
        "BILLING_RECONCILER__PAYMENT__STRIPE_API_KEY",
        "BILLING_RECONCILER__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "BILLING_RECONCILER__PAYMENT__SIGNATURE_TOLERANCE_SECS",
        "BILLING_RECONCILER__SERVER__PORT",
        "BILLING_RECONCILER__SERVER__ENVIRONMENT",
    ];

    fn set_minimal_env() {
        env::set_var("BILLING_RECONCILER__PAYMENT__STRIPE_API_KEY", "sk_test_xxx");
        env::set_var("BILLING_RECONCILER__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[(
            "BILLING_RECONCILER__DATABASE__URL",
            "postgresql://test@localhost/test",
        )])
        .unwrap();

        assert_eq!(config.database.backend(), StorageBackend::Postgres);
        assert_eq!(
            config.database.postgres_url(),
            Some("postgresql://test@localhost/test")
        );
        assert_eq!(
            config
                .payment
                .webhook_secret()
                .map(|s| s.expose_secret().clone()),
            Some("whsec_xxx".to_string())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.payment.signature_tolerance_secs, 300);
    }

    #[test]
    fn test_missing_database_is_valid_outside_production() {
        let config = load_with(&[]).unwrap();

        assert_eq!(config.database.backend(), StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_database() {
        let config = load_with(&[("BILLING_RECONCILER__SERVER__ENVIRONMENT", "production")]).unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );
    }

    #[test]
    fn test_custom_values_are_parsed() {
        let config = load_with(&[
            ("BILLING_RECONCILER__SERVER__PORT", "3000"),
            ("BILLING_RECONCILER__PAYMENT__SIGNATURE_TOLERANCE_SECS", "600"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.payment.signature_tolerance_secs, 600);
    }
}
