//! Storage selection and PostgreSQL pool settings

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

/// Where reconciled billing records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; everything is lost on restart.
    Memory,
    Postgres,
}

/// Storage configuration.
///
/// A blank `url` selects [`StorageBackend::Memory`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Apply `migrations/` before serving.
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn backend(&self) -> StorageBackend {
        match self.postgres_url() {
            Some(_) => StorageBackend::Postgres,
            None => StorageBackend::Memory,
        }
    }

    /// The connection URL, if one was supplied.
    pub fn postgres_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    /// Validates the storage settings.
    ///
    /// Pool bounds are only checked when Postgres is selected. With
    /// `require_postgres` the in-memory fallback is refused.
    pub fn validate(&self, require_postgres: bool) -> Result<(), ValidationError> {
        let Some(url) = self.postgres_url() else {
            if require_postgres {
                return Err(ValidationError::MissingRequired("DATABASE__URL"));
            }
            return Ok(());
        };

        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            min_connections: 1,
            max_connections: 10,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            run_migrations: true,
        }
    }
}
