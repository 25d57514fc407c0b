//! Storage selection and the shared storage handle

use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPool;
use tracing::info;

use crate::config::StorageSettings;
use crate::domain::api_key::ApiKeyRepository;
use crate::domain::usage::UsageRepository;
use crate::domain::DomainError;
use crate::infrastructure::api_key::{InMemoryApiKeyRepository, PostgresApiKeyRepository};
use crate::infrastructure::usage::{InMemoryUsageRepository, PostgresUsageRepository};

use super::migrations::run_storage_migrations;
use super::postgres::{connect_pool, PostgresConfig};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage, bounded to `max_usage_records`
    InMemory { max_usage_records: usize },
    /// PostgreSQL storage configuration
    Postgres {
        config: PostgresConfig,
        run_migrations: bool,
    },
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory {
            max_usage_records: 100_000,
        }
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres {
            config: PostgresConfig::new(url),
            run_migrations: true,
        }
    }

    /// Build from the `storage` config section
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, DomainError> {
        match settings.backend.parse::<StorageType>()? {
            StorageType::InMemory => Ok(Self::InMemory {
                max_usage_records: settings.max_usage_records,
            }),
            StorageType::Postgres => {
                let url = settings.database_url.as_deref().ok_or_else(|| {
                    DomainError::configuration("storage.database_url is required for postgres")
                })?;

                Ok(Self::Postgres {
                    config: PostgresConfig::new(url)
                        .with_max_connections(settings.max_connections)
                        .with_min_connections(settings.min_connections)
                        .with_connect_timeout(settings.connect_timeout_secs)
                        .with_idle_timeout(settings.idle_timeout_secs),
                    run_migrations: settings.run_migrations,
                })
            }
        }
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory { .. } => StorageType::InMemory,
            Self::Postgres { .. } => StorageType::Postgres,
        }
    }
}

/// Storage handle constructed once at startup and shared by all repositories
#[derive(Debug, Clone)]
pub enum StorageHandle {
    InMemory {
        api_keys: Arc<InMemoryApiKeyRepository>,
        usage: Arc<InMemoryUsageRepository>,
    },
    Postgres(PgPool),
}

impl StorageHandle {
    /// Open storage according to the configuration
    pub async fn connect(config: &StorageConfig) -> Result<Self, DomainError> {
        match config {
            StorageConfig::InMemory { max_usage_records } => {
                info!("Using in-memory storage");
                Ok(Self::InMemory {
                    api_keys: Arc::new(InMemoryApiKeyRepository::new()),
                    usage: Arc::new(InMemoryUsageRepository::new(*max_usage_records)),
                })
            }
            StorageConfig::Postgres {
                config,
                run_migrations,
            } => {
                let pool = connect_pool(config).await?;

                if *run_migrations {
                    run_storage_migrations(&pool).await?;
                }

                Ok(Self::Postgres(pool))
            }
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory { .. } => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }

    pub fn api_key_repository(&self) -> Arc<dyn ApiKeyRepository> {
        match self {
            Self::InMemory { api_keys, .. } => api_keys.clone(),
            Self::Postgres(pool) => Arc::new(PostgresApiKeyRepository::new(pool.clone())),
        }
    }

    pub fn usage_repository(&self) -> Arc<dyn UsageRepository> {
        match self {
            Self::InMemory { usage, .. } => usage.clone(),
            Self::Postgres(pool) => Arc::new(PostgresUsageRepository::new(pool.clone())),
        }
    }

    /// Check that the backend is reachable
    pub async fn ping(&self) -> Result<(), DomainError> {
        match self {
            Self::InMemory { .. } => Ok(()),
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(|e| DomainError::storage(format!("Ping failed: {}", e)))?;
                Ok(())
            }
        }
    }

    /// Release connections; further use of the handle fails
    pub async fn close(&self) {
        if let Self::Postgres(pool) = self {
            pool.close().await;
            info!("PostgreSQL connection pool closed");
        }
    }
}
