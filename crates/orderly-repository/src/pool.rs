//! Database connection pool management.

use async_trait::async_trait;
use orderly_config::DatabaseConfig;
use orderly_core::{HealthCheck, HealthStatus, Interface, OrderlyError, OrderlyResult};
use shaku::Component;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::{info, warn};

/// Interface for database pool operations.
///
/// This trait abstracts database pool functionality for dependency injection.
#[async_trait]
pub trait DatabasePoolInterface: Interface + Send + Sync {
    /// Returns a reference to the underlying Postgres pool.
    fn inner(&self) -> &PgPool;

    /// Checks if the database connection is healthy.
    async fn health_check(&self) -> OrderlyResult<()>;

    /// Runs database migrations.
    async fn run_migrations(&self) -> OrderlyResult<()>;

    /// Closes the database pool.
    async fn close(&self);
}

/// Database pool wrapper.
#[derive(Component)]
#[shaku(interface = DatabasePoolInterface)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connects a new pool using `config`.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if no connection can be established.
    pub async fn connect(config: &DatabaseConfig) -> OrderlyResult<Self> {
        info!("Connecting to Postgres...");

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                OrderlyError::StoreUnavailable(format!("Failed to connect: {e}"))
            })?;

        info!("Postgres connection pool established");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePoolInterface for DatabasePool {
    fn inner(&self) -> &PgPool {
        &self.pool
    }

    async fn health_check(&self) -> OrderlyResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn run_migrations(&self) -> OrderlyResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OrderlyError::Database(format!("Migration failed: {e}")))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Readiness probe backed by `SELECT 1`.
pub struct DatabaseHealthCheck {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl DatabaseHealthCheck {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for DatabaseHealthCheck {
    async fn check(&self) -> HealthStatus {
        match self.pool.health_check().await {
            Ok(()) => HealthStatus::up("database"),
            Err(e) => HealthStatus::down("database", e),
        }
    }
}

/// Creates a shared database pool.
///
/// # Errors
///
/// See [`DatabasePool::connect`].
pub async fn create_pool(config: &DatabaseConfig) -> OrderlyResult<Arc<DatabasePool>> {
    let pool = DatabasePool::connect(config).await?;
    Ok(Arc::new(pool))
}
