//! Application wiring and lifecycle.

use crate::di::build_persistence_module;
use crate::startup::print_startup_info;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use orderly_config::AppConfig;
use orderly_core::{HealthCheck, OrderlyError, OrderlyResult, ShutdownCoordinator, Telemetry};
use orderly_ingest::{
    create_pool as create_broker_pool, BrokerHealthCheck, ConsumerConfig, IngestConsumer,
    RedisOrderQueue,
};
use orderly_repository::{DatabaseHealthCheck, DatabasePool, DatabasePoolInterface};
use orderly_rest::{create_router, AppState};
use orderly_service::{OrderService, OrderServiceImpl, TtlCache};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// The assembled process.
///
/// Owns the configuration and the shutdown coordinator; every component that
/// runs a background task registers its close hook there.
pub struct Application {
    config: AppConfig,
    shutdown: Arc<ShutdownCoordinator>,
}

impl Application {
    pub fn new(config: AppConfig, shutdown: Arc<ShutdownCoordinator>) -> Self {
        Self { config, shutdown }
    }

    /// Runs until Ctrl-C or SIGTERM, then shuts every component down.
    pub async fn run(self, telemetry: Telemetry) -> OrderlyResult<()> {
        let config = &self.config;
        info!(
            environment = %config.app.environment,
            run_mode = %config.app.run_mode,
            "Starting Orderly"
        );

        let telemetry = Arc::new(telemetry);
        self.shutdown.register("telemetry", {
            let telemetry = Arc::clone(&telemetry);
            move || async move { telemetry.shutdown() }
        });

        let metrics = if config.observability.metrics_enabled {
            Some(install_metrics()?)
        } else {
            None
        };

        // Store
        let db_pool = DatabasePool::connect(&config.database).await?;
        let module = build_persistence_module(&db_pool);
        let pool = module.database_pool();
        pool.run_migrations().await?;
        self.shutdown.register("database", {
            let pool = Arc::clone(&pool);
            move || async move { pool.close().await }
        });

        let mut health_checks: Vec<Arc<dyn HealthCheck>> =
            vec![Arc::new(DatabaseHealthCheck::new(Arc::clone(&pool)))];

        // Cache
        let cache = Arc::new(TtlCache::new(
            config.cache.default_ttl(),
            config.cache.sweep_interval(),
        ));
        self.shutdown.register("cache-sweeper", {
            let cache = Arc::clone(&cache);
            move || async move { cache.stop().await }
        });

        let order_service = Arc::new(OrderServiceImpl::new(
            module.order_repository(),
            cache,
            config.cache.warmup_ttl(),
        ));

        if config.app.run_mode.serves_api() {
            match order_service.warm_up(config.cache.warmup_size).await {
                Ok(count) => info!(count, "Cache warm-up complete"),
                Err(e) => warn!(error = %e, "Cache warm-up failed, starting with a cold cache"),
            }
        }

        // Ingestion
        if config.app.run_mode.consumes() {
            let broker_pool = create_broker_pool(&config.broker).await?;
            health_checks.push(Arc::new(BrokerHealthCheck::new(broker_pool.clone())));

            let queue = Arc::new(RedisOrderQueue::new(broker_pool, &config.broker));
            let consumer = Arc::new(IngestConsumer::new(
                queue,
                module.ingest_service(),
                ConsumerConfig::new(&config.broker, &config.ingest),
            ));

            let handle = tokio::spawn({
                let consumer = Arc::clone(&consumer);
                async move {
                    if let Err(e) = consumer.start().await {
                        error!(error = %e, "Ingestion consumer failed");
                    }
                }
            });

            self.shutdown.register("consumer", move || async move {
                consumer.stop();
                if let Err(e) = handle.await {
                    warn!(error = %e, "Consumer task ended abnormally");
                }
            });
        }

        // HTTP
        if config.app.run_mode.serves_api() {
            let mut state = AppState::new(order_service as Arc<dyn OrderService>);
            for check in health_checks {
                state = state.with_health_check(check);
            }
            if let Some(handle) = metrics {
                state = state.with_metrics(handle);
            }

            let router = create_router(state, &config.server);
            let addr = config.server.addr();
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|e| OrderlyError::internal(format!("Failed to bind {addr}: {e}")))?;

            print_startup_info(config);

            let mut stop_rx = self.shutdown.subscribe();
            let server = tokio::spawn(async move {
                let graceful = async move {
                    let _ = stop_rx.recv().await;
                };
                if let Err(e) = axum::serve(listener, router)
                    .with_graceful_shutdown(graceful)
                    .await
                {
                    error!(error = %e, "HTTP server error");
                }
            });

            self.shutdown.register("http-server", move || async move {
                if let Err(e) = server.await {
                    warn!(error = %e, "HTTP server task ended abnormally");
                }
            });
        }

        shutdown_signal().await;
        self.shutdown.shutdown().await;

        info!("Server shutdown complete");
        Ok(())
    }
}

fn install_metrics() -> OrderlyResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| OrderlyError::internal(format!("Failed to install metrics recorder: {e}")))?;

    orderly_service::metrics::register_metrics();
    orderly_ingest::metrics::register_metrics();

    Ok(handle)
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
