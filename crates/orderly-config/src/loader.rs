//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use orderly_core::OrderlyError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "ORDERLY";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `ORDERLY_` prefix and `__` separator
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a source cannot be read or the merged
    /// configuration fails validation.
    pub fn new(config_dir: impl Into<String>) -> Result<Self, OrderlyError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::new`].
    pub fn from_default_location() -> Result<Self, OrderlyError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    ///
    /// # Errors
    ///
    /// The previous configuration stays in place if loading fails.
    pub async fn reload(&self) -> Result<(), OrderlyError> {
        let new_config = Self::load_config(&self.config_dir)?;
        *self.config.write().await = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    fn load_config(config_dir: &str) -> Result<AppConfig, OrderlyError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = std::env::var(format!("{ENV_PREFIX}_ENVIRONMENT"))
            .unwrap_or_else(|_| "development".to_string());
        info!(environment = %environment, "Loading configuration");

        let mut builder = Config::builder();
        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{config_dir}/{name}.toml");
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error_to_orderly_error)?;

        if app_config.app.environment.is_empty() {
            app_config.app.environment = environment;
        }

        ConfigValidator::validate(&app_config).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            OrderlyError::Configuration(message)
        })?;

        Ok(app_config)
    }

    /// Gets a specific configuration value by dotted key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_orderly_error(err: ConfigError) -> OrderlyError {
    OrderlyError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_missing_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("absent").to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.cache.sweep_interval_secs, 60);
    }

    #[tokio::test]
    async fn test_default_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[cache]\ndefault_ttl_secs = 120\nwarmup_ttl_secs = 30\n",
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.cache.default_ttl_secs, 120);
        assert_eq!(config.cache.warmup_ttl_secs, 30);
        assert_eq!(
            loader.get_value::<u64>("cache.default_ttl_secs").await,
            Some(120)
        );
    }

    #[tokio::test]
    async fn test_local_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[server]\nport = 8080\n").unwrap();
        fs::write(dir.path().join("local.toml"), "[server]\nport = 9000\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        assert_eq!(loader.get().await.server.port, 9000);
    }

    #[tokio::test]
    async fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[database]\nurl = \"mysql://localhost/orders\"\n",
        )
        .unwrap();

        let result = ConfigLoader::new(dir.path().to_string_lossy());
        assert!(matches!(result, Err(OrderlyError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        fs::write(&path, "[ingest]\nretry_backoff_ms = 100\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        assert_eq!(loader.get().await.ingest.retry_backoff_ms, 100);

        fs::write(&path, "[ingest]\nretry_backoff_ms = 250\n").unwrap();
        loader.reload().await.unwrap();
        assert_eq!(loader.get().await.ingest.retry_backoff_ms, 250);
    }
}
