//! Configuration validation.
//!
//! Every violation is collected so that a misconfigured deployment reports
//! all of its problems at once instead of one per restart.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Sampling ratio must be between 0.0 and 1.0.
    InvalidSamplingRatio { value: f64 },
    /// Duration value must be positive.
    NonPositiveDuration { name: String },
    /// Duration value exceeds the allowed maximum.
    DurationTooLarge { name: String, value: u64, maximum: u64 },
    /// Warm-up size outside the allowed range.
    InvalidWarmupSize { value: u32, maximum: u32 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Required name is empty.
    EmptyName { name: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {name}: {value} (must be 1-65535)")
            }
            Self::InvalidPoolSize { min, max } => write!(
                f,
                "Invalid pool size: min ({min}) cannot be greater than max ({max})"
            ),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {value} exceeds maximum allowed ({maximum})")
            }
            Self::InvalidUrl { url_type, message } => write!(f, "Invalid {url_type} URL: {message}"),
            Self::InvalidSamplingRatio { value } => write!(
                f,
                "Invalid sampling ratio: {value} (must be between 0.0 and 1.0)"
            ),
            Self::NonPositiveDuration { name } => write!(f, "'{name}' must be positive"),
            Self::DurationTooLarge {
                name,
                value,
                maximum,
            } => write!(f, "'{name}' is {value}, exceeding the maximum of {maximum}"),
            Self::InvalidWarmupSize { value, maximum } => write!(
                f,
                "Invalid cache.warmup_size: {value} (must be between 1 and {maximum})"
            ),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level: '{value}' (valid: trace, debug, info, warn, error)"
            ),
            Self::EmptyName { name } => write!(f, "'{name}' cannot be empty"),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Maximum number of orders loaded by the warm-up.
    const MAX_WARMUP_SIZE: u32 = 1000;
    /// Upper bound for cache TTLs and the sweep interval (30 days).
    const MAX_CACHE_DURATION_SECS: u64 = 30 * 24 * 60 * 60;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(config, &mut errors);
        Self::validate_database(config, &mut errors);
        Self::validate_cache(config, &mut errors);
        Self::validate_broker(config, &mut errors);
        Self::validate_ingest(config, &mut errors);
        Self::validate_observability(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn require_positive(name: &str, value: u64, errors: &mut Vec<ConfigValidationError>) {
        if value == 0 {
            errors.push(ConfigValidationError::NonPositiveDuration {
                name: name.to_string(),
            });
        }
    }

    fn require_cache_duration(name: &str, value: u64, errors: &mut Vec<ConfigValidationError>) {
        Self::require_positive(name, value, errors);
        if value > Self::MAX_CACHE_DURATION_SECS {
            errors.push(ConfigValidationError::DurationTooLarge {
                name: name.to_string(),
                value,
                maximum: Self::MAX_CACHE_DURATION_SECS,
            });
        }
    }

    fn validate_server(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.server.port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: 0,
            });
        }
        Self::require_positive("server.request_timeout_secs", config.server.request_timeout_secs, errors);
    }

    fn validate_database(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let db = &config.database;
        if db.url.is_empty() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !db.url.starts_with("postgres://") && !db.url.starts_with("postgresql://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with postgres:// or postgresql://".to_string(),
            });
        }

        if db.min_connections > db.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: db.min_connections,
                max: db.max_connections,
            });
        }
        if db.max_connections > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: db.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        Self::require_positive("database.connect_timeout_secs", db.connect_timeout_secs, errors);
        Self::require_positive("database.idle_timeout_secs", db.idle_timeout_secs, errors);
    }

    fn validate_cache(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let cache = &config.cache;
        Self::require_cache_duration("cache.default_ttl_secs", cache.default_ttl_secs, errors);
        Self::require_cache_duration("cache.sweep_interval_secs", cache.sweep_interval_secs, errors);
        Self::require_cache_duration("cache.warmup_ttl_secs", cache.warmup_ttl_secs, errors);

        if !(1..=Self::MAX_WARMUP_SIZE).contains(&cache.warmup_size) {
            errors.push(ConfigValidationError::InvalidWarmupSize {
                value: cache.warmup_size,
                maximum: Self::MAX_WARMUP_SIZE,
            });
        }
    }

    fn validate_broker(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let broker = &config.broker;
        if !broker.url.starts_with("redis://") && !broker.url.starts_with("rediss://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "broker".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }
        if broker.pool_size == 0 || broker.pool_size > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: broker.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
        if broker.queue.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyName {
                name: "broker.queue".to_string(),
            });
        }
        Self::require_positive("broker.poll_timeout_secs", broker.poll_timeout_secs, errors);
    }

    fn validate_ingest(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let ingest = &config.ingest;
        Self::require_positive("ingest.message_timeout_secs", ingest.message_timeout_secs, errors);
        Self::require_positive("ingest.shutdown_timeout_secs", ingest.shutdown_timeout_secs, errors);
    }

    fn validate_observability(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let obs = &config.observability;
        let level = obs.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: obs.log_level.clone(),
            });
        }

        if !(0.0..=1.0).contains(&obs.sampling_ratio) {
            errors.push(ConfigValidationError::InvalidSamplingRatio {
                value: obs.sampling_ratio,
            });
        }

        if let Some(ref endpoint) = obs.otlp_endpoint {
            if Url::parse(endpoint).is_err() {
                errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "otlp_endpoint".to_string(),
                    message: format!("Invalid URL format: {endpoint}"),
                });
            }
        }
    }
}
