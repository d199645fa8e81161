//! Logging and distributed-tracing bootstrap.
//!
//! [`Telemetry::init`] installs the global `tracing` subscriber once at
//! process start and returns a handle. The handle is owned by the process
//! wiring and flushed with [`Telemetry::shutdown`] when the process stops.

#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "telemetry")]
use opentelemetry::KeyValue;
#[cfg(feature = "telemetry")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler},
    Resource,
};
#[cfg(feature = "telemetry")]
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;

use crate::{OrderlyError, OrderlyResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = OrderlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(OrderlyError::Configuration(format!(
                "unknown log format: {other}"
            ))),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to spans.
    pub service_name: String,
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
    /// Whether to export spans over OTLP.
    pub tracing_enabled: bool,
    /// OTLP endpoint URL (e.g., "http://localhost:4317").
    pub otlp_endpoint: Option<String>,
    /// Sampling ratio (0.0 to 1.0).
    pub sampling_ratio: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "orderly".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            tracing_enabled: false,
            otlp_endpoint: None,
            sampling_ratio: 1.0,
        }
    }
}

impl TelemetryConfig {
    fn filter(&self) -> OrderlyResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(format!("{},tower_http=debug", self.log_level))
            .map_err(|e| OrderlyError::Configuration(format!("invalid log filter: {e}")))
    }
}

/// Handle to the installed telemetry pipeline.
#[derive(Debug)]
pub struct Telemetry {
    otel_installed: bool,
}

impl Telemetry {
    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Fails if the filter directive is invalid, if the OTLP exporter
    /// cannot be built, or if a global subscriber is already installed.
    pub fn init(config: &TelemetryConfig) -> OrderlyResult<Self> {
        let filter = config.filter()?;

        let pretty = (config.log_format == LogFormat::Pretty)
            .then(|| tracing_subscriber::fmt::layer().with_target(true));
        let json = (config.log_format == LogFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
        });

        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(pretty)
            .with(json);

        #[cfg(feature = "telemetry")]
        let (registry, otel_installed) = {
            let otel = if config.tracing_enabled {
                Some(tracing_opentelemetry::layer().with_tracer(build_tracer(config)?))
            } else {
                None
            };
            let installed = otel.is_some();
            (registry.with(otel), installed)
        };
        #[cfg(not(feature = "telemetry"))]
        let otel_installed = false;

        registry
            .try_init()
            .map_err(|e| OrderlyError::internal(format!("failed to install subscriber: {e}")))?;

        tracing::info!(
            service_name = %config.service_name,
            log_format = ?config.log_format,
            tracing_enabled = otel_installed,
            "Telemetry initialized"
        );

        Ok(Self { otel_installed })
    }

    /// Whether spans are exported over OTLP.
    #[must_use]
    pub const fn exports_spans(&self) -> bool {
        self.otel_installed
    }

    /// Flushes pending spans.
    pub fn shutdown(&self) {
        #[cfg(feature = "telemetry")]
        if self.otel_installed {
            opentelemetry::global::shutdown_tracer_provider();
        }
        tracing::info!("Telemetry shutdown complete");
    }
}

#[cfg(feature = "telemetry")]
fn build_tracer(config: &TelemetryConfig) -> OrderlyResult<opentelemetry_sdk::trace::Tracer> {
    let sampler = if config.sampling_ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if config.sampling_ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(config.sampling_ratio)
    };

    let resource = Resource::new(vec![KeyValue::new(
        SERVICE_NAME,
        config.service_name.clone(),
    )]);

    let builder = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_sampler(sampler)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource);

    let provider = if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| OrderlyError::internal(format!("Failed to create OTLP exporter: {e}")))?;
        builder.with_batch_exporter(exporter, runtime::Tokio).build()
    } else {
        builder.build()
    };

    let tracer = provider.tracer(config.service_name.clone());
    opentelemetry::global::set_tracer_provider(provider);
    Ok(tracer)
}
