//! OpenTelemetry integration for pontifex.
//!
//! Enable with `--features telemetry`. Trace spans emitted through the
//! `tracing` crate are exported over OTLP; configuration arrives either
//! from the host as JSON or from the standard `OTEL_EXPORTER_OTLP_*`
//! environment variables when no endpoint is given.

use std::time::Duration;

use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, Sampler};
use opentelemetry_sdk::{runtime, Resource};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default span-batch flush interval.
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5000;

/// Telemetry configuration, typically handed over by the host as JSON.
///
/// ```json
/// {
///   "traces": { "endpoint": "http://localhost:4317", "sample_percentage": 10 },
///   "flush_interval_ms": 1000
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Trace export settings; traces are disabled when absent
    #[serde(default)]
    pub traces: Option<TracesConfig>,
    /// How often batched spans are flushed to the collector
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,
}

/// Trace exporter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TracesConfig {
    /// OTLP collector endpoint; falls back to `OTEL_EXPORTER_OTLP_ENDPOINT`
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Percentage of requests to sample, 0–100; absent means sample all
    #[serde(default)]
    pub sample_percentage: Option<u32>,
}

fn default_flush_interval() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

impl TelemetryConfig {
    /// Parses a configuration from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns the serde error for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Initialize OpenTelemetry tracing.
///
/// This sets up:
/// - OTLP exporter for traces (endpoint from config or environment)
/// - Integration with the `tracing` crate
/// - Service name and version metadata
///
/// # Errors
///
/// Returns an error if the OTLP exporter fails to initialize.
pub fn init_telemetry(
    config: &TelemetryConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let resource = Resource::new(vec![
        KeyValue::new("service.name", "pontifex"),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    let mut exporter_builder = opentelemetry_otlp::SpanExporter::builder().with_tonic();
    if let Some(endpoint) = config.traces.as_ref().and_then(|t| t.endpoint.as_deref()) {
        exporter_builder = exporter_builder.with_endpoint(endpoint.to_string());
    }
    let exporter = exporter_builder.build()?;

    let batch_config = BatchConfigBuilder::default()
        .with_scheduled_delay(Duration::from_millis(config.flush_interval_ms))
        .build();
    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio)
        .with_batch_config(batch_config)
        .build();

    let sampler = match config.traces.as_ref().and_then(|t| t.sample_percentage) {
        Some(pct) => Sampler::TraceIdRatioBased(f64::from(pct.min(100)) / 100.0),
        None => Sampler::AlwaysOn,
    };

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_resource(resource)
        .with_sampler(sampler)
        .with_span_processor(processor)
        .build();

    let tracer = provider.tracer("pontifex");

    // Register the global tracer provider
    opentelemetry::global::set_tracer_provider(provider);

    // Create the OpenTelemetry tracing layer
    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    // Set up the subscriber with both fmt and telemetry layers
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    Ok(())
}

/// Shutdown OpenTelemetry, flushing any pending spans.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}

/// A guard that shuts down telemetry when dropped.
pub struct TelemetryGuard;

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        shutdown_telemetry();
    }
}

/// Initialize telemetry and return a guard that cleans up on drop.
///
/// # Errors
///
/// Returns an error if telemetry initialization fails.
pub fn init_telemetry_with_guard(
    config: &TelemetryConfig,
) -> Result<TelemetryGuard, Box<dyn std::error::Error + Send + Sync>> {
    init_telemetry(config)?;
    Ok(TelemetryGuard)
}
