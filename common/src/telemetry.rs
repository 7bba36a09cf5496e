// Telemetry module for structured logging, metrics, and tracing

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::models::Signal;

/// Initialize structured logging with JSON formatting
///
/// Sets up the tracing subscriber with JSON output, log levels from
/// configuration or environment, and an optional OpenTelemetry layer.
pub fn init_logging(log_level: &str, tracing_endpoint: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_target(true)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(json_layer);

    if let Some(endpoint) = tracing_endpoint {
        let tracer = init_tracer(endpoint)?;
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        registry
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(
        log_level = log_level,
        tracing_endpoint = tracing_endpoint,
        "Structured logging initialized"
    );

    Ok(())
}

/// Initialize OpenTelemetry tracer with OTLP exporter
fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", "nepse-signals"),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());
    let tracer = tracer_provider.tracer("nepse-signals");

    tracing::info!(endpoint = endpoint, "OpenTelemetry tracer initialized");

    Ok(tracer)
}

/// Shutdown OpenTelemetry tracer provider
///
/// Call on graceful shutdown to flush remaining spans.
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Initialize Prometheus metrics exporter and register run metrics
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!("run_success_total", "Total number of successful pipeline runs");
    describe_counter!("run_failed_total", "Total number of failed pipeline runs");
    describe_histogram!(
        "run_duration_seconds",
        "Duration of pipeline runs in seconds"
    );
    describe_counter!(
        "stocks_analyzed_total",
        "Total number of stocks analyzed across runs"
    );
    describe_counter!(
        "signals_emitted_total",
        "Total number of signals emitted, labeled by signal"
    );

    tracing::info!(
        metrics_port = metrics_port,
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Record a successful pipeline run
#[inline]
pub fn record_run_success(run_id: &Uuid) {
    counter!("run_success_total", "run_id" => run_id.to_string()).increment(1);
}

/// Record a failed pipeline run, labeled with the failing step
#[inline]
pub fn record_run_failure(run_id: &Uuid, step: &str) {
    counter!(
        "run_failed_total",
        "run_id" => run_id.to_string(),
        "step" => step.to_string()
    )
    .increment(1);
}

/// Record pipeline run duration
#[inline]
pub fn record_run_duration(run_id: &Uuid, duration_seconds: f64) {
    histogram!("run_duration_seconds", "run_id" => run_id.to_string()).record(duration_seconds);
}

/// Record how many stocks a run analyzed
#[inline]
pub fn record_stocks_analyzed(count: u64) {
    counter!("stocks_analyzed_total").increment(count);
}

/// Record an emitted signal
#[inline]
pub fn record_signal_emitted(signal: Signal) {
    counter!("signals_emitted_total", "signal" => signal.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording_does_not_panic() {
        let run_id = Uuid::new_v4();
        record_run_success(&run_id);
        record_run_failure(&run_id, "publish");
        record_run_duration(&run_id, 12.5);
        record_stocks_analyzed(250);
        record_signal_emitted(Signal::Buy);
    }

    #[test]
    fn test_init_logging_with_valid_level() {
        // May already be initialized by another test in the same process
        let result = init_logging("info", None);
        assert!(result.is_ok() || result.is_err());
    }
}
