use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Installs the global tracing subscriber. With telemetry disabled this is
/// plain formatted logging; enabled, log records and spans are also shipped
/// to the configured OTLP collector.
pub fn init(config: &TelemetryConfig) -> Result<()> {
    let filter = log_filter(&config.log_level, &config.excluded_modules)?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_thread_names(true);
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    if !config.enabled {
        registry.init();
        return Ok(());
    }

    let logger_provider = otlp_logger_provider(config)?;
    let tracer_provider = otlp_tracer_provider(config)?;
    let tracer = tracer_provider.tracer(config.service_name.clone());

    registry
        .with(OpenTelemetryTracingBridge::new(&logger_provider))
        .with(OpenTelemetryLayer::new(tracer))
        .init();

    Ok(())
}

fn log_filter(log_level: &str, excluded_modules: &[String]) -> Result<EnvFilter> {
    let mut filter = EnvFilter::new(log_level);
    for module in excluded_modules {
        filter = filter.add_directive(format!("{}=off", module).parse()?);
    }
    Ok(filter)
}

fn resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .build()
}

fn otlp_tracer_provider(config: &TelemetryConfig) -> Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create span exporter: {}", e))?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource(config))
        .with_batch_exporter(exporter)
        .build())
}

fn otlp_logger_provider(config: &TelemetryConfig) -> Result<SdkLoggerProvider> {
    let exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create log exporter: {}", e))?;

    Ok(SdkLoggerProvider::builder()
        .with_resource(resource(config))
        .with_batch_exporter(exporter)
        .build())
}
