//! Observability for the oracle node.
//!
//! Stdout logging + optional OpenTelemetry OTLP export.

use anyhow::{Context, Result};
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    logs::SdkLoggerProvider,
    propagation::TraceContextPropagator,
    resource::Resource,
    trace::{Sampler, SdkTracerProvider, Tracer},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::cli::config::ObservabilityConfig;

/// Shuts OpenTelemetry down on drop, if it was enabled.
pub struct ObservabilityGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            let _ = provider.shutdown();
        }
        // dropping the logger provider flushes its processors
        self.logger_provider.take();
    }
}

/// Installs the global tracing subscriber.
///
/// Keep the returned guard alive until the process exits.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_observability(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let filter = || EnvFilter::new(config.level().as_str().to_lowercase());
    let fmt_layer = || {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
    };

    if config.use_otel {
        match (setup_otlp_tracer(config), setup_otlp_logger(config)) {
            (Ok((tracer, tracer_provider)), Ok(logger_provider)) => {
                Registry::default()
                    .with(filter())
                    .with(fmt_layer())
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .with(OpenTelemetryTracingBridge::new(&logger_provider))
                    .try_init()
                    .context("Failed to set global default subscriber")?;
                return Ok(ObservabilityGuard {
                    tracer_provider: Some(tracer_provider),
                    logger_provider: Some(logger_provider),
                });
            }
            (Err(e), _) | (_, Err(e)) => eprintln!("OpenTelemetry disabled: {e}"),
        }
    }

    Registry::default()
        .with(filter())
        .with(fmt_layer())
        .try_init()
        .context("Failed to set global default subscriber")?;

    Ok(ObservabilityGuard {
        tracer_provider: None,
        logger_provider: None,
    })
}

fn resource(config: &ObservabilityConfig) -> Resource {
    Resource::builder()
        .with_attributes(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build()
}

fn setup_otlp_tracer(config: &ObservabilityConfig) -> Result<(Tracer, SdkTracerProvider)> {
    let mut exporter = opentelemetry_otlp::SpanExporter::builder().with_tonic();
    if let Some(endpoint) = &config.otel_endpoint {
        exporter = exporter.with_endpoint(endpoint);
    }

    let provider = SdkTracerProvider::builder()
        .with_resource(resource(config))
        .with_sampler(Sampler::AlwaysOn)
        .with_batch_exporter(exporter.build()?)
        .build();
    let tracer = provider.tracer(config.service_name.clone());

    Ok((tracer, provider))
}

fn setup_otlp_logger(config: &ObservabilityConfig) -> Result<SdkLoggerProvider> {
    let mut exporter = opentelemetry_otlp::LogExporter::builder().with_tonic();
    if let Some(endpoint) = &config.otel_endpoint {
        exporter = exporter.with_endpoint(endpoint);
    }

    Ok(SdkLoggerProvider::builder()
        .with_resource(resource(config))
        .with_batch_exporter(exporter.build()?)
        .build())
}
