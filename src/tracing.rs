use miette::{IntoDiagnostic, WrapErr};
use opentelemetry::InstrumentationScope;
use opentelemetry::trace::TracerProvider;
use opentelemetry_resource_detectors::{HostResourceDetector, OsResourceDetector};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::resource::{EnvResourceDetector, ResourceDetector};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config;

/// Returns a list of resource detectors to use to enrich OTel attributes.
fn otel_resource_detectors() -> Vec<Box<dyn ResourceDetector>> {
    vec![
        Box::new(EnvResourceDetector::default()),
        Box::new(OsResourceDetector),
        Box::new(HostResourceDetector::default()),
    ]
}

/// Initializes the tracing subscriber, exporting spans over OTLP when enabled.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built or if a subscriber is already
/// installed.
pub fn try_init(tracing: &config::TracingConfig) -> miette::Result<()> {
    let telemetry_layer = if tracing.enabled {
        let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .build()
            .into_diagnostic()
            .wrap_err("building otlp http exporter failed")?;
        let res_detectors = otel_resource_detectors();
        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(otlp_exporter)
            .with_resource(
                Resource::builder_empty()
                    .with_service_name(env!("CARGO_PKG_NAME"))
                    .with_detectors(&res_detectors)
                    .build(),
            )
            .build();
        let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        let tracer = provider.tracer_with_scope(scope);

        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let stdout_layer = tracing_subscriber::fmt::layer().json();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iota=debug".into()),
        )
        .with(telemetry_layer)
        .with(stdout_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("could not init registry")?;

    info!("tracing initialized");

    Ok(())
}
