use opentelemetry::{global, trace::TracerProvider};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use opentelemetry_stdout::SpanExporter;
use tracing_subscriber::{Layer, Registry, filter::LevelFilter, layer::SubscriberExt};

use super::logging::JsonLogLayer;

pub fn init(service: &str, level: LevelFilter) -> anyhow::Result<SdkTracerProvider> {
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(SpanExporter::default())
        .with_resource(
            Resource::builder()
                .with_service_name(service.to_owned())
                .build(),
        )
        .build();

    let telemetry = tracing_opentelemetry::layer()
        .with_tracer(provider.tracer(service.to_owned()))
        .with_filter(level);

    let subscriber = Registry::default()
        .with(telemetry)
        .with(JsonLogLayer.with_filter(level));

    tracing::subscriber::set_global_default(subscriber)?;

    global::set_tracer_provider(provider.clone());
    Ok(provider)
}
