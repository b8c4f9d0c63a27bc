mod logging;
mod tracing;

use opentelemetry_sdk::trace as sdktrace;
pub use tracing_subscriber::filter::LevelFilter;

pub use logging::JsonLogLayer;

pub struct InstrumentGuard {
    tracer_provider: sdktrace::SdkTracerProvider,
}

/// Install the global subscriber. The returned guard flushes spans when dropped.
pub fn init(service: &str, level: LevelFilter) -> anyhow::Result<InstrumentGuard> {
    let provider = tracing::init(service, level)?;
    Ok(InstrumentGuard {
        tracer_provider: provider,
    })
}

impl Drop for InstrumentGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("Error shutting down tracer provider: {:?}", err);
        }
    }
}
