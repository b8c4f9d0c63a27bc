use std::io::Write;

use rustc_hash::FxHashMap;
use tracing::field::{Field, Visit};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// Writes each event as one JSON object per line on stdout, tagged with the
/// OpenTelemetry trace and span ids of the enclosing span when there is one.
pub struct JsonLogLayer;

impl<S> Layer<S> for JsonLogLayer
where
    S: tracing::Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = Visitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut line = Line {
            message: visitor.msg,
            level: meta.level().as_str().to_lowercase(),
            target: meta.target(),
            timestamp: unix_millis(),
            trace_id: String::new(),
            span_id: String::new(),
            attributes: visitor.attrs,
        };

        if let Some(span) = ctx.event_span(event) {
            let span_id = span
                .extensions()
                .get::<tracing_opentelemetry::OtelData>()
                .and_then(|otd| otd.builder.span_id);
            let trace_id = span.scope().last().and_then(|root| {
                root.extensions()
                    .get::<tracing_opentelemetry::OtelData>()
                    .and_then(|otd| otd.builder.trace_id)
            });
            if let Some((trace_id, span_id)) = trace_id.zip(span_id) {
                line.trace_id = trace_id.to_string();
                line.span_id = span_id.to_string();
            }
        }

        line.write();
    }
}

fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(Default)]
struct Visitor {
    msg: String,
    attrs: FxHashMap<&'static str, serde_json::Value>,
}

impl Visitor {
    fn insert(&mut self, field: &Field, value: serde_json::Value) {
        self.attrs.insert(field.name(), value);
    }
}

impl Visit for Visitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.msg = format!("{:?}", value);
        } else {
            self.insert(field, format!("{:?}", value).into());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.msg = value.into();
        } else {
            self.insert(field, value.into());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }
}

#[derive(serde::Serialize)]
struct Line {
    #[serde(rename = "msg")]
    message: String,
    #[serde(rename = "lvl")]
    level: String,
    target: &'static str,
    #[serde(rename = "ts")]
    timestamp: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    trace_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    span_id: String,
    #[serde(rename = "attrs", skip_serializing_if = "FxHashMap::is_empty")]
    attributes: FxHashMap<&'static str, serde_json::Value>,
}

impl Line {
    fn write(&self) {
        let mut buffer = Vec::with_capacity(512);
        if serde_json::to_writer(&mut buffer, self).is_err() {
            return;
        }
        buffer.push(b'\n');
        let _ = std::io::stdout().lock().write_all(&buffer);
    }
}
