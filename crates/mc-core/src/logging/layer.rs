//! JSONL tracing layer.
//!
//! One JSON object per event: `ts`, `level`, the correlation keys
//! (`event`, `run_id`, `source_id`, `stage`), `message`, and every other
//! field under `fields`. Correlation keys missing on the event are taken
//! from the innermost enclosing span that recorded them; `event` falls
//! back to the event's target.

use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

const CORRELATION_KEYS: [&str; 4] = ["event", "run_id", "source_id", "stage"];

/// Field values recorded by a visitor.
#[derive(Debug, Default)]
struct Fields(Map<String, Value>);

impl Fields {
    fn put(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::from(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // JSON has no NaN or infinity
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(value.to_string()));
        self.put(field, value);
    }
}

/// Correlation keys of a span, stored in its extensions.
#[derive(Debug, Default)]
struct SpanIds(Map<String, Value>);

/// Tracing layer writing JSONL to `W` (stderr by default).
pub struct JsonlLayer<W = io::Stderr> {
    sink: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(sink: W) -> Self {
        JsonlLayer {
            sink: Mutex::new(sink),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        attrs.record(&mut fields);
        let ids: Map<String, Value> = fields
            .0
            .into_iter()
            .filter(|(k, _)| CORRELATION_KEYS.contains(&k.as_str()))
            .collect();
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanIds(ids));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let mut fields = fields.0;

        let mut line = Map::new();
        line.insert("ts".into(), Value::from(chrono::Utc::now().to_rfc3339()));
        line.insert(
            "level".into(),
            serde_json::to_value(Level::from(*event.metadata().level())).unwrap_or(Value::Null),
        );

        for key in CORRELATION_KEYS {
            if let Some(v) = fields.remove(key) {
                line.insert(key.into(), v);
            }
        }
        // innermost span first
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(SpanIds(ids)) = span.extensions().get::<SpanIds>() {
                    for (k, v) in ids {
                        line.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            }
        }
        line.entry("event")
            .or_insert_with(|| Value::from(event.metadata().target()));

        if let Some(message) = fields.remove("message") {
            line.insert("message".into(), message);
        }
        if !fields.is_empty() {
            line.insert("fields".into(), Value::Object(fields));
        }

        let Ok(text) = serde_json::to_string(&line) else {
            return;
        };
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{}", text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines_of(f: impl FnOnce()) -> Vec<Value> {
        let sink = Captured::default();
        let subscriber = tracing_subscriber::registry().with(JsonlLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn target_names_unnamed_events() {
        let lines = lines_of(|| tracing::info!(target: "mc_core::window", "aggregated"));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "mc_core::window");
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["message"], "aggregated");
        assert!(lines[0]["ts"].is_string());
        assert!(lines[0].get("fields").is_none());
    }

    #[test]
    fn correlation_keys_are_lifted() {
        let lines = lines_of(|| {
            tracing::warn!(
                event = "detect.failed",
                run_id = "run-1",
                stage = "detect",
                kind = "distance",
                "worker failed"
            )
        });
        assert_eq!(lines[0]["event"], "detect.failed");
        assert_eq!(lines[0]["run_id"], "run-1");
        assert_eq!(lines[0]["stage"], "detect");
        assert_eq!(lines[0]["fields"]["kind"], "distance");
        assert!(lines[0]["fields"].get("run_id").is_none());
    }

    #[test]
    fn inner_span_wins_over_outer() {
        let lines = lines_of(|| {
            let outer = tracing::info_span!("run", run_id = "run-outer", source_id = "src-a");
            let _o = outer.enter();
            let inner = tracing::info_span!("job", source_id = "src-b");
            let _i = inner.enter();
            tracing::debug!(rows = 42u64, "loaded");
        });
        assert_eq!(lines[0]["run_id"], "run-outer");
        assert_eq!(lines[0]["source_id"], "src-b");
        assert_eq!(lines[0]["fields"]["rows"], 42);
    }

    #[test]
    fn event_fields_beat_span_fields() {
        let lines = lines_of(|| {
            let span = tracing::info_span!("run", run_id = "run-span");
            let _g = span.enter();
            tracing::info!(run_id = "run-event", "x");
        });
        assert_eq!(lines[0]["run_id"], "run-event");
    }

    #[test]
    fn non_finite_floats_are_strings() {
        let lines = lines_of(|| tracing::info!(score = f64::INFINITY, p = f64::NAN, "scores"));
        assert_eq!(lines[0]["fields"]["score"], "inf");
        assert_eq!(lines[0]["fields"]["p"], "NaN");
    }
}
