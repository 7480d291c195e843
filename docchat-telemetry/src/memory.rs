use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{Id, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// The span field that keys captured traces.
pub const SESSION_ID_FIELD: &str = "session.id";

/// A closed span as captured by [`TraceCaptureLayer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub name: String,
    /// Nanoseconds since the Unix epoch.
    pub start_time: u128,
    pub end_time: u128,
    pub attributes: HashMap<String, serde_json::Value>,
}

impl SpanRecord {
    /// Wall-clock time the span was open, in nanoseconds.
    pub fn duration_nanos(&self) -> u128 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Captured spans grouped by session id.
#[derive(Debug, Clone, Default)]
pub struct SharedTraceStorage {
    traces: Arc<RwLock<HashMap<String, Vec<SpanRecord>>>>,
}

impl SharedTraceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans recorded for `session_id`, in close order.
    pub fn get_trace(&self, session_id: &str) -> Option<Vec<SpanRecord>> {
        self.traces.read().ok()?.get(session_id).cloned()
    }

    pub fn add_span(&self, session_id: String, span: SpanRecord) {
        if let Ok(mut traces) = self.traces.write() {
            traces.entry(session_id).or_default().push(span);
        }
    }

    /// Every session id with at least one captured span.
    pub fn session_ids(&self) -> Vec<String> {
        self.traces.read().map(|t| t.keys().cloned().collect()).unwrap_or_default()
    }

    /// Forget the spans of one session. Returns whether any were stored.
    pub fn remove(&self, session_id: &str) -> bool {
        self.traces.write().map(|mut t| t.remove(session_id).is_some()).unwrap_or(false)
    }
}

/// A tracing layer that records closed spans into [`SharedTraceStorage`].
///
/// Spans are stored under their `session.id` field. A span without one
/// inherits it from the nearest ancestor; spans with no session in scope are
/// not recorded.
pub struct TraceCaptureLayer {
    storage: Arc<SharedTraceStorage>,
}

impl TraceCaptureLayer {
    pub fn new(storage: Arc<SharedTraceStorage>) -> Self {
        Self { storage }
    }
}

struct StartTime(u128);

#[derive(Clone)]
struct SpanFields(HashMap<String, serde_json::Value>);

fn now_nanos() -> u128 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_nanos()
}

impl<S> Layer<S> for TraceCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        let mut fields = visitor.0;

        // Inherit the session from the parent unless overridden
        if !fields.contains_key(SESSION_ID_FIELD) {
            if let Some(parent) = span.parent() {
                let parent_extensions = parent.extensions();
                let inherited = parent_extensions
                    .get::<SpanFields>()
                    .and_then(|f| f.0.get(SESSION_ID_FIELD))
                    .cloned();
                if let Some(session_id) = inherited {
                    fields.insert(SESSION_ID_FIELD.to_string(), session_id);
                }
            }
        }

        let mut extensions = span.extensions_mut();
        extensions.insert(StartTime(now_nanos()));
        extensions.insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let extensions = span.extensions();
        let Some(fields) = extensions.get::<SpanFields>() else {
            return;
        };
        let Some(session_id) = fields.0.get(SESSION_ID_FIELD).and_then(|v| v.as_str()) else {
            return;
        };

        let record = SpanRecord {
            span_id: format!("{:016x}", id.into_u64()),
            parent_span_id: span.parent().map(|p| format!("{:016x}", p.id().into_u64())),
            name: span.metadata().name().to_string(),
            start_time: extensions.get::<StartTime>().map(|s| s.0).unwrap_or(0),
            end_time: now_nanos(),
            attributes: fields.0.clone(),
        };
        self.storage.add_span(session_id.to_string(), record);
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}
