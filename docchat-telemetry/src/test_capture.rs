use std::sync::Arc;

use tracing::info_span;
use tracing_subscriber::layer::SubscriberExt;

use crate::{LogFormat, SharedTraceStorage, TraceCaptureLayer};

fn with_capture(storage: &Arc<SharedTraceStorage>, f: impl FnOnce()) {
    let subscriber =
        tracing_subscriber::registry().with(TraceCaptureLayer::new(Arc::clone(storage)));
    tracing::subscriber::with_default(subscriber, f);
}

#[test]
fn spans_are_stored_under_session_id() {
    let storage = Arc::new(SharedTraceStorage::new());

    with_capture(&storage, || {
        let span = info_span!("docchat.turn", session.id = "session-456", result_count = 3u64);
        let _guard = span.enter();
        tracing::info!("turn running");
    });

    let spans = storage.get_trace("session-456").expect("span captured");
    assert_eq!(spans.len(), 1);
    let span = &spans[0];
    assert_eq!(span.name, "docchat.turn");
    assert_eq!(span.attributes["session.id"], "session-456");
    assert_eq!(span.attributes["result_count"], 3);
    assert!(span.start_time > 0);
    assert!(span.end_time >= span.start_time);
    assert!(span.parent_span_id.is_none());
}

#[test]
fn child_spans_inherit_the_session() {
    let storage = Arc::new(SharedTraceStorage::new());

    with_capture(&storage, || {
        let outer = info_span!("docchat.ingest", session.id = "abc");
        let _outer = outer.enter();
        let inner = info_span!("embed.batch", batch_size = 8u64);
        let _inner = inner.enter();
    });

    let spans = storage.get_trace("abc").expect("spans captured");
    let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
    // Children close first.
    assert_eq!(names, vec!["embed.batch", "docchat.ingest"]);
    assert_eq!(spans[0].parent_span_id.as_deref(), Some(spans[1].span_id.as_str()));
    assert_eq!(spans[0].attributes["session.id"], "abc");
}

#[test]
fn spans_without_a_session_are_ignored() {
    let storage = Arc::new(SharedTraceStorage::new());

    with_capture(&storage, || {
        let span = info_span!("startup");
        let _guard = span.enter();
    });

    assert!(storage.session_ids().is_empty());
}

#[test]
fn recorded_fields_are_merged() {
    let storage = Arc::new(SharedTraceStorage::new());

    with_capture(&storage, || {
        let span = info_span!("docchat.turn", session.id = "s1", outcome = tracing::field::Empty);
        span.record("outcome", "ok");
    });

    let spans = storage.get_trace("s1").expect("span captured");
    assert_eq!(spans[0].attributes["outcome"], "ok");
    assert!(storage.remove("s1"));
    assert!(storage.get_trace("s1").is_none());
}

#[test]
fn span_record_serializes_with_snake_case_ids() {
    let storage = Arc::new(SharedTraceStorage::new());
    with_capture(&storage, || {
        let _span = info_span!("docchat.turn", session.id = "s2");
    });

    let json = serde_json::to_string(&storage.get_trace("s2").unwrap()[0]).unwrap();
    assert!(json.contains("\"span_id\""));
    assert!(json.contains("\"start_time\""));
    assert!(!json.contains("\"parent_span_id\""));
}

#[test]
fn log_format_parses_case_insensitively() {
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!(" text ".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert!("yaml".parse::<LogFormat>().is_err());
    assert_eq!(LogFormat::default().to_string(), "text");
}
