//! In-memory capture of sync run events
//!
//! Tests install [`init_test_capture`] and then look up what a reconcile or
//! sync run reported for one collection: its boundary events, the counters on
//! `end`, the `err_code` on `end_error`, and the per-record warnings that
//! carry an `identity` or `tag_path`.

use dynsync_core_types::schema::{
    FIELD_COLLECTION, FIELD_COMPONENT, FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_ERR_KIND,
    FIELD_EVENT, FIELD_IDENTITY, FIELD_OP, FIELD_RUN_ID, FIELD_TAG_PATH,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::Visit;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One event emitted during a run
///
/// `op`, `event` and `collection` are lifted out for matching; every field,
/// including those three, stays in `fields` as its rendered string.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub op: Option<String>,
    pub event: Option<String>,
    pub collection: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    /// Field value parsed as an unsigned counter (`new`, `deleted`, ...)
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(|v| v.parse().ok())
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Module path of the emitter
    pub fn component(&self) -> Option<&str> {
        self.field(FIELD_COMPONENT)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.counter(FIELD_DURATION_MS)
    }

    pub fn run_id(&self) -> Option<&str> {
        self.field(FIELD_RUN_ID)
    }

    /// Record identity on a per-record warning
    pub fn identity(&self) -> Option<&str> {
        self.field(FIELD_IDENTITY)
    }

    /// Tag path on a schema drift event
    pub fn tag_path(&self) -> Option<&str> {
        self.field(FIELD_TAG_PATH)
    }

    /// Stable error code, e.g. `ERR_EMPTY_SNAPSHOT`
    pub fn err_code(&self) -> Option<&str> {
        self.field(FIELD_ERR_CODE)
    }

    /// Debug rendering of the `ExErrorKind`
    pub fn err_kind(&self) -> Option<&str> {
        self.field(FIELD_ERR_KIND)
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

/// Layer feeding the buffer behind a [`TestCapture`]
pub struct TestCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = Self {
            events: events.clone(),
        };
        (layer, TestCapture { events })
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let captured = CapturedEvent {
            level: *event.metadata().level(),
            op: visitor.fields.get(FIELD_OP).cloned(),
            event: visitor.fields.get(FIELD_EVENT).cloned(),
            collection: visitor.fields.get(FIELD_COLLECTION).cloned(),
            fields: visitor.fields,
        };

        self.events
            .lock()
            .map(|mut events| events.push(captured))
            .ok();
    }
}

/// Read side of the capture buffer
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Snapshot of everything captured so far, oldest first
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Most recent `op`/`event` pair logged for `collection`
    ///
    /// The buffer is shared by every test in the binary; give each test its
    /// own collection name.
    pub fn last_for(&self, op: &str, event: &str, collection: &str) -> Option<CapturedEvent> {
        self.events().into_iter().rev().find(|e| {
            e.op.as_deref() == Some(op)
                && e.event.as_deref() == Some(event)
                && e.collection.as_deref() == Some(collection)
        })
    }

    /// Assert that some collection logged `event` for `op`
    ///
    /// # Panics
    ///
    /// Panics when no captured event matches.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        let found = events
            .iter()
            .any(|e| e.op.as_deref() == Some(op) && e.event.as_deref() == Some(event));
        assert!(
            found,
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }

    /// Number of captured events accepted by `predicate`
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber
///
/// The first call wins; later calls hand back the same buffer. Do not mix
/// with `logging_facility::init`, which also sets the global subscriber.
///
/// # Example
///
/// ```
/// use dynsync_core::logging_facility::test_capture::init_test_capture;
/// use dynsync_core::{log_op_end, log_op_start};
///
/// let capture = init_test_capture();
/// log_op_start!("reconcile", collection = "doc_articles");
/// log_op_end!("reconcile", duration_ms = 7, collection = "doc_articles", new = 2_u64);
///
/// let end = capture.last_for("reconcile", "end", "doc_articles").unwrap();
/// assert_eq!(end.counter("new"), Some(2));
/// assert_eq!(end.duration_ms(), Some(7));
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}
