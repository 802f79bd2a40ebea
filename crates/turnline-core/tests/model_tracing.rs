#![forbid(unsafe_code)]

//! Structured logging emitted by the marker model and discovery chain.
//!
//! Run:
//!   cargo test -p turnline-core --test model_tracing

use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use turnline_core::discovery::{DiscoveryChain, FnSource};
use turnline_core::marker::{MarkerModel, SourceRef, SummaryRules, TurnRecord};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct EventCapture(Arc<Mutex<Vec<CapturedEvent>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0,
        });
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedEvent>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture(events.clone()));
    let result = tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    (result, captured)
}

fn turns(n: usize) -> Vec<TurnRecord> {
    (0..n)
        .map(|i| TurnRecord::new(format!("t{i}"), SourceRef::new(i as u64), i as f64, "hi"))
        .collect()
}

#[test]
fn rebuild_logs_count_and_version() {
    let mut model = MarkerModel::new(SummaryRules::default());
    let (_, events) = capture(|| model.rebuild(&turns(4)));

    let rebuilt = events
        .iter()
        .find(|e| e.target == "turnline.model" && e.field("message") == Some("markers rebuilt"))
        .expect("rebuild event");
    assert_eq!(rebuilt.level, tracing::Level::DEBUG);
    assert_eq!(rebuilt.field("count"), Some("4"));
    assert_eq!(rebuilt.field("version"), Some("1"));
}

#[test]
fn empty_rebuild_is_logged_not_applied() {
    let mut model = MarkerModel::new(SummaryRules::default());
    model.rebuild(&turns(2));
    let (_, events) = capture(|| model.rebuild(&[]));

    assert_eq!(model.len(), 2);
    let empty = events
        .iter()
        .find(|e| e.field("message") == Some("turn list transiently empty"))
        .expect("transient empty event");
    assert_eq!(empty.target, "turnline.model");
    assert_eq!(empty.field("shown"), Some("2"));
}

#[test]
fn all_events_use_turnline_targets() {
    let chain = DiscoveryChain::new()
        .with(FnSource::new("none", || None))
        .with(FnSource::new("fixed", || Some(turns(3))));
    let mut model = MarkerModel::new(SummaryRules::default());

    let (_, events) = capture(|| {
        if let Some(found) = chain.first_match() {
            model.rebuild(&found.turns);
        }
        model.clear();
    });

    assert!(!events.is_empty());
    for event in &events {
        assert!(
            event.target.starts_with("turnline."),
            "unexpected target {}",
            event.target
        );
    }
}
