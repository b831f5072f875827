//! Tests for the Testify event system.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use testify_core::events::types::*;
use testify_core::events::{EventDispatcher, TestifyEventHandler};

/// A test handler that counts events.
#[derive(Default)]
struct CountingHandler {
    analyzed: AtomicUsize,
    failed: AtomicUsize,
    reified: AtomicUsize,
    completed: AtomicUsize,
}

impl TestifyEventHandler for CountingHandler {
    fn on_test_class_analyzed(&self, _event: &TestClassAnalyzedEvent) {
        self.analyzed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_analysis_failed(&self, _event: &AnalysisFailedEvent) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_field_reified(&self, _event: &FieldReifiedEvent) {
        self.reified.fetch_add(1, Ordering::Relaxed);
    }

    fn on_reification_completed(&self, _event: &ReificationCompletedEvent) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

struct PanickingHandler;

impl TestifyEventHandler for PanickingHandler {
    fn on_field_reified(&self, _event: &FieldReifiedEvent) {
        panic!("handler failure");
    }
}

fn analyzed_event() -> TestClassAnalyzedEvent {
    TestClassAnalyzedEvent {
        test_class: "com.acme.ServiceTest".into(),
        field_count: 2,
        sut_field: Some("sut".into()),
        duration_us: 10,
    }
}

/// T0-EVT-01: a handler with no overrides compiles and ignores everything
#[test]
fn test_handler_noop_defaults() {
    struct NoopHandler;
    impl TestifyEventHandler for NoopHandler {}

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(NoopHandler));
    dispatcher.emit_test_class_analyzed(&analyzed_event());
    dispatcher.emit_sut_analyzed(&SutAnalyzedEvent {
        test_class: "com.acme.ServiceTest".into(),
        sut_class: "com.acme.Service".into(),
        parameter_count: Some(1),
        field_count: 1,
    });
    assert_eq!(dispatcher.handler_count(), 1);
}

/// T0-EVT-02: every registered handler receives each event
#[test]
fn test_dispatch_to_multiple_handlers() {
    let first = Arc::new(CountingHandler::default());
    let second = Arc::new(CountingHandler::default());

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(first.clone());
    dispatcher.register(second.clone());

    dispatcher.emit_test_class_analyzed(&analyzed_event());
    dispatcher.emit_analysis_failed(&AnalysisFailedEvent {
        class: "com.acme.Broken".into(),
        error_code: "CLASS_FILE_ERROR",
        message: "bad magic".into(),
    });

    for handler in [&first, &second] {
        assert_eq!(handler.analyzed.load(Ordering::Relaxed), 1);
        assert_eq!(handler.failed.load(Ordering::Relaxed), 1);
    }
}

/// T0-EVT-03: a panicking handler does not stop later handlers
#[test]
fn test_panicking_handler_isolated() {
    let counter = Arc::new(CountingHandler::default());

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(PanickingHandler));
    dispatcher.register(counter.clone());

    dispatcher.emit_field_reified(&FieldReifiedEvent {
        test_class: "com.acme.ServiceTest".into(),
        field: "gateway".into(),
        action: "fake",
    });
    dispatcher.emit_reification_completed(&ReificationCompletedEvent {
        test_class: "com.acme.ServiceTest".into(),
        injected: 1,
        unchanged: 0,
        unmatched: 0,
    });

    assert_eq!(counter.reified.load(Ordering::Relaxed), 1);
    assert_eq!(counter.completed.load(Ordering::Relaxed), 1);
}

/// T0-EVT-04: an empty dispatcher is a no-op
#[test]
fn test_empty_dispatcher() {
    let dispatcher = EventDispatcher::default();
    dispatcher.emit_test_class_analyzed(&analyzed_event());
    assert_eq!(dispatcher.handler_count(), 0);
    assert_eq!(format!("{dispatcher:?}"), "EventDispatcher { handlers: 0 }");
}
