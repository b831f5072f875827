//! EventDispatcher: synchronous event dispatch with zero overhead when empty.

use std::sync::Arc;

use super::handler::TestifyEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
///
/// When no handlers are registered, `emit` iterates over an empty Vec.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn TestifyEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn TestifyEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler is logged and does not stop the remaining handlers.
    fn emit<F: Fn(&dyn TestifyEventHandler)>(&self, name: &'static str, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!(event = name, "event handler panicked");
            }
        }
    }

    // ---- Analysis ----
    pub fn emit_test_class_analyzed(&self, event: &TestClassAnalyzedEvent) {
        self.emit("test_class_analyzed", |h| h.on_test_class_analyzed(event));
    }

    pub fn emit_sut_analyzed(&self, event: &SutAnalyzedEvent) {
        self.emit("sut_analyzed", |h| h.on_sut_analyzed(event));
    }

    pub fn emit_analysis_failed(&self, event: &AnalysisFailedEvent) {
        self.emit("analysis_failed", |h| h.on_analysis_failed(event));
    }

    // ---- Reification ----
    pub fn emit_field_reified(&self, event: &FieldReifiedEvent) {
        self.emit("field_reified", |h| h.on_field_reified(event));
    }

    pub fn emit_reification_completed(&self, event: &ReificationCompletedEvent) {
        self.emit("reification_completed", |h| h.on_reification_completed(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
