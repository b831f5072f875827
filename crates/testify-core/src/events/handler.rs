//! TestifyEventHandler trait with no-op defaults.

use super::types::*;

/// Trait for handling Testify events.
///
/// All methods have no-op default implementations, so handlers only need
/// to override the events they care about. The trait requires `Send + Sync`
/// because analysis runs on whichever test thread asks first.
pub trait TestifyEventHandler: Send + Sync {
    // ---- Analysis ----
    fn on_test_class_analyzed(&self, _event: &TestClassAnalyzedEvent) {}
    fn on_sut_analyzed(&self, _event: &SutAnalyzedEvent) {}
    fn on_analysis_failed(&self, _event: &AnalysisFailedEvent) {}

    // ---- Reification ----
    fn on_field_reified(&self, _event: &FieldReifiedEvent) {}
    fn on_reification_completed(&self, _event: &ReificationCompletedEvent) {}
}
