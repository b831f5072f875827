//! Event payload types for analysis and reification.

/// Payload for `on_test_class_analyzed`.
#[derive(Debug, Clone)]
pub struct TestClassAnalyzedEvent {
    pub test_class: String,
    pub field_count: usize,
    pub sut_field: Option<String>,
    pub duration_us: u64,
}

/// Payload for `on_sut_analyzed`.
#[derive(Debug, Clone)]
pub struct SutAnalyzedEvent {
    pub test_class: String,
    pub sut_class: String,
    pub parameter_count: Option<usize>,
    pub field_count: usize,
}

/// Payload for `on_analysis_failed`.
#[derive(Debug, Clone)]
pub struct AnalysisFailedEvent {
    pub class: String,
    pub error_code: &'static str,
    pub message: String,
}

/// Payload for `on_field_reified`.
#[derive(Debug, Clone)]
pub struct FieldReifiedEvent {
    pub test_class: String,
    pub field: String,
    /// Short action label, e.g. `fake`, `virtual`, `reused`, `propagated`.
    pub action: &'static str,
}

/// Payload for `on_reification_completed`.
#[derive(Debug, Clone)]
pub struct ReificationCompletedEvent {
    pub test_class: String,
    pub injected: usize,
    pub unchanged: usize,
    pub unmatched: usize,
}
