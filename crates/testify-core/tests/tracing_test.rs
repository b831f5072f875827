//! Tests for tracing initialization.

use testify_core::tracing::init_tracing;

/// T0-TRC-01: init_tracing is idempotent
#[test]
fn test_init_tracing_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!(target: "testify", "tracing initialized twice without panicking");
}

/// T0-TRC-02: an invalid filter falls back to the default
#[test]
fn test_invalid_filter_falls_back() {
    std::env::set_var("TESTIFY_LOG", "=[not a filter");
    init_tracing();
    tracing::debug!(target: "testify", "still able to log");
    std::env::remove_var("TESTIFY_LOG");
}
