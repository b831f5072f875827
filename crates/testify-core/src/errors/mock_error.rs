//! Mock provider errors.

use super::error_code::{self, TestifyErrorCode};

/// Errors reported by a mock provider while synthesizing collaborators.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MockError {
    #[error("Type {type_name} cannot be mocked: {reason}")]
    Unmockable { type_name: String, reason: String },

    #[error("Invalid delegate for virtual {type_name}: {message}")]
    InvalidDelegate { type_name: String, message: String },

    #[error("Mock provider failure: {0}")]
    Provider(String),
}

impl TestifyErrorCode for MockError {
    fn error_code(&self) -> &'static str {
        error_code::MOCK_ERROR
    }
}
