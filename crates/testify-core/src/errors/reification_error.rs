//! Reification errors.

use super::error_code::TestifyErrorCode;
use super::{AnalysisError, MockError};

/// Errors that can occur while constructing the SUT or wiring collaborators.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReificationError {
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Mock error: {0}")]
    Mock(#[from] MockError),
}

impl TestifyErrorCode for ReificationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Analysis(e) => e.error_code(),
            Self::Mock(e) => e.error_code(),
        }
    }
}
