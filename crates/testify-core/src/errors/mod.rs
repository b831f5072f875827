//! Error handling for Testify.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod analysis_error;
pub mod class_file_error;
pub mod config_error;
pub mod error_code;
pub mod mock_error;
pub mod reification_error;

pub use analysis_error::AnalysisError;
pub use class_file_error::ClassFileError;
pub use config_error::ConfigError;
pub use error_code::TestifyErrorCode;
pub use mock_error::MockError;
pub use reification_error::ReificationError;
