//! TestifyErrorCode trait for structured error reporting.

/// Trait implemented by every Testify error enum.
///
/// Test runners surface the code next to the message so failures can be
/// grouped without string matching on messages.
pub trait TestifyErrorCode {
    /// Returns the error code string (e.g., "CLASS_NOT_FOUND").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const CLASS_FILE_ERROR: &str = "CLASS_FILE_ERROR";
pub const CLASS_NOT_FOUND: &str = "CLASS_NOT_FOUND";
pub const MEMBER_NOT_FOUND: &str = "MEMBER_NOT_FOUND";
pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
pub const INVOCATION_ERROR: &str = "INVOCATION_ERROR";
pub const MOCK_ERROR: &str = "MOCK_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
