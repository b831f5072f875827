//! Analysis and invocation errors.
//!
//! This is the single framework error kind for configuration problems found
//! while analysing test and SUT classes, and for failures when reading,
//! writing, or invoking members through a descriptor.

use super::error_code::{self, TestifyErrorCode};
use super::ClassFileError;

/// Errors that can occur during class analysis or descriptor member access.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error(
        "Test class {test_class} declares more than one SUT field ({}); exactly one is required",
        .fields.join(", ")
    )]
    MultipleSutFields { test_class: String, fields: Vec<String> },

    #[error("Test class {test_class} does not declare a SUT field")]
    MissingSutField { test_class: String },

    #[error("Class {class} referenced by {referenced_by} not found on the class path")]
    ClassNotFound { class: String, referenced_by: String },

    #[error("Field {field} not found in {class}")]
    FieldNotFound { field: String, class: String },

    #[error("Method {method} not found in {class}")]
    MethodNotFound { method: String, class: String },

    #[error("Constructor {descriptor} not found in {class}")]
    ConstructorNotFound { class: String, descriptor: String },

    #[error("Malformed class file for {class}: {source}")]
    ClassFile {
        class: String,
        #[source]
        source: ClassFileError,
    },

    #[error("Invalid annotation {annotation} on {class}: {message}")]
    InvalidAnnotation {
        annotation: String,
        class: String,
        message: String,
    },

    #[error("Cannot access {member} declared by {declaring_class} on an instance of {actual_class}")]
    IncompatibleInstance {
        member: String,
        declaring_class: String,
        actual_class: String,
    },

    #[error("Cannot store {actual} into field {field} of type {expected} declared by {declaring_class}")]
    IncompatibleValue {
        field: String,
        declaring_class: String,
        expected: String,
        actual: String,
    },

    #[error("Argument mismatch invoking {method} of {declaring_class}: expected ({expected}), got ({actual})")]
    ArgumentMismatch {
        method: String,
        declaring_class: String,
        expected: String,
        actual: String,
    },

    #[error("No implementation bound for {method} of {declaring_class}")]
    MethodNotBound { method: String, declaring_class: String },

    #[error("Invocation of {method} of {declaring_class} failed: {message}")]
    InvocationFailed {
        method: String,
        declaring_class: String,
        message: String,
    },
}

impl TestifyErrorCode for AnalysisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ClassNotFound { .. } => error_code::CLASS_NOT_FOUND,
            Self::FieldNotFound { .. }
            | Self::MethodNotFound { .. }
            | Self::ConstructorNotFound { .. } => error_code::MEMBER_NOT_FOUND,
            Self::ClassFile { source, .. } => source.error_code(),
            Self::MultipleSutFields { .. }
            | Self::MissingSutField { .. }
            | Self::InvalidAnnotation { .. } => error_code::CONFIGURATION_ERROR,
            Self::IncompatibleInstance { .. }
            | Self::IncompatibleValue { .. }
            | Self::ArgumentMismatch { .. }
            | Self::MethodNotBound { .. }
            | Self::InvocationFailed { .. } => error_code::INVOCATION_ERROR,
        }
    }
}
