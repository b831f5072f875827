//! Class-file decoding errors.

use super::error_code::{self, TestifyErrorCode};

/// Errors raised while decoding class-file bytes, descriptors, or signatures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassFileError {
    #[error("Bad magic number 0x{magic:08X}, not a class file")]
    BadMagic { magic: u32 },

    #[error("Unexpected end of class file at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("Invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },

    #[error("Constant pool entry {index} is not a {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },

    #[error("Unknown constant pool tag {tag} at offset {offset}")]
    UnknownConstantTag { tag: u8, offset: usize },

    #[error("Invalid modified UTF-8 in constant pool entry {index}")]
    InvalidUtf8 { index: u16 },

    #[error("Invalid descriptor '{descriptor}': {message}")]
    InvalidDescriptor { descriptor: String, message: String },

    #[error("Invalid signature '{signature}': {message}")]
    InvalidSignature { signature: String, message: String },

    #[error("Unknown annotation element tag '{tag}'")]
    UnknownElementTag { tag: char },
}

impl TestifyErrorCode for ClassFileError {
    fn error_code(&self) -> &'static str {
        error_code::CLASS_FILE_ERROR
    }
}
