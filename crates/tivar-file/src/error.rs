//! Error types for var file operations.
//!
//! Only a small closed set of conditions is fatal; everything else the
//! format can be lenient about is reported through [`crate::Diagnostics`]
//! instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a var file operation.
#[derive(Debug, Error)]
pub enum VarError {
    /// The input ended before a declared field was complete.
    #[error("input truncated: needed {needed} more bytes at offset {offset}")]
    TruncatedInput { offset: usize, needed: usize },

    /// Structurally inconsistent caller input (e.g. ragged matrix rows).
    #[error("structural mismatch: {message}")]
    StructuralMismatch { message: String },

    /// The operation is not supported by this entry (e.g. archiving a
    /// flashless entry).
    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    /// The entry kind does not define the requested representation.
    #[error("{kind} entries do not support a {representation} representation")]
    NotImplemented {
        kind: &'static str,
        representation: &'static str,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for var file operations.
pub type Result<T> = std::result::Result<T, VarError>;

impl VarError {
    /// Create a TruncatedInput error.
    pub fn truncated(offset: usize, needed: usize) -> Self {
        Self::TruncatedInput { offset, needed }
    }

    /// Create a StructuralMismatch error.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            message: message.into(),
        }
    }

    /// Create an UnsupportedOperation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Create a NotImplemented error.
    pub fn not_implemented(kind: &'static str, representation: &'static str) -> Self {
        Self::NotImplemented {
            kind,
            representation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VarError::truncated(12, 4);
        assert_eq!(
            format!("{err}"),
            "input truncated: needed 4 more bytes at offset 12"
        );

        let err = VarError::structural("matrix has uneven rows");
        assert_eq!(
            format!("{err}"),
            "structural mismatch: matrix has uneven rows"
        );

        let err = VarError::not_implemented("group", "string");
        assert_eq!(
            format!("{err}"),
            "group entries do not support a string representation"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let var_err: VarError = io_err.into();
        assert!(matches!(var_err, VarError::Io(_)));
    }
}
