//! Error types for mesh preparation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh preparation operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while loading, placing, or saving meshes.
#[derive(Debug, Error)]
pub enum MeshError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Unknown file format (unrecognized extension).
    #[error("unknown mesh format: .{extension}")]
    UnknownFormat {
        /// The unrecognized extension.
        extension: String,
    },

    /// Invalid file content (parse error).
    #[error("invalid mesh content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// A face referenced a vertex that does not exist.
    #[error("face index {index} out of range for {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// The offending index as written in the file.
        index: i64,
        /// Number of vertices actually present.
        vertex_count: usize,
    },

    /// The mesh cannot be normalized.
    #[error("degenerate mesh: {reason}")]
    DegenerateMesh {
        /// Why normalization is impossible.
        reason: String,
    },

    /// Invalid placement parameter (e.g. a malformed translation string).
    #[error("invalid placement parameter: {message}")]
    InvalidParameter {
        /// Description of the bad parameter.
        message: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Float parsing error.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Integer parsing error.
    #[error("integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

impl MeshError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}
