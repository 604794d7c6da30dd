//! Error types for pipeline orchestration.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// The three external stages a run sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// NeRF fitting via the trainer launcher.
    Nerf,
    /// Pose estimation over rendered views.
    Openpose,
    /// Body parameter fitting.
    Smplify,
}

impl StageKind {
    /// Lowercase stage name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nerf => "nerf",
            Self::Openpose => "openpose",
            Self::Smplify => "smplify",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while driving the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An external stage exited unsuccessfully.
    #[error("{stage} stage failed")]
    Stage {
        /// Stage that failed.
        stage: StageKind,
        /// The underlying command failure.
        #[source]
        source: xshell::Error,
    },

    /// A stage exited successfully but its expected output is absent.
    #[error("{stage} stage produced no output at {path}")]
    MissingOutput {
        /// Stage that should have produced the file.
        stage: StageKind,
        /// Expected output path.
        path: PathBuf,
    },

    /// A data-farm destination exists but is not a symlink.
    #[error("refusing to replace non-symlink {path}")]
    NotASymlink {
        /// The offending path.
        path: PathBuf,
    },

    /// A required external tool is missing.
    #[error("required tool missing: {name} at {path} ({hint})")]
    ToolMissing {
        /// Tool name.
        name: String,
        /// Path that was probed.
        path: PathBuf,
        /// How to provide the tool.
        hint: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
