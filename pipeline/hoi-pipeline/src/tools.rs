//! Preflight checks for the external tools.
//!
//! A full run spends its first GPU-hours in the trainer, so discovering a
//! missing binary three stages in wastes them. [`preflight`] probes every
//! external dependency up front; [`ensure_ready`] turns the first failure
//! into a hard error.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::layout::Workspace;

/// Result of probing one external tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    /// Tool name shown to the user.
    pub name: &'static str,
    /// Path that was probed.
    pub path: PathBuf,
    /// Whether the tool was found.
    pub found: bool,
    /// How to provide the tool when missing.
    pub hint: &'static str,
}

/// Probe every external tool a run needs.
///
/// `openpose_dir` is optional so a workspace can be checked before
/// OpenPose is built.
#[must_use]
pub fn preflight(ws: &Workspace, openpose_dir: Option<&Path>) -> Vec<ToolStatus> {
    let mut statuses = Vec::new();

    // A bare interpreter name resolves through PATH, anything with a
    // directory component must exist as given.
    let python = ws.python().to_path_buf();
    let found = if python.components().count() > 1 {
        python.is_file()
    } else {
        which::which(&python).is_ok()
    };
    statuses.push(ToolStatus {
        name: "python",
        path: python,
        found,
        hint: "interpreter with the trainer and fitting environments installed",
    });

    let launcher = ws.launcher();
    statuses.push(ToolStatus {
        name: "threestudio launcher",
        found: launcher.is_file(),
        path: launcher,
        hint: "clone the trainer under src/MVDream-threestudio",
    });

    let fitter = ws.smplify_dir().join("main.py");
    statuses.push(ToolStatus {
        name: "smplify entry point",
        found: fitter.is_file(),
        path: fitter,
        hint: "clone the fitting tool under src/MultiviewSMPLifyX",
    });

    if let Some(dir) = openpose_dir {
        let binary = dir
            .join("build")
            .join("examples")
            .join("openpose")
            .join("openpose.bin");
        statuses.push(ToolStatus {
            name: "openpose binary",
            found: binary.is_file(),
            path: binary,
            hint: "build OpenPose with JSON output enabled",
        });
    }

    statuses
}

/// Fail on the first missing tool.
///
/// # Errors
///
/// Returns [`PipelineError::ToolMissing`] naming the first absent tool.
pub fn ensure_ready(ws: &Workspace, openpose_dir: Option<&Path>) -> PipelineResult<()> {
    for status in preflight(ws, openpose_dir) {
        if !status.found {
            return Err(PipelineError::ToolMissing {
                name: status.name.to_string(),
                path: status.path,
                hint: status.hint.to_string(),
            });
        }
    }
    Ok(())
}
