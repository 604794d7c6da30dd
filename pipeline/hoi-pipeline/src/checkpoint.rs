//! Trainer checkpoint probing and repair.
//!
//! The trainer keeps `ckpts/last.ckpt` pointing at the newest checkpoint.
//! On startup it creates the link pointing at itself, so until the first
//! checkpoint lands the link dangles. A dangling link therefore marks an
//! experiment directory that was initialized but never trained; resuming
//! from it crashes the trainer, so the directory is removed and the run
//! starts fresh.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::layout::{Experiment, Workspace};

/// Outcome of probing an experiment for a resumable checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointState {
    /// Training can resume from this checkpoint.
    Resume(PathBuf),
    /// No usable checkpoint; start from the base config.
    Fresh,
}

/// Probe an experiment for a resumable checkpoint, removing its directory
/// when the checkpoint link dangles.
///
/// # Errors
///
/// Returns an I/O error when a corrupt experiment directory cannot be
/// removed.
pub fn probe_checkpoint(ws: &Workspace, experiment: &Experiment) -> io::Result<CheckpointState> {
    let last_ckpt = experiment.last_ckpt(ws);

    if is_dangling_link(&last_ckpt) {
        let dir = experiment.dir(ws);
        warn!(
            "removing {}: checkpoint link dangles, training never produced a checkpoint",
            dir.display()
        );
        fs::remove_dir_all(&dir)?;
        return Ok(CheckpointState::Fresh);
    }

    if last_ckpt.exists() {
        Ok(CheckpointState::Resume(last_ckpt))
    } else {
        debug!("no checkpoint at {}", last_ckpt.display());
        Ok(CheckpointState::Fresh)
    }
}

/// True when `path` is a symlink whose target does not exist.
fn is_dangling_link(path: &Path) -> bool {
    let is_link = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    is_link && !path.exists()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::NerfPhase;

    fn setup() -> (tempfile::TempDir, Workspace, Experiment) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path(), "python");
        let exp = Experiment::new(NerfPhase::Init, "probe_0");
        (dir, ws, exp)
    }

    #[test]
    fn missing_experiment_is_fresh() {
        let (_dir, ws, exp) = setup();
        assert_eq!(probe_checkpoint(&ws, &exp).unwrap(), CheckpointState::Fresh);
    }

    #[test]
    fn existing_checkpoint_resumes() {
        let (_dir, ws, exp) = setup();
        let ckpt = exp.last_ckpt(&ws);
        fs::create_dir_all(ckpt.parent().unwrap()).unwrap();
        fs::write(&ckpt, b"weights").unwrap();

        assert_eq!(
            probe_checkpoint(&ws, &exp).unwrap(),
            CheckpointState::Resume(ckpt)
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_removes_the_experiment() {
        let (_dir, ws, exp) = setup();
        let ckpt = exp.last_ckpt(&ws);
        fs::create_dir_all(ckpt.parent().unwrap()).unwrap();
        // The trainer initializes the link pointing at itself.
        std::os::unix::fs::symlink(&ckpt, &ckpt).unwrap();

        assert_eq!(probe_checkpoint(&ws, &exp).unwrap(), CheckpointState::Fresh);
        assert!(!exp.dir(&ws).exists());
    }

    #[cfg(unix)]
    #[test]
    fn link_to_real_checkpoint_resumes() {
        let (_dir, ws, exp) = setup();
        let ckpt = exp.last_ckpt(&ws);
        fs::create_dir_all(ckpt.parent().unwrap()).unwrap();
        let target = exp.dir(&ws).join("ckpts").join("epoch=0-step=1000.ckpt");
        fs::write(&target, b"weights").unwrap();
        std::os::unix::fs::symlink(&target, &ckpt).unwrap();

        assert_eq!(
            probe_checkpoint(&ws, &exp).unwrap(),
            CheckpointState::Resume(ckpt)
        );
    }
}
