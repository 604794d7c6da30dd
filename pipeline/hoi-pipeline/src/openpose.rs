//! Pose-estimation stage.
//!
//! Runs the OpenPose binary over an experiment's rendered test views,
//! writing one keypoint JSON per view. The stage is idempotent: when the
//! final view's keypoint file already exists the binary is not launched.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use tracing::info;
use xshell::{cmd, Shell};

use crate::error::{PipelineError, PipelineResult, StageKind};
use crate::layout::TEST_VIEW_COUNT;

/// One OpenPose invocation: keypoints for every rendered view.
#[derive(Debug, Clone)]
pub struct OpenposeStage {
    /// OpenPose checkout; the binary lives under its `build/` tree.
    pub openpose_dir: PathBuf,
    /// Directory of rendered color views.
    pub rgb_dir: PathBuf,
    /// Directory receiving `<view>_keypoints.json` files.
    pub keypoints_dir: PathBuf,
}

impl OpenposeStage {
    /// Keypoint file of the last view, whose existence marks the stage
    /// complete.
    #[must_use]
    pub fn marker(&self) -> PathBuf {
        self.keypoints_dir
            .join(format!("{:02}_keypoints.json", TEST_VIEW_COUNT - 1))
    }

    /// Whether the stage already ran to completion.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.marker().is_file()
    }

    /// Path of the OpenPose binary.
    #[must_use]
    pub fn binary(&self) -> PathBuf {
        self.openpose_dir
            .join("build")
            .join("examples")
            .join("openpose")
            .join("openpose.bin")
    }

    /// `LD_LIBRARY_PATH` the binary needs: its own build trees first, then
    /// whatever the environment already had.
    #[must_use]
    pub fn library_path(&self, existing: Option<&OsStr>) -> OsString {
        let build = self.openpose_dir.join("build");
        let mut value = build.join("src").join("openpose").into_os_string();
        value.push(":");
        value.push(build.join("caffe").join("lib64"));
        if let Some(existing) = existing.filter(|path| !path.is_empty()) {
            value.push(":");
            value.push(existing);
        }
        value
    }

    /// Run the binary over the rendered views unless its output already
    /// exists.
    ///
    /// # Errors
    ///
    /// Fails when the binary exits unsuccessfully or cannot be spawned.
    pub fn run(&self, sh: &Shell) -> PipelineResult<()> {
        if self.is_complete() {
            info!(
                "keypoints exist in {}, skipping pose estimation",
                self.keypoints_dir.display()
            );
            return Ok(());
        }

        info!("estimating poses for {}", self.rgb_dir.display());
        let binary = self.binary();
        let rgb_dir = &self.rgb_dir;
        let keypoints_dir = &self.keypoints_dir;
        let library_path = self.library_path(env::var_os("LD_LIBRARY_PATH").as_deref());

        let _dir = sh.push_dir(&self.openpose_dir);
        cmd!(
            sh,
            "{binary} --image_dir {rgb_dir} --write_json {keypoints_dir} --display 0 --render_pose 0 --hand --face"
        )
        .env("LD_LIBRARY_PATH", &library_path)
        .run()
        .map_err(|source| PipelineError::Stage {
            stage: StageKind::Openpose,
            source,
        })?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn stage(root: &std::path::Path) -> OpenposeStage {
        OpenposeStage {
            openpose_dir: root.join("openpose"),
            rgb_dir: root.join("rgb"),
            keypoints_dir: root.join("keypoints"),
        }
    }

    #[test]
    fn marker_is_the_last_view() {
        let stage = stage(std::path::Path::new("/w"));
        assert_eq!(
            stage.marker(),
            PathBuf::from("/w/keypoints/99_keypoints.json")
        );
    }

    #[test]
    fn binary_lives_under_the_build_tree() {
        let stage = stage(std::path::Path::new("/w"));
        assert_eq!(
            stage.binary(),
            PathBuf::from("/w/openpose/build/examples/openpose/openpose.bin")
        );
    }

    #[test]
    fn completion_follows_the_marker_file() {
        let dir = tempfile::tempdir().unwrap();
        let stage = stage(dir.path());
        assert!(!stage.is_complete());

        fs::create_dir_all(&stage.keypoints_dir).unwrap();
        fs::write(stage.marker(), b"{}").unwrap();
        assert!(stage.is_complete());
    }

    #[test]
    fn library_path_puts_build_trees_first() {
        let stage = stage(std::path::Path::new("/w"));
        let value = stage.library_path(Some(OsStr::new("/usr/lib")));
        assert_eq!(
            value,
            OsString::from("/w/openpose/build/src/openpose:/w/openpose/build/caffe/lib64:/usr/lib")
        );
    }

    #[test]
    fn empty_environment_adds_no_trailing_separator() {
        let stage = stage(std::path::Path::new("/w"));
        for existing in [None, Some(OsStr::new(""))] {
            let value = stage.library_path(existing);
            assert_eq!(
                value,
                OsString::from("/w/openpose/build/src/openpose:/w/openpose/build/caffe/lib64")
            );
        }
    }
}
