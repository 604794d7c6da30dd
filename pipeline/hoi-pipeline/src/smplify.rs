//! Body-fitting stage.
//!
//! Predicting a body from an experiment takes three steps: pose estimation
//! over its rendered views, a data farm of symlinks shaped the way the
//! fitting tool expects, then the multi-view fitting run itself. Pose
//! estimation and fitting both skip when their outputs already exist, so a
//! crashed run resumes by re-running it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use xshell::{cmd, Shell};

use crate::error::{PipelineError, PipelineResult, StageKind};
use crate::keypoints::audit_keypoint_dir;
use crate::layout::{Experiment, RenderKind, Workspace, DEFAULT_VIEW, TEST_VIEW_COUNT};
use crate::openpose::OpenposeStage;
use crate::symlink::force_symlink;

/// SMPL-family body model variant to fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmplVariant {
    /// Body only.
    Smpl,
    /// Body plus articulated hands.
    #[default]
    Smplh,
    /// Body, hands, and face.
    Smplx,
}

impl SmplVariant {
    /// Lowercase name used in config file names and output paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Smpl => "smpl",
            Self::Smplh => "smplh",
            Self::Smplx => "smplx",
        }
    }

    /// Fitting config for this variant, relative to the tool checkout.
    #[must_use]
    pub fn config_file(self) -> String {
        format!("cfg_files/fit_{}.yaml", self.as_str())
    }
}

/// Fitted body artifacts produced by one fitting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitOutputs {
    /// Fitted body mesh.
    pub mesh: PathBuf,
    /// Fitted body model parameters.
    pub params: PathBuf,
}

/// Body prediction over one experiment's rendered views.
#[derive(Debug, Clone)]
pub struct SmplifyStage {
    /// Body model variant to fit.
    pub variant: SmplVariant,
    /// Texture image to bake into the fitted mesh.
    pub texture: Option<PathBuf>,
    /// Fixed shape parameters instead of predicted ones.
    pub shape: Option<PathBuf>,
    /// OpenPose checkout used for pose estimation.
    pub openpose_dir: PathBuf,
    /// Which rendered view set to predict from.
    pub view: String,
}

impl SmplifyStage {
    /// Stage fitting `variant` from the default view set.
    pub fn new(variant: SmplVariant, openpose_dir: impl Into<PathBuf>) -> Self {
        Self {
            variant,
            texture: None,
            shape: None,
            openpose_dir: openpose_dir.into(),
            view: DEFAULT_VIEW.to_string(),
        }
    }

    /// Fitted outputs this stage produces for `experiment`.
    #[must_use]
    pub fn outputs(&self, ws: &Workspace, experiment: &Experiment) -> FitOutputs {
        let out_dir = experiment.fit_data_dir(ws).join(self.variant.as_str());
        FitOutputs {
            mesh: out_dir.join("smpl_mesh.obj"),
            params: out_dir.join("smpl_param.pkl"),
        }
    }

    /// Fitting tool arguments, relative to the tool checkout.
    #[must_use]
    pub fn fit_args(&self, data_dir: &Path, out_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "main.py".to_string(),
            "--config".to_string(),
            self.variant.config_file(),
            "--data_folder".to_string(),
            data_dir.display().to_string(),
            "--output_folder".to_string(),
            out_dir.display().to_string(),
        ];
        if let Some(shape) = &self.shape {
            args.push("--mesh_betas_fn".to_string());
            args.push(shape.display().to_string());
        }
        if let Some(texture) = &self.texture {
            args.push("--mesh_texture_fn".to_string());
            args.push(texture.display().to_string());
        }
        args
    }

    /// Predict body parameters from an experiment's rendered views.
    ///
    /// # Errors
    ///
    /// Fails when pose estimation or fitting exits unsuccessfully, when a
    /// data-farm destination is not a symlink, or when fitting completes
    /// without producing its mesh.
    pub fn predict(
        &self,
        sh: &Shell,
        ws: &Workspace,
        experiment: &Experiment,
    ) -> PipelineResult<FitOutputs> {
        let rgb_dir = experiment.render_dir(ws, RenderKind::Rgb, &self.view);
        let keypoints_dir = experiment.render_dir(ws, RenderKind::Keypoints, &self.view);
        let metadata_dir = experiment.render_dir(ws, RenderKind::Metadata, &self.view);

        let pose = OpenposeStage {
            openpose_dir: self.openpose_dir.clone(),
            rgb_dir: rgb_dir.clone(),
            keypoints_dir: keypoints_dir.clone(),
        };
        pose.run(sh)?;

        let audit = audit_keypoint_dir(&keypoints_dir, TEST_VIEW_COUNT);
        if !audit.is_complete() {
            warn!(
                "keypoint coverage incomplete for {}: {} empty, {} missing, {} malformed of {} views",
                experiment.name(),
                audit.empty_views,
                audit.missing_views,
                audit.malformed_views,
                TEST_VIEW_COUNT
            );
        }

        let data_dir = experiment.fit_data_dir(ws);
        let out_dir = data_dir.join(self.variant.as_str());
        fs::create_dir_all(&data_dir)?;
        force_symlink(&rgb_dir, &data_dir.join("color"))?;
        force_symlink(&keypoints_dir, &data_dir.join("keypoints"))?;
        force_symlink(&metadata_dir, &data_dir.join("meta"))?;

        let outputs = self.outputs(ws, experiment);
        if outputs.mesh.is_file() {
            info!(
                "fitted mesh exists at {}, skipping body fitting",
                outputs.mesh.display()
            );
            return Ok(outputs);
        }

        info!("fitting {} body for {}", self.variant.as_str(), experiment.name());
        let python = ws.python().to_path_buf();
        let fit_args = self.fit_args(&data_dir, &out_dir);

        let _dir = sh.push_dir(ws.smplify_dir());
        cmd!(sh, "{python} {fit_args...}")
            .run()
            .map_err(|source| PipelineError::Stage {
                stage: StageKind::Smplify,
                source,
            })?;

        if !outputs.mesh.is_file() {
            return Err(PipelineError::MissingOutput {
                stage: StageKind::Smplify,
                path: outputs.mesh,
            });
        }

        Ok(outputs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::NerfPhase;

    #[test]
    fn variant_names_match_their_configs() {
        assert_eq!(SmplVariant::Smpl.config_file(), "cfg_files/fit_smpl.yaml");
        assert_eq!(SmplVariant::Smplh.config_file(), "cfg_files/fit_smplh.yaml");
        assert_eq!(SmplVariant::Smplx.config_file(), "cfg_files/fit_smplx.yaml");
    }

    #[test]
    fn outputs_nest_under_the_variant_dir() {
        let ws = Workspace::new("/w", "python");
        let exp = Experiment::new(NerfPhase::Init, "t_0");
        let stage = SmplifyStage::new(SmplVariant::Smplh, "/w/openpose");
        let outputs = stage.outputs(&ws, &exp);
        assert_eq!(
            outputs.mesh,
            PathBuf::from("/w/smplify/mvdream-with-deepfloyd-with-mesh/t_0/smplh/smpl_mesh.obj")
        );
        assert_eq!(
            outputs.params,
            PathBuf::from("/w/smplify/mvdream-with-deepfloyd-with-mesh/t_0/smplh/smpl_param.pkl")
        );
    }

    #[test]
    fn fit_args_name_folders_and_config() {
        let stage = SmplifyStage::new(SmplVariant::Smpl, "/w/openpose");
        let args = stage.fit_args(Path::new("/w/smplify/s/t_0"), Path::new("/w/smplify/s/t_0/smpl"));
        assert_eq!(
            args,
            vec![
                "main.py".to_string(),
                "--config".to_string(),
                "cfg_files/fit_smpl.yaml".to_string(),
                "--data_folder".to_string(),
                "/w/smplify/s/t_0".to_string(),
                "--output_folder".to_string(),
                "/w/smplify/s/t_0/smpl".to_string(),
            ]
        );
    }

    #[test]
    fn shape_precedes_texture_in_fit_args() {
        let mut stage = SmplifyStage::new(SmplVariant::Smplh, "/w/openpose");
        stage.shape = Some(PathBuf::from("/assets/betas.npy"));
        stage.texture = Some(PathBuf::from("/assets/texture.png"));
        let args = stage.fit_args(Path::new("/d"), Path::new("/o"));
        let tail = &args[args.len() - 4..];
        assert_eq!(
            tail,
            [
                "--mesh_betas_fn".to_string(),
                "/assets/betas.npy".to_string(),
                "--mesh_texture_fn".to_string(),
                "/assets/texture.png".to_string(),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn predict_skips_tools_when_outputs_exist() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path(), "python-that-does-not-exist");
        let exp = Experiment::new(NerfPhase::Init, "t_0");
        let stage = SmplifyStage::new(SmplVariant::Smplh, dir.path().join("openpose"));

        // Rendered views and a complete set of stage outputs.
        for kind in [RenderKind::Rgb, RenderKind::Keypoints, RenderKind::Metadata] {
            fs::create_dir_all(exp.render_dir(&ws, kind, DEFAULT_VIEW)).unwrap();
        }
        let keypoints_dir = exp.render_dir(&ws, RenderKind::Keypoints, DEFAULT_VIEW);
        fs::write(keypoints_dir.join("99_keypoints.json"), b"{}").unwrap();
        let outputs = stage.outputs(&ws, &exp);
        fs::create_dir_all(outputs.mesh.parent().unwrap()).unwrap();
        fs::write(&outputs.mesh, b"obj").unwrap();

        let sh = Shell::new().unwrap();
        let result = stage.predict(&sh, &ws, &exp).unwrap();
        assert_eq!(result, outputs);

        // The data farm was still wired up.
        let data_dir = exp.fit_data_dir(&ws);
        assert_eq!(
            fs::read_link(data_dir.join("color")).unwrap(),
            exp.render_dir(&ws, RenderKind::Rgb, DEFAULT_VIEW)
        );
        assert_eq!(
            fs::read_link(data_dir.join("keypoints")).unwrap(),
            keypoints_dir
        );
        assert_eq!(
            fs::read_link(data_dir.join("meta")).unwrap(),
            exp.render_dir(&ws, RenderKind::Metadata, DEFAULT_VIEW)
        );
    }
}
