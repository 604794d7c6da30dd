//! The alternating fit/refit driver.
//!
//! One full run is: fit a composed NeRF from scratch, predict a body from
//! its renders, then repeatedly re-fit the NeRF conditioned on the
//! predicted body and predict again. Iteration `i` trains under tag
//! `<tag>_i`, so every pass keeps its own checkpoints and render sets and
//! an interrupted run resumes mid-sequence.

use std::path::PathBuf;

use tracing::info;
use xshell::Shell;

use crate::error::PipelineResult;
use crate::layout::{Experiment, NerfPhase, Workspace};
use crate::nerf::NerfStage;
use crate::report::{IterationRecord, RunReport};
use crate::smplify::{SmplVariant, SmplifyStage};
use crate::tools::ensure_ready;

/// Everything a full run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Run tag; iteration experiments are tagged `<tag>_0`, `<tag>_1`, ...
    pub tag: String,
    /// Number of re-fit iterations after initialization.
    pub num_iterations: usize,
    /// Prompt describing the composed human+object scene.
    pub prompt: String,
    /// Prompt describing the human alone.
    pub prompt_human: String,
    /// Negative prompt for the composed scene.
    pub negative_prompt: String,
    /// Negative prompt for the human branch.
    pub negative_prompt_human: String,
    /// Object mesh conditioning the composed renderer.
    pub mesh_path: PathBuf,
    /// Object translation in renderer syntax, e.g. `[0,0,0]`.
    pub mesh_translation: String,
    /// Object scale factor.
    pub mesh_scale: f64,
    /// Object rotation about the up axis, degrees.
    pub mesh_rotation_deg: f64,
    /// Object tilt about the x axis, degrees.
    pub mesh_tilt_deg: f64,
    /// Checkpoint cadence in train steps.
    pub checkpoint_interval: u32,
    /// Enable the trainer's wandb logger.
    pub use_wandb: bool,
    /// Body model variant to fit between NeRF passes.
    pub smpl_variant: SmplVariant,
    /// Texture image to bake into fitted meshes.
    pub smpl_texture: Option<PathBuf>,
    /// Fixed body shape parameters instead of predicted ones.
    pub smpl_shape: Option<PathBuf>,
    /// OpenPose checkout used for pose estimation.
    pub openpose_dir: PathBuf,
    /// Extra trainer arguments for the initialization fit.
    pub nerf_init_args: Vec<String>,
    /// Extra trainer arguments for re-fit passes.
    pub nerf_refit_args: Vec<String>,
}

impl RunConfig {
    /// Tag of iteration `index`; 0 is the initialization fit.
    #[must_use]
    pub fn iteration_tag(&self, index: usize) -> String {
        format!("{}_{index}", self.tag)
    }

    fn nerf_stage(
        &self,
        phase: NerfPhase,
        index: usize,
        smpl_mesh: Option<PathBuf>,
        extra_args: Vec<String>,
    ) -> NerfStage {
        NerfStage {
            experiment: Experiment::new(phase, self.iteration_tag(index)),
            prompt: self.prompt.clone(),
            prompt_human: self.prompt_human.clone(),
            negative_prompt: self.negative_prompt.clone(),
            negative_prompt_human: self.negative_prompt_human.clone(),
            mesh_path: self.mesh_path.clone(),
            mesh_translation: self.mesh_translation.clone(),
            mesh_scale: self.mesh_scale,
            mesh_rotation_deg: self.mesh_rotation_deg,
            mesh_tilt_deg: self.mesh_tilt_deg,
            checkpoint_interval: self.checkpoint_interval,
            use_wandb: self.use_wandb,
            smpl_mesh,
            extra_args,
        }
    }

    fn smplify_stage(&self) -> SmplifyStage {
        let mut stage = SmplifyStage::new(self.smpl_variant, self.openpose_dir.clone());
        stage.texture = self.smpl_texture.clone();
        stage.shape = self.smpl_shape.clone();
        stage
    }
}

/// Artifacts of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final fitted body mesh.
    pub smpl_mesh: PathBuf,
    /// Final fitted body parameters.
    pub smpl_params: PathBuf,
    /// Where the run report was written.
    pub report_path: PathBuf,
}

/// Drive a full run: initialization, body prediction, then the configured
/// number of re-fit iterations.
///
/// With `num_iterations == 0` the outcome is the initialization fit.
///
/// # Errors
///
/// Any stage failure aborts the run. Iterations recorded before the
/// failure stay in the report on disk.
pub fn run_full(sh: &Shell, ws: &Workspace, config: &RunConfig) -> PipelineResult<RunOutcome> {
    ensure_ready(ws, Some(&config.openpose_dir))?;

    let report_path = ws.runs_dir().join(format!("{}.json", config.tag));
    let mut report = RunReport::begin(&config.tag);
    let fitter = config.smplify_stage();

    info!("initializing composed NeRF for {}", config.tag);
    let init = config.nerf_stage(NerfPhase::Init, 0, None, config.nerf_init_args.clone());
    init.run(sh, ws)?;
    let mut fit = fitter.predict(sh, ws, &init.experiment)?;
    report.record(IterationRecord::completed(
        0,
        init.experiment.name(),
        fit.mesh.clone(),
        fit.params.clone(),
    ));
    report.save(&report_path)?;

    for i in 0..config.num_iterations {
        info!("re-fit iteration {} of {}", i + 1, config.num_iterations);
        let refit = config.nerf_stage(
            NerfPhase::Refit,
            i + 1,
            Some(fit.mesh.clone()),
            config.nerf_refit_args.clone(),
        );
        refit.run(sh, ws)?;
        fit = fitter.predict(sh, ws, &refit.experiment)?;
        report.record(IterationRecord::completed(
            i + 1,
            refit.experiment.name(),
            fit.mesh.clone(),
            fit.params.clone(),
        ));
        report.save(&report_path)?;
    }

    report.finish();
    report.save(&report_path)?;
    info!("run {} complete, report at {}", config.tag, report_path.display());

    Ok(RunOutcome {
        smpl_mesh: fit.mesh,
        smpl_params: fit.params,
        report_path,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig {
            tag: "chair".to_string(),
            num_iterations: 2,
            prompt: "a person sitting on a chair".to_string(),
            prompt_human: "a person".to_string(),
            negative_prompt: "missing limbs".to_string(),
            negative_prompt_human: "missing limbs".to_string(),
            mesh_path: PathBuf::from("/meshes/chair.obj"),
            mesh_translation: "[0,0,0]".to_string(),
            mesh_scale: 0.5,
            mesh_rotation_deg: 0.0,
            mesh_tilt_deg: 0.0,
            checkpoint_interval: 1000,
            use_wandb: false,
            smpl_variant: SmplVariant::Smplh,
            smpl_texture: None,
            smpl_shape: None,
            openpose_dir: PathBuf::from("/tools/openpose"),
            nerf_init_args: vec!["trainer.max_steps=1".to_string()],
            nerf_refit_args: vec!["trainer.max_steps=2".to_string()],
        }
    }

    #[test]
    fn iteration_tags_count_from_zero() {
        let config = config();
        assert_eq!(config.iteration_tag(0), "chair_0");
        assert_eq!(config.iteration_tag(3), "chair_3");
    }

    #[test]
    fn init_stage_has_no_body_mesh() {
        let config = config();
        let stage = config.nerf_stage(NerfPhase::Init, 0, None, config.nerf_init_args.clone());
        assert_eq!(stage.experiment.phase, NerfPhase::Init);
        assert_eq!(stage.experiment.tag, "chair_0");
        assert!(stage.smpl_mesh.is_none());
        assert_eq!(stage.extra_args, vec!["trainer.max_steps=1".to_string()]);
    }

    #[test]
    fn refit_stage_carries_the_fitted_mesh() {
        let config = config();
        let mesh = PathBuf::from("/fit/smpl_mesh.obj");
        let stage = config.nerf_stage(
            NerfPhase::Refit,
            1,
            Some(mesh.clone()),
            config.nerf_refit_args.clone(),
        );
        assert_eq!(stage.experiment.tag, "chair_1");
        assert_eq!(stage.smpl_mesh, Some(mesh));
        assert_eq!(stage.extra_args, vec!["trainer.max_steps=2".to_string()]);
    }

    #[test]
    fn smplify_stage_inherits_texture_and_shape() {
        let mut config = config();
        config.smpl_texture = Some(PathBuf::from("/assets/texture.png"));
        config.smpl_shape = Some(PathBuf::from("/assets/betas.npy"));
        let stage = config.smplify_stage();
        assert_eq!(stage.variant, SmplVariant::Smplh);
        assert_eq!(stage.texture, Some(PathBuf::from("/assets/texture.png")));
        assert_eq!(stage.shape, Some(PathBuf::from("/assets/betas.npy")));
    }
}
