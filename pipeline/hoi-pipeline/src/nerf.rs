//! NeRF fitting stage.
//!
//! Builds and launches one trainer invocation. Argument construction is
//! pure so the exact command line is testable; execution happens from the
//! trainer checkout using the workspace's Python interpreter.

use std::path::PathBuf;

use tracing::info;
use xshell::{cmd, Shell};

use crate::checkpoint::{probe_checkpoint, CheckpointState};
use crate::error::{PipelineError, PipelineResult, StageKind};
use crate::layout::{Experiment, Workspace};

/// One trainer invocation fitting a composed human+object NeRF.
///
/// The mesh placement fields are passed to the composed renderer verbatim;
/// the renderer applies them in the same order as mesh preparation, so a
/// previewed placement and a trained one agree.
#[derive(Debug, Clone)]
pub struct NerfStage {
    /// Experiment this invocation trains.
    pub experiment: Experiment,
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
    /// Body mesh initializing the human geometry, for re-fit experiments.
    pub smpl_mesh: Option<PathBuf>,
    /// Extra trainer arguments appended verbatim.
    pub extra_args: Vec<String>,
}

impl NerfStage {
    /// Config selection arguments: resume from the experiment's parsed
    /// config when a checkpoint survives, else start from the phase's base
    /// config.
    #[must_use]
    pub fn config_args(&self, ws: &Workspace, state: &CheckpointState) -> Vec<String> {
        match state {
            CheckpointState::Resume(ckpt) => vec![
                "--config".to_string(),
                self.experiment.parsed_config(ws).display().to_string(),
                format!("resume={}", ckpt.display()),
            ],
            CheckpointState::Fresh => vec![
                "--config".to_string(),
                self.experiment.base_config(ws).display().to_string(),
            ],
        }
    }

    /// Config overrides, in the order the trainer receives them.
    #[must_use]
    pub fn overrides(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(16 + self.extra_args.len());
        if let Some(mesh) = &self.smpl_mesh {
            args.push(format!("system.geometry.shape_init=mesh:{}", mesh.display()));
        }
        args.push("use_timestamp=false".to_string());
        args.push(format!("tag={}", self.experiment.tag));
        args.push(format!(
            "checkpoint.every_n_train_steps={}",
            self.checkpoint_interval
        ));
        args.push(format!("system.loggers.wandb.enable={}", self.use_wandb));
        args.push(format!("system.loggers.wandb.name={}", self.experiment.name()));
        args.push(format!(
            "system.composed_prompt_processor.prompt={}",
            self.prompt
        ));
        args.push(format!("system.prompt_processor.prompt={}", self.prompt_human));
        args.push(format!(
            "system.composed_prompt_processor.negative_prompt={}",
            self.negative_prompt
        ));
        args.push(format!(
            "system.prompt_processor.negative_prompt={}",
            self.negative_prompt_human
        ));
        args.push(format!(
            "system.composed_renderer.mesh_path={}",
            self.mesh_path.display()
        ));
        args.push(format!("system.composed_renderer.mesh.scale={}", self.mesh_scale));
        args.push(format!(
            "system.composed_renderer.mesh.translation={}",
            self.mesh_translation
        ));
        args.push(format!(
            "system.composed_renderer.mesh.rotation_deg={}",
            self.mesh_rotation_deg
        ));
        args.push(format!(
            "system.composed_renderer.mesh.tilt_deg={}",
            self.mesh_tilt_deg
        ));
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Probe for a resumable checkpoint, then launch the trainer.
    ///
    /// # Errors
    ///
    /// Fails when a corrupt experiment directory cannot be removed or the
    /// trainer exits unsuccessfully.
    pub fn run(&self, sh: &Shell, ws: &Workspace) -> PipelineResult<()> {
        let state = probe_checkpoint(ws, &self.experiment)?;
        match &state {
            CheckpointState::Resume(ckpt) => {
                info!("resuming {} from {}", self.experiment.name(), ckpt.display());
            }
            CheckpointState::Fresh => info!("training {} from scratch", self.experiment.name()),
        }

        let python = ws.python().to_path_buf();
        let launcher = ws.launcher();
        let config_args = self.config_args(ws, &state);
        let overrides = self.overrides();

        // The launcher resolves its relative imports from the checkout.
        let _dir = sh.push_dir(ws.threestudio_dir());
        cmd!(
            sh,
            "{python} {launcher} --train --gpu 0 {config_args...} {overrides...}"
        )
        .run()
        .map_err(|source| PipelineError::Stage {
            stage: StageKind::Nerf,
            source,
        })?;

        Ok(())
    }
}
