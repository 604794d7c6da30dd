//! The `run` subcommand: one full fit/refit sequence.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hoi_pipeline::{run_full, RunConfig, SmplVariant, Workspace};
use owo_colors::OwoColorize;
use xshell::Shell;

/// Body model variants accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// Body only
    Smpl,
    /// Body plus articulated hands
    Smplh,
    /// Body, hands, and face
    Smplx,
}

impl From<VariantArg> for SmplVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Smpl => Self::Smpl,
            VariantArg::Smplh => Self::Smplh,
            VariantArg::Smplx => Self::Smplx,
        }
    }
}

/// Arguments for a full pipeline run.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Tag naming this run (e.g. "sit-ball")
    #[arg(long)]
    pub tag: String,

    /// Number of times to re-fit the NeRF after initialization
    #[arg(long = "num_iterations")]
    pub num_iterations: usize,

    /// Prompt for the composed human+object scene
    /// (e.g. "A photo of a person sitting on a ball, high detail, photography")
    #[arg(long)]
    pub prompt: String,

    /// Prompt for the human-only render
    #[arg(
        long = "prompt_human",
        default_value = "A photo of a person, high detail, photography"
    )]
    pub prompt_human: String,

    /// Negative prompt for the composed scene
    #[arg(
        long = "negative_prompt",
        default_value = "missing limbs, missing legs, missing arms"
    )]
    pub negative_prompt: String,

    /// Negative prompt for the human-only render
    #[arg(
        long = "negative_prompt_human",
        default_value = "missing limbs, missing legs, missing arms"
    )]
    pub negative_prompt_human: String,

    /// Path to the object mesh (e.g. /path/to/ball.obj)
    #[arg(long = "mesh_path")]
    pub mesh_path: PathBuf,

    /// Translate the object mesh, renderer syntax (+x is front, +z is up)
    #[arg(long = "mesh_translation", default_value = "[0,0,0]")]
    pub mesh_translation: String,

    /// Scale the object mesh by a constant
    #[arg(long = "mesh_scale", default_value_t = 0.5)]
    pub mesh_scale: f64,

    /// Rotate the object mesh, degrees (counterclockwise viewed from above)
    #[arg(long = "mesh_rotation_deg", default_value_t = 0.0)]
    pub mesh_rotation_deg: f64,

    /// Tilt the object mesh about the x axis, degrees
    #[arg(long = "mesh_tilt_deg", default_value_t = 0.0)]
    pub mesh_tilt_deg: f64,

    /// Save a trainer checkpoint every this many steps
    #[arg(long = "checkpoint_interval", default_value_t = 1000)]
    pub checkpoint_interval: u32,

    /// Enable the trainer's weights & biases logger
    #[arg(long = "use_wandb")]
    pub use_wandb: bool,

    /// Body model variant to fit between NeRF passes
    #[arg(long = "smpl_variant", value_enum, default_value = "smplh")]
    pub smpl_variant: VariantArg,

    /// Texture image to apply as the human identity
    #[arg(long = "smpl_texture")]
    pub smpl_texture: Option<PathBuf>,

    /// Fixed shape parameters (.npy betas) instead of predicted ones
    #[arg(long = "smpl_shape")]
    pub smpl_shape: Option<PathBuf>,

    /// OpenPose checkout; the binary must be at
    /// build/examples/openpose/openpose.bin inside it
    #[arg(long = "openpose_dir")]
    pub openpose_dir: PathBuf,

    /// Extra trainer arguments for the initialization fit
    #[arg(long = "nerf_init_args", num_args = 0.., value_name = "ARG")]
    pub nerf_init_args: Vec<String>,

    /// Extra trainer arguments for re-fit passes
    #[arg(long = "nerf_refit_args", num_args = 0.., value_name = "ARG")]
    pub nerf_refit_args: Vec<String>,

    /// Workspace root holding src/, smplify/, and runs/
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Python interpreter with the trainer and fitting environments
    #[arg(long, default_value = "python")]
    pub python: PathBuf,
}

/// Drive a full run and print where its artifacts landed.
pub fn run(args: RunArgs) -> Result<()> {
    let ws = Workspace::new(args.root, args.python);
    let config = RunConfig {
        tag: args.tag,
        num_iterations: args.num_iterations,
        prompt: args.prompt,
        prompt_human: args.prompt_human,
        negative_prompt: args.negative_prompt,
        negative_prompt_human: args.negative_prompt_human,
        mesh_path: args.mesh_path,
        mesh_translation: args.mesh_translation,
        mesh_scale: args.mesh_scale,
        mesh_rotation_deg: args.mesh_rotation_deg,
        mesh_tilt_deg: args.mesh_tilt_deg,
        checkpoint_interval: args.checkpoint_interval,
        use_wandb: args.use_wandb,
        smpl_variant: args.smpl_variant.into(),
        smpl_texture: args.smpl_texture,
        smpl_shape: args.smpl_shape,
        openpose_dir: args.openpose_dir,
        nerf_init_args: args.nerf_init_args,
        nerf_refit_args: args.nerf_refit_args,
    };

    let sh = Shell::new()?;
    let outcome = run_full(&sh, &ws, &config)
        .with_context(|| format!("run '{}' failed", config.tag))?;

    println!();
    println!("{}", "Run complete".green().bold());
    println!("  body mesh:   {}", outcome.smpl_mesh.display());
    println!("  body params: {}", outcome.smpl_params.display());
    println!("  report:      {}", outcome.report_path.display());

    Ok(())
}
