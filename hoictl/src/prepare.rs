//! The `prepare-mesh` subcommand: preview an object mesh placement.
//!
//! Applies the same transform sequence the trainer's composed renderer
//! applies at run time, so a placement can be inspected in a mesh viewer
//! before any GPU time is spent on it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mesh_prep::{load_placed, parse_translation, save_mesh, Placement};
use owo_colors::OwoColorize;

/// Arguments for mesh placement preview.
#[derive(Args, Debug)]
pub struct PrepareMeshArgs {
    /// Object mesh to place (OBJ, PLY, or STL)
    #[arg(long)]
    pub input: PathBuf,

    /// Where to write the placed mesh (format chosen by extension)
    #[arg(long)]
    pub output: PathBuf,

    /// Scale the placed mesh by a constant
    #[arg(long)]
    pub scale: Option<f64>,

    /// Rotate about the up axis, degrees (counterclockwise viewed from above)
    #[arg(long = "rotation_deg")]
    pub rotation_deg: Option<f64>,

    /// Tilt about the x axis, degrees
    #[arg(long = "tilt_deg")]
    pub tilt_deg: Option<f64>,

    /// Translate the placed mesh, e.g. "[0,0,0.8]" (+x is front, +z is up)
    #[arg(long)]
    pub translation: Option<String>,

    /// The input is already Z-up; skip the Y-up correction
    #[arg(long = "no_y_up")]
    pub no_y_up: bool,

    /// Keep the input's position and size; skip centering and unit scaling
    #[arg(long = "no_normalize")]
    pub no_normalize: bool,
}

/// Load, place, and re-export a mesh, then print a summary.
pub fn run(args: &PrepareMeshArgs) -> Result<()> {
    let translation = args
        .translation
        .as_deref()
        .map(parse_translation)
        .transpose()
        .context("invalid --translation")?;

    let placement = Placement {
        y_up: !args.no_y_up,
        normalize: !args.no_normalize,
        scale: args.scale,
        rotation_deg: args.rotation_deg,
        tilt_deg: args.tilt_deg,
        translation,
    };

    let mesh = load_placed(&args.input, &placement)
        .with_context(|| format!("failed to place {}", args.input.display()))?;
    save_mesh(&mesh, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("{}", "Placement complete".green().bold());
    println!("  vertices: {}", mesh.vertex_count());
    println!("  faces:    {}", mesh.face_count());
    if let Some((min, max)) = mesh.extents() {
        println!(
            "  extents:  [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
    println!("  output:   {}", args.output.display());

    Ok(())
}
