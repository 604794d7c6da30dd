//! Pipeline control tool for compositional human-object interaction
//! synthesis.
//!
//! # Commands
//!
//! - `hoictl run` - drive the full NeRF fit / body fit loop for one tag
//! - `hoictl prepare-mesh` - preview an object mesh placement offline
//! - `hoictl doctor` - check external tools before burning GPU time
//!
//! The heavy lifting happens in three external tools (a threestudio-based
//! NeRF trainer, OpenPose, and multi-view SMPLify); `hoictl` sequences
//! them, keeps their directory contract wired up, and resumes interrupted
//! runs.

mod doctor;
mod prepare;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Composed human-object NeRF pipeline control
#[derive(Parser)]
#[command(name = "hoictl")]
#[command(about = "Drive the composed human-object NeRF pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full fit/refit sequence for one tag
    Run(run::RunArgs),

    /// Apply placement transforms to an object mesh and write the result
    PrepareMesh(prepare::PrepareMeshArgs),

    /// Check that every external tool is where a run expects it
    Doctor(doctor::DoctorArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::PrepareMesh(args) => prepare::run(&args),
        Commands::Doctor(args) => doctor::run(&args),
    }
}
