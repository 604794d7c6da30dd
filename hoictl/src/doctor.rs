//! The `doctor` subcommand: check external tools before a run.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use hoi_pipeline::{preflight, Workspace};
use owo_colors::OwoColorize;

/// Arguments for the workspace health check.
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Workspace root holding src/, smplify/, and runs/
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Python interpreter with the trainer and fitting environments
    #[arg(long, default_value = "python")]
    pub python: PathBuf,

    /// OpenPose checkout to check (skipped when omitted)
    #[arg(long = "openpose_dir")]
    pub openpose_dir: Option<PathBuf>,
}

/// Probe every tool and report, exiting nonzero when any is missing.
pub fn run(args: &DoctorArgs) -> Result<()> {
    println!("{}", "Checking pipeline tools...".bold());
    println!();

    let ws = Workspace::new(&args.root, &args.python);
    let statuses = preflight(&ws, args.openpose_dir.as_deref());

    let mut missing = 0;
    for status in &statuses {
        if status.found {
            println!(
                "  {} {} {}",
                "✓".green(),
                status.name,
                status.path.display().dimmed()
            );
        } else {
            println!("  {} {}: {}", "✗".red(), status.name, status.hint);
            missing += 1;
        }
    }

    println!();
    if missing == 0 {
        println!("{}", "All tools present".green().bold());
        Ok(())
    } else {
        println!("{}", format!("{missing} tool(s) missing").red().bold());
        std::process::exit(1);
    }
}
