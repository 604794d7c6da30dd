//! Stage orchestration for compositional human-object interaction
//! synthesis.
//!
//! The pipeline alternates two expensive fits with a pose-estimation step
//! between them:
//!
//! 1. **NeRF fitting**: a trainer launcher fits a composed human+object
//!    NeRF under diffusion guidance, conditioned on a placed object mesh.
//! 2. **Pose estimation**: OpenPose extracts 2D keypoints from the NeRF's
//!    rendered test views.
//! 3. **Body fitting**: multi-view SMPLify solves body model parameters
//!    and a mesh from those keypoints.
//!
//! The fitted body mesh re-enters step 1 as the human geometry
//! initialization and the loop repeats. All three tools run as external
//! subprocesses with their own environments; this crate owns the paths
//! between them, the skip and resume semantics, and the exact command
//! lines.
//!
//! Stages are idempotent where their artifacts allow it: an existing
//! checkpoint resumes training, existing keypoints skip pose estimation,
//! and an existing fitted mesh skips body fitting. Re-running a crashed
//! run therefore continues roughly where it stopped.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod checkpoint;
mod driver;
mod error;
mod keypoints;
mod layout;
mod nerf;
mod openpose;
mod report;
mod smplify;
mod symlink;
mod tools;

pub use checkpoint::{probe_checkpoint, CheckpointState};
pub use driver::{run_full, RunConfig, RunOutcome};
pub use error::{PipelineError, PipelineResult, StageKind};
pub use keypoints::{
    audit_keypoint_dir, read_keypoints, Keypoint, KeypointAudit, KeypointFile, Person,
};
pub use layout::{
    Experiment, NerfPhase, RenderKind, Workspace, DEFAULT_VIEW, TEST_RENDER_STEP, TEST_VIEW_COUNT,
};
pub use nerf::NerfStage;
pub use openpose::OpenposeStage;
pub use report::{IterationRecord, RunReport};
pub use smplify::{FitOutputs, SmplVariant, SmplifyStage};
pub use symlink::force_symlink;
pub use tools::{ensure_ready, preflight, ToolStatus};
