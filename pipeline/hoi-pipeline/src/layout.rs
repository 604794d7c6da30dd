//! Experiment layout and naming.
//!
//! Every stage reads and writes inside a fixed directory scheme rooted at
//! the pipeline workspace. All layout paths are constructed here; stage
//! runners never assemble them ad hoc.
//!
//! ```text
//! <root>/
//!   src/MVDream-threestudio/        NeRF trainer checkout
//!     launch.py
//!     configs/<system>.yaml         base trainer configs
//!     outputs/<system>/<tag>/       one experiment
//!       ckpts/last.ckpt             symlink to the newest checkpoint
//!       configs/parsed.yaml         config as the trainer parsed it
//!       save/it10000-test-<view>-{rgb,openpose,metadata}/
//!   src/MultiviewSMPLifyX/          body-fitting checkout
//!   smplify/<system>/<tag>/         per-experiment fitting data farm
//!   runs/<tag>.json                 run reports
//! ```

use std::path::{Path, PathBuf};

/// Training step at which the trainer renders its test views.
pub const TEST_RENDER_STEP: u32 = 10_000;

/// Number of test views rendered per experiment.
pub const TEST_VIEW_COUNT: usize = 100;

/// Render view set used for body prediction: the human NeRF rendered
/// without the object mesh composited in.
pub const DEFAULT_VIEW: &str = "no_mesh";

/// Root paths of a pipeline workspace.
///
/// The workspace holds the two Python tool checkouts, the trainer output
/// tree, and the fitting data farms. The interpreter is carried here
/// because both Python stages must run inside the same environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    python: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at `root`, launching Python tools with
    /// `python`.
    pub fn new(root: impl Into<PathBuf>, python: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            python: python.into(),
        }
    }

    /// Workspace root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Python interpreter used for the trainer and the fitting tool.
    #[must_use]
    pub fn python(&self) -> &Path {
        &self.python
    }

    /// NeRF trainer checkout.
    #[must_use]
    pub fn threestudio_dir(&self) -> PathBuf {
        self.root.join("src").join("MVDream-threestudio")
    }

    /// Trainer launcher script.
    #[must_use]
    pub fn launcher(&self) -> PathBuf {
        self.threestudio_dir().join("launch.py")
    }

    /// Trainer output tree.
    #[must_use]
    pub fn outputs_dir(&self) -> PathBuf {
        self.threestudio_dir().join("outputs")
    }

    /// Body-fitting tool checkout.
    #[must_use]
    pub fn smplify_dir(&self) -> PathBuf {
        self.root.join("src").join("MultiviewSMPLifyX")
    }

    /// Root of the per-experiment fitting data farms.
    #[must_use]
    pub fn smplify_data_dir(&self) -> PathBuf {
        self.root.join("smplify")
    }

    /// Directory receiving run reports.
    #[must_use]
    pub fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }
}

/// Which trainer system an experiment runs.
///
/// Initialization fits the composed NeRF from scratch under multi-view
/// diffusion guidance. Re-fitting restarts from a fitted body mesh under
/// single-view guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerfPhase {
    /// First fit, before any body mesh exists.
    Init,
    /// Re-fit conditioned on a previously fitted body mesh.
    Refit,
}

impl NerfPhase {
    /// Trainer system name for this phase, which doubles as the base
    /// config stem and the first component of experiment names.
    #[must_use]
    pub const fn system_name(self) -> &'static str {
        match self {
            Self::Init => "mvdream-with-deepfloyd-with-mesh",
            Self::Refit => "smpl-with-mesh-nerf-if",
        }
    }
}

/// Kinds of per-view outputs an experiment's test render produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Color renders, input to pose estimation.
    Rgb,
    /// Keypoint JSON written by pose estimation.
    Keypoints,
    /// Camera metadata for multi-view fitting.
    Metadata,
}

impl RenderKind {
    /// Directory suffix inside the experiment save directory.
    const fn suffix(self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Keypoints => "openpose",
            Self::Metadata => "metadata",
        }
    }
}

/// One trainer experiment: a phase plus a unique tag.
///
/// The experiment name namespaces every stage artifact, so independent
/// runs can share a workspace as long as their tags differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    /// Trainer phase, which selects the system config.
    pub phase: NerfPhase,
    /// Unique tag, e.g. `sit-ball_0`.
    pub tag: String,
}

impl Experiment {
    /// Create an experiment for `phase` tagged `tag`.
    pub fn new(phase: NerfPhase, tag: impl Into<String>) -> Self {
        Self {
            phase,
            tag: tag.into(),
        }
    }

    /// `<system>/<tag>`, the name the trainer logs under.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/{}", self.phase.system_name(), self.tag)
    }

    /// Experiment output directory.
    #[must_use]
    pub fn dir(&self, ws: &Workspace) -> PathBuf {
        ws.outputs_dir().join(self.phase.system_name()).join(&self.tag)
    }

    /// `last.ckpt` symlink maintained by the trainer.
    #[must_use]
    pub fn last_ckpt(&self, ws: &Workspace) -> PathBuf {
        self.dir(ws).join("ckpts").join("last.ckpt")
    }

    /// Config snapshot the trainer writes once its arguments are parsed.
    #[must_use]
    pub fn parsed_config(&self, ws: &Workspace) -> PathBuf {
        self.dir(ws).join("configs").join("parsed.yaml")
    }

    /// Base config for a fresh run of this experiment's phase.
    #[must_use]
    pub fn base_config(&self, ws: &Workspace) -> PathBuf {
        ws.threestudio_dir()
            .join("configs")
            .join(format!("{}.yaml", self.phase.system_name()))
    }

    /// Directory holding the rendered test views.
    #[must_use]
    pub fn save_dir(&self, ws: &Workspace) -> PathBuf {
        self.dir(ws).join("save")
    }

    /// Per-view render directory of the given kind.
    #[must_use]
    pub fn render_dir(&self, ws: &Workspace, kind: RenderKind, view: &str) -> PathBuf {
        self.save_dir(ws)
            .join(format!("it{TEST_RENDER_STEP}-test-{view}-{}", kind.suffix()))
    }

    /// Data farm directory consumed by the fitting stage.
    #[must_use]
    pub fn fit_data_dir(&self, ws: &Workspace) -> PathBuf {
        ws.smplify_data_dir()
            .join(self.phase.system_name())
            .join(&self.tag)
    }
}
