//! Object mesh preparation for HOI synthesis.
//!
//! This crate loads, normalizes, and places the object mesh that conditions
//! a composed human+object NeRF. It supports the formats object assets
//! commonly arrive in:
//!
//! - **OBJ** (Wavefront) - ASCII
//! - **PLY** (Polygon File Format) - Binary and ASCII
//! - **STL** (Stereolithography) - Binary and ASCII
//!
//! # Placement
//!
//! The composed renderer positions the object mesh with a fixed transform
//! sequence (axis correction, normalization, scale, yaw, tilt, translation).
//! [`Placement`] reproduces that sequence outside the training loop so that
//! a placement can be previewed before committing GPU-days to a run.
//!
//! # Example
//!
//! ```no_run
//! use mesh_prep::{Placement, load_placed};
//!
//! let placement = Placement {
//!     scale: Some(0.5),
//!     rotation_deg: Some(90.0),
//!     ..Placement::default()
//! };
//! let mesh = load_placed("ball.obj", &placement).unwrap();
//! println!("placed {} vertices", mesh.vertex_count());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod obj;
mod placement;
mod ply;
mod stl;
mod transform;
mod types;

pub use error::{MeshError, MeshResult};
pub use obj::{load_obj, save_obj};
pub use placement::{Placement, load_placed, normalize, parse_translation};
pub use ply::{load_ply, save_ply};
pub use stl::{load_stl, save_stl};
pub use transform::Transform3D;
pub use types::TriMesh;

use std::path::Path;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// OBJ (Wavefront) format.
    /// ASCII only, geometry subset (`v`/`f` lines).
    Obj,
    /// PLY (Polygon File Format).
    /// Supports binary and ASCII variants.
    Ply,
    /// STL (Stereolithography) format.
    /// Supports binary and ASCII variants.
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to check for extension
    ///
    /// # Returns
    ///
    /// The detected format, or `None` if the extension is not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "obj" => Some(Self::Obj),
            "ply" => Some(Self::Ply),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Ply => "ply",
            Self::Stl => "stl",
        }
    }
}

/// Load a mesh from a file, detecting format from extension.
///
/// # Arguments
///
/// * `path` - Path to the mesh file
///
/// # Errors
///
/// Returns an error if:
/// - The file format cannot be determined from the extension
/// - The file cannot be read
/// - The file content is invalid for the detected format
///
/// # Example
///
/// ```no_run
/// use mesh_prep::load_mesh;
///
/// let mesh = load_mesh("ball.obj").unwrap();
/// ```
pub fn load_mesh<P: AsRef<Path>>(path: P) -> MeshResult<TriMesh> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path).ok_or_else(|| MeshError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    match format {
        MeshFormat::Obj => load_obj(path),
        MeshFormat::Ply => load_ply(path),
        MeshFormat::Stl => load_stl(path),
    }
}

/// Save a mesh to a file, detecting format from extension.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Path for the output file
///
/// # Errors
///
/// Returns an error if:
/// - The file format cannot be determined from the extension
/// - The file cannot be written
pub fn save_mesh<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> MeshResult<()> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path).ok_or_else(|| MeshError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    match format {
        MeshFormat::Obj => save_obj(mesh, path),
        MeshFormat::Ply => save_ply(mesh, path, true), // Default to binary PLY
        MeshFormat::Stl => save_stl(mesh, path, true), // Default to binary STL
    }
}
