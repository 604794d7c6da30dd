//! Object placement for composed rendering.
//!
//! The composed renderer positions the object mesh in the body model's
//! world frame with a fixed transform sequence. This module reproduces that
//! sequence outside the training loop, so a placement can be checked on the
//! raw asset before a run is launched.

use std::path::Path;

use nalgebra::Vector3;

use crate::error::{MeshError, MeshResult};
use crate::transform::Transform3D;
use crate::types::TriMesh;

/// Placement parameters for an object mesh.
///
/// Applied in a fixed order:
///
/// 1. `y_up` - rotate +90° about X, standing Y-up assets upright in the
///    Z-up world frame
/// 2. `normalize` - translate the centroid to the origin, then scale to
///    unit mean vertex radius
/// 3. `scale` - uniform scale
/// 4. `rotation_deg` - yaw about the Z axis
/// 5. `tilt_deg` - tilt about the X axis
/// 6. `translation` - final offset
///
/// The order is load-bearing: the renderer conditions the NeRF with the
/// same sequence, and the two must agree.
///
/// # Example
///
/// ```
/// use mesh_prep::Placement;
///
/// let placement = Placement {
///     scale: Some(0.5),
///     rotation_deg: Some(90.0),
///     ..Placement::default()
/// };
/// assert!(placement.y_up);
/// assert!(placement.normalize);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Rotate the asset from Y-up to Z-up before anything else.
    pub y_up: bool,
    /// Center on the centroid and scale to unit mean radius.
    pub normalize: bool,
    /// Uniform scale factor.
    pub scale: Option<f64>,
    /// Yaw about the Z axis, in degrees.
    pub rotation_deg: Option<f64>,
    /// Tilt about the X axis, in degrees.
    pub tilt_deg: Option<f64>,
    /// Final translation.
    pub translation: Option<Vector3<f64>>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            y_up: true,
            normalize: true,
            scale: None,
            rotation_deg: None,
            tilt_deg: None,
            translation: None,
        }
    }
}

impl Placement {
    /// Apply the placement to a mesh, in place.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DegenerateMesh`] when normalization is requested
    /// and the mesh is empty or collapses to a point, which would make the
    /// scale factor blow up.
    pub fn apply(&self, mesh: &mut TriMesh) -> MeshResult<()> {
        if self.y_up {
            Transform3D::rotation_x(std::f64::consts::FRAC_PI_2).apply_to(mesh);
        }
        if self.normalize {
            normalize(mesh)?;
        }
        if let Some(factor) = self.scale {
            mesh.scale_uniform(factor);
        }
        if let Some(deg) = self.rotation_deg {
            Transform3D::rotation_z(deg.to_radians()).apply_to(mesh);
        }
        if let Some(deg) = self.tilt_deg {
            Transform3D::rotation_x(deg.to_radians()).apply_to(mesh);
        }
        if let Some(offset) = self.translation {
            mesh.translate(offset);
        }
        Ok(())
    }
}

/// Center a mesh on its centroid, then scale it to unit mean vertex radius.
///
/// The radius is measured after centering; the two steps form one unit and
/// must not be reordered.
///
/// # Errors
///
/// Returns [`MeshError::DegenerateMesh`] for an empty mesh or one whose
/// centered mean radius is (near-)zero.
pub fn normalize(mesh: &mut TriMesh) -> MeshResult<()> {
    if mesh.is_empty() {
        return Err(MeshError::DegenerateMesh {
            reason: "no vertices to normalize".to_string(),
        });
    }

    let centroid = mesh.centroid();
    mesh.translate(-centroid.coords);

    let radius = mesh.mean_radius();
    if radius < f64::EPSILON {
        return Err(MeshError::DegenerateMesh {
            reason: "mean vertex radius is zero after centering".to_string(),
        });
    }
    mesh.scale_uniform(1.0 / radius);

    Ok(())
}

/// Load a mesh and apply a placement to it.
///
/// # Errors
///
/// Returns an error if the mesh cannot be loaded or the placement cannot be
/// applied.
///
/// # Example
///
/// ```no_run
/// use mesh_prep::{Placement, load_placed};
///
/// let mesh = load_placed("ball.obj", &Placement::default()).unwrap();
/// ```
pub fn load_placed<P: AsRef<Path>>(path: P, placement: &Placement) -> MeshResult<TriMesh> {
    let mut mesh = crate::load_mesh(path)?;
    placement.apply(&mut mesh)?;
    Ok(mesh)
}

/// Parse a launcher-style translation string such as `"[0.2,0,-0.1]"`.
///
/// The surrounding brackets are optional; components are comma-separated.
///
/// # Errors
///
/// Returns an error when the string does not contain exactly three numeric
/// components.
pub fn parse_translation(text: &str) -> MeshResult<Vector3<f64>> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(MeshError::InvalidParameter {
            message: format!(
                "expected 3 translation components, got {}: {text:?}",
                parts.len()
            ),
        });
    }
    let x: f64 = parts[0].parse()?;
    let y: f64 = parts[1].parse()?;
    let z: f64 = parts[2].parse()?;
    Ok(Vector3::new(x, y, z))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    /// A 2x4x6 box centered away from the origin, with all 12 faces.
    fn offset_box() -> TriMesh {
        let mut mesh = TriMesh::new();
        let center = Vector3::new(3.0, -2.0, 5.0);
        let half = Vector3::new(1.0, 2.0, 3.0);
        for &sx in &[-1.0, 1.0] {
            for &sy in &[-1.0, 1.0] {
                for &sz in &[-1.0, 1.0] {
                    mesh.positions.push(Point3::from(
                        center + Vector3::new(sx * half.x, sy * half.y, sz * half.z),
                    ));
                }
            }
        }
        // Corner ordering: index = sx*4 + sy*2 + sz (0 = negative, 1 = positive)
        let quads: [[u32; 4]; 6] = [
            [0, 1, 3, 2], // -x
            [4, 6, 7, 5], // +x
            [0, 4, 5, 1], // -y
            [2, 3, 7, 6], // +y
            [0, 2, 6, 4], // -z
            [1, 5, 7, 3], // +z
        ];
        for q in &quads {
            mesh.faces.push([q[0], q[1], q[2]]);
            mesh.faces.push([q[0], q[2], q[3]]);
        }
        mesh
    }

    #[test]
    fn normalize_centers_the_centroid() {
        let mut mesh = offset_box();
        normalize(&mut mesh).unwrap();

        let c = mesh.centroid();
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(c.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(c.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn normalize_yields_unit_mean_radius() {
        let mut mesh = offset_box();
        normalize(&mut mesh).unwrap();
        assert_relative_eq!(mesh.mean_radius(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn normalize_rejects_empty_mesh() {
        let mut mesh = TriMesh::new();
        let result = normalize(&mut mesh);
        assert!(matches!(result, Err(MeshError::DegenerateMesh { .. })));
    }

    #[test]
    fn normalize_rejects_point_mesh() {
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(7.0, 7.0, 7.0));
        mesh.positions.push(Point3::new(7.0, 7.0, 7.0));
        let result = normalize(&mut mesh);
        assert!(matches!(result, Err(MeshError::DegenerateMesh { .. })));
    }

    #[test]
    fn y_up_stands_the_asset_upright() {
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(0.0, 1.0, 0.0));

        let placement = Placement {
            normalize: false,
            ..Placement::default()
        };
        placement.apply(&mut mesh).unwrap();

        // Y-up becomes Z-up
        assert_relative_eq!(mesh.positions[0].x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].z, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        // A point on +X, scaled then yawed 90°, must land on +Y scaled;
        // if the translation were applied before the rotation it would be
        // rotated away from +X.
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(1.0, 0.0, 0.0));

        let placement = Placement {
            y_up: false,
            normalize: false,
            scale: Some(2.0),
            rotation_deg: Some(90.0),
            tilt_deg: None,
            translation: Some(Vector3::new(1.0, 0.0, 0.0)),
        };
        placement.apply(&mut mesh).unwrap();

        assert_relative_eq!(mesh.positions[0].x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].y, 2.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn rotation_applies_before_tilt() {
        // Yaw 90° sends +X to +Y; tilt 90° about X then sends +Y to +Z.
        // In the opposite order the point would end up on +Y.
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(1.0, 0.0, 0.0));

        let placement = Placement {
            y_up: false,
            normalize: false,
            scale: None,
            rotation_deg: Some(90.0),
            tilt_deg: Some(90.0),
            translation: None,
        };
        placement.apply(&mut mesh).unwrap();

        assert_relative_eq!(mesh.positions[0].x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].z, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn full_placement_is_invertible() {
        let original = offset_box();
        let mut mesh = original.clone();

        let placement = Placement {
            y_up: true,
            normalize: false,
            scale: Some(0.5),
            rotation_deg: Some(30.0),
            tilt_deg: Some(-15.0),
            translation: Some(Vector3::new(0.2, -0.4, 1.0)),
        };
        placement.apply(&mut mesh).unwrap();

        // Rebuild the same sequence as a single transform and undo it
        let forward = Transform3D::rotation_x(std::f64::consts::FRAC_PI_2)
            .then(&Transform3D::uniform_scale(0.5))
            .then(&Transform3D::rotation_z(30f64.to_radians()))
            .then(&Transform3D::rotation_x((-15f64).to_radians()))
            .then(&Transform3D::from_translation(Vector3::new(0.2, -0.4, 1.0)));
        forward.inverse().unwrap().apply_to(&mut mesh);

        for (orig, round) in original.positions.iter().zip(mesh.positions.iter()) {
            assert_relative_eq!(orig.x, round.x, epsilon = 1e-9);
            assert_relative_eq!(orig.y, round.y, epsilon = 1e-9);
            assert_relative_eq!(orig.z, round.z, epsilon = 1e-9);
        }
    }

    #[test]
    fn parse_translation_with_brackets() {
        let v = parse_translation("[0.2,0,-0.1]").unwrap();
        assert_relative_eq!(v.x, 0.2);
        assert_relative_eq!(v.y, 0.0);
        assert_relative_eq!(v.z, -0.1);
    }

    #[test]
    fn parse_translation_with_spaces_and_no_brackets() {
        let v = parse_translation(" 1.5, -2 , 3 ").unwrap();
        assert_relative_eq!(v.x, 1.5);
        assert_relative_eq!(v.y, -2.0);
        assert_relative_eq!(v.z, 3.0);
    }

    #[test]
    fn parse_translation_wrong_arity() {
        assert!(matches!(
            parse_translation("[1,2]"),
            Err(MeshError::InvalidParameter { .. })
        ));
        assert!(matches!(
            parse_translation("[1,2,3,4]"),
            Err(MeshError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn parse_translation_bad_component() {
        assert!(matches!(
            parse_translation("[1,two,3]"),
            Err(MeshError::ParseFloat(_))
        ));
    }
}
