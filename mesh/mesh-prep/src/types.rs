//! Triangle mesh storage.

use nalgebra::{Point3, Vector3};

/// An indexed triangle mesh: vertex positions plus faces referencing them.
///
/// Placement only ever moves positions, so no per-vertex attributes
/// (normals, colors, UVs) are carried; the renderer recomputes normals
/// after placement.
///
/// # Example
///
/// ```
/// use mesh_prep::TriMesh;
/// use nalgebra::Point3;
///
/// let mut mesh = TriMesh::new();
/// mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
/// mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
/// mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Triangle faces as indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl TriMesh {
    /// Create an empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with preallocated capacity.
    #[must_use]
    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangle faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Mean of all vertex positions.
    ///
    /// Returns the origin for an empty mesh.
    #[must_use]
    pub fn vertex_mean(&self) -> Point3<f64> {
        if self.positions.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        #[allow(clippy::cast_precision_loss)]
        // Precision: vertex counts are far below 2^52
        let n = self.positions.len() as f64;
        Point3::from(sum / n)
    }

    /// Area-weighted surface centroid.
    ///
    /// Falls back to [`vertex_mean`](Self::vertex_mean) when the mesh has no
    /// faces or its total surface area is degenerate.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        let mut weighted = Vector3::zeros();
        let mut total_area = 0.0;

        for &[i0, i1, i2] in &self.faces {
            let a = self.positions[i0 as usize];
            let b = self.positions[i1 as usize];
            let c = self.positions[i2 as usize];

            let area = (b - a).cross(&(c - a)).norm() * 0.5;
            let center = (a.coords + b.coords + c.coords) / 3.0;
            weighted += center * area;
            total_area += area;
        }

        if total_area > f64::EPSILON {
            Point3::from(weighted / total_area)
        } else {
            self.vertex_mean()
        }
    }

    /// Mean Euclidean distance of vertices from the origin.
    ///
    /// Returns 0.0 for an empty mesh.
    #[must_use]
    pub fn mean_radius(&self) -> f64 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let total: f64 = self.positions.iter().map(|p| p.coords.norm()).sum();
        #[allow(clippy::cast_precision_loss)]
        // Precision: vertex counts are far below 2^52
        let n = self.positions.len() as f64;
        total / n
    }

    /// Axis-aligned bounding extents as `(min, max)`.
    ///
    /// Returns `None` for an empty mesh.
    #[must_use]
    pub fn extents(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.positions {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Translate all vertices by `offset`.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Scale all vertices uniformly about the origin.
    pub fn scale_uniform(&mut self, factor: f64) {
        for p in &mut self.positions {
            p.coords *= factor;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_right_triangle() -> TriMesh {
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh
    }

    #[test]
    fn empty_mesh_counts() {
        let mesh = TriMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.vertex_mean(), Point3::origin());
        assert_relative_eq!(mesh.mean_radius(), 0.0);
        assert!(mesh.extents().is_none());
    }

    #[test]
    fn vertex_mean_of_triangle() {
        let mesh = unit_right_triangle();
        let mean = mesh.vertex_mean();
        assert_relative_eq!(mean.x, 1.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean.y, 1.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn centroid_of_single_triangle_is_its_center() {
        let mesh = unit_right_triangle();
        let c = mesh.centroid();
        assert_relative_eq!(c.x, 1.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(c.y, 1.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(c.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn centroid_weights_by_area() {
        // A large triangle and a small one far away; the centroid should sit
        // close to the large triangle, unlike the plain vertex mean.
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(10.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 10.0, 0.0));
        mesh.positions.push(Point3::new(100.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(100.1, 0.0, 0.0));
        mesh.positions.push(Point3::new(100.0, 0.1, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 4, 5]);

        let c = mesh.centroid();
        assert!(c.x < 10.0, "centroid pulled too far: {c:?}");
    }

    #[test]
    fn centroid_without_faces_falls_back_to_vertex_mean() {
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(2.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(4.0, 0.0, 0.0));
        let c = mesh.centroid();
        assert_relative_eq!(c.x, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn mean_radius_of_symmetric_points() {
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(2.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 2.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 0.0, 2.0));
        mesh.positions.push(Point3::new(-2.0, 0.0, 0.0));
        assert_relative_eq!(mesh.mean_radius(), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn translate_moves_every_vertex() {
        let mut mesh = unit_right_triangle();
        mesh.translate(Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(mesh.positions[0].x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].y, 2.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[0].z, 3.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[1].x, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn scale_uniform_scales_about_origin() {
        let mut mesh = unit_right_triangle();
        mesh.scale_uniform(3.0);
        assert_relative_eq!(mesh.positions[1].x, 3.0, epsilon = 1e-10);
        assert_relative_eq!(mesh.positions[2].y, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn extents_cover_all_vertices() {
        let mut mesh = unit_right_triangle();
        mesh.positions.push(Point3::new(-2.0, 0.5, 4.0));
        let (min, max) = mesh.extents().unwrap();
        assert_relative_eq!(min.x, -2.0, epsilon = 1e-10);
        assert_relative_eq!(min.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min.z, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(max.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(max.z, 4.0, epsilon = 1e-10);
    }
}
