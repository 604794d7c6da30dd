//! OBJ (Wavefront) file format support.
//!
//! Reads the geometry subset of OBJ: `v` lines for positions and `f` lines
//! for faces. Texture coordinates, normals, groups, and material references
//! carry no geometry and are skipped.
//!
//! # Face Indices
//!
//! Face vertex specifications may be `7`, `7/1`, or `7//3`; only the vertex
//! index before the first slash is used. Indices are 1-based; negative
//! indices are relative to the vertices seen so far, per the OBJ spec.
//! Quads and larger polygons are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, MeshResult};
use crate::types::TriMesh;

/// Load a mesh from an OBJ file.
///
/// # Arguments
///
/// * `path` - Path to the OBJ file
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - A vertex line has fewer than 3 coordinates
/// - A face references a vertex that does not exist
///
/// # Example
///
/// ```no_run
/// use mesh_prep::load_obj;
///
/// let mesh = load_obj("ball.obj").unwrap();
/// println!("loaded {} faces", mesh.face_count());
/// ```
pub fn load_obj<P: AsRef<Path>>(path: P) -> MeshResult<TriMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MeshError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MeshError::Io(e)
        }
    })?;
    parse_obj(BufReader::new(file))
}

/// Parse OBJ content from a reader.
fn parse_obj<R: BufRead>(reader: R) -> MeshResult<TriMesh> {
    let mut mesh = TriMesh::new();
    let mut polygon: Vec<u32> = Vec::with_capacity(4);

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let x = next_coord(&mut parts, trimmed)?;
                let y = next_coord(&mut parts, trimmed)?;
                let z = next_coord(&mut parts, trimmed)?;
                mesh.positions.push(Point3::new(x, y, z));
            }
            "f" => {
                polygon.clear();
                for spec in parts {
                    polygon.push(resolve_index(spec, mesh.positions.len())?);
                }
                if polygon.len() < 3 {
                    return Err(MeshError::invalid_content(format!(
                        "face with fewer than 3 vertices: {trimmed}"
                    )));
                }
                // Fan triangulation for quads and larger polygons
                for i in 1..polygon.len() - 1 {
                    mesh.faces.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            // vt, vn, vp, g, o, s, usemtl, mtllib
            _ => {}
        }
    }

    Ok(mesh)
}

/// Read the next coordinate token from a vertex line.
fn next_coord<'a, I: Iterator<Item = &'a str>>(parts: &mut I, line: &str) -> MeshResult<f64> {
    let token = parts.next().ok_or_else(|| {
        MeshError::invalid_content(format!("vertex with fewer than 3 coordinates: {line}"))
    })?;
    Ok(token.parse()?)
}

/// Resolve one face vertex specification to a zero-based vertex index.
#[allow(clippy::cast_possible_wrap)]
// Wrap: vertex counts are far below i64::MAX
fn resolve_index(spec: &str, vertex_count: usize) -> MeshResult<u32> {
    let vertex_part = spec.split('/').next().unwrap_or("");
    let raw: i64 = vertex_part.parse()?;

    let resolved = if raw > 0 {
        raw - 1
    } else {
        // Negative indices count back from the most recent vertex; zero is
        // not a valid OBJ index.
        vertex_count as i64 + raw
    };

    if raw == 0 || resolved < 0 || resolved >= vertex_count as i64 {
        return Err(MeshError::FaceIndexOutOfRange {
            index: raw,
            vertex_count,
        });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Range-checked against vertex_count above
    Ok(resolved as u32)
}

/// Save a mesh to an OBJ file.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_obj<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> MeshResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# Generated by mesh-prep")?;
    for p in &mesh.positions {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for &[i0, i1, i2] in &mesh.faces {
        writeln!(writer, "f {} {} {}", i0 + 1, i1 + 1, i2 + 1)?;
    }

    Ok(())
}
