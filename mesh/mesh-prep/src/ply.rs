//! PLY (Polygon File Format) support.
//!
//! PLY is common for scanned objects, which is how object assets often
//! arrive. Supports ASCII, binary little-endian, and binary big-endian
//! variants via `ply-rs`.
//!
//! # Supported Properties
//!
//! - Vertex positions (x, y, z) - required
//! - Face vertex indices (`vertex_indices` or `vertex_index`) - required
//!   for meshes; polygons are fan-triangulated

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use crate::error::{MeshError, MeshResult};
use crate::types::TriMesh;

/// Load a mesh from a PLY file.
///
/// # Arguments
///
/// * `path` - Path to the PLY file
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file is not valid PLY format
/// - A face references a vertex that does not exist
pub fn load_ply<P: AsRef<Path>>(path: P) -> MeshResult<TriMesh> {
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
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let header = parser
        .read_header(&mut reader)
        .map_err(|e| MeshError::invalid_content(format!("failed to parse PLY header: {e}")))?;
    let payload = parser
        .read_payload(&mut reader, &header)
        .map_err(|e| MeshError::invalid_content(format!("failed to read PLY payload: {e}")))?;

    let mut mesh = TriMesh::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        mesh.positions.reserve(vertex_elements.len());
        for element in vertex_elements {
            let x = scalar_f64(element, "x").unwrap_or(0.0);
            let y = scalar_f64(element, "y").unwrap_or(0.0);
            let z = scalar_f64(element, "z").unwrap_or(0.0);
            mesh.positions.push(Point3::new(x, y, z));
        }
    }

    if let Some(face_elements) = payload.get("face") {
        mesh.faces.reserve(face_elements.len());
        for element in face_elements {
            let indices = index_list(element);
            if indices.len() < 3 {
                continue;
            }
            for &idx in &indices {
                if idx >= mesh.positions.len() {
                    #[allow(clippy::cast_possible_wrap)]
                    // Wrap: vertex counts are far below i64::MAX
                    return Err(MeshError::FaceIndexOutOfRange {
                        index: idx as i64,
                        vertex_count: mesh.positions.len(),
                    });
                }
            }
            // Fan triangulation for convex polygons
            #[allow(clippy::cast_possible_truncation)]
            // Truncation: indices validated against the vertex count above
            for i in 1..indices.len() - 1 {
                mesh.faces
                    .push([indices[0] as u32, indices[i] as u32, indices[i + 1] as u32]);
            }
        }
    }

    Ok(mesh)
}

/// Extract a float-valued scalar property from a PLY element.
fn scalar_f64(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        _ => None,
    }
}

/// Extract the vertex index list from a face element.
fn index_list(element: &DefaultElement) -> Vec<usize> {
    // Both spellings occur in the wild
    for key in &["vertex_indices", "vertex_index"] {
        if let Some(prop) = element.get(*key) {
            return match prop {
                Property::ListInt(v) =>
                {
                    #[allow(clippy::cast_sign_loss)]
                    v.iter().map(|&i| i as usize).collect()
                }
                Property::ListUInt(v) => v.iter().map(|&i| i as usize).collect(),
                Property::ListUChar(v) => v.iter().map(|&i| usize::from(i)).collect(),
                Property::ListChar(v) =>
                {
                    #[allow(clippy::cast_sign_loss)]
                    v.iter().map(|&i| i as usize).collect()
                }
                Property::ListShort(v) =>
                {
                    #[allow(clippy::cast_sign_loss)]
                    v.iter().map(|&i| i as usize).collect()
                }
                Property::ListUShort(v) => v.iter().map(|&i| usize::from(i)).collect(),
                _ => continue,
            };
        }
    }
    Vec::new()
}

/// Save a mesh to a PLY file.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Output file path
/// * `binary` - If true, save as binary little-endian; if false, as ASCII
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_ply<P: AsRef<Path>>(mesh: &TriMesh, path: P, binary: bool) -> MeshResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    if binary {
        save_ply_binary(mesh, &mut writer)
    } else {
        save_ply_ascii(mesh, &mut writer)
    }
}

/// Save mesh as binary PLY (little-endian).
///
/// Written by hand because ply-rs writes binary list properties with the
/// element count in place of the list length.
fn save_ply_binary<W: std::io::Write>(mesh: &TriMesh, writer: &mut W) -> MeshResult<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "comment Generated by mesh-prep")?;
    writeln!(writer, "element vertex {}", mesh.positions.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "element face {}", mesh.faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for p in &mesh.positions {
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: f64 to f32 is intentional, PLY stores f32 positions
        {
            writer.write_all(&(p.x as f32).to_le_bytes())?;
            writer.write_all(&(p.y as f32).to_le_bytes())?;
            writer.write_all(&(p.z as f32).to_le_bytes())?;
        }
    }

    for &[i0, i1, i2] in &mesh.faces {
        writer.write_all(&[3u8])?;
        #[allow(clippy::cast_possible_wrap)]
        {
            writer.write_all(&(i0 as i32).to_le_bytes())?;
            writer.write_all(&(i1 as i32).to_le_bytes())?;
            writer.write_all(&(i2 as i32).to_le_bytes())?;
        }
    }

    Ok(())
}

/// Save mesh as ASCII PLY using ply-rs.
fn save_ply_ascii<W: std::io::Write>(mesh: &TriMesh, writer: &mut W) -> MeshResult<()> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("Generated by mesh-prep".to_string());

    let mut vertex_def = ElementDef::new("vertex".to_string());
    vertex_def.properties.add(PropertyDef::new(
        "x".to_string(),
        PropertyType::Scalar(ScalarType::Float),
    ));
    vertex_def.properties.add(PropertyDef::new(
        "y".to_string(),
        PropertyType::Scalar(ScalarType::Float),
    ));
    vertex_def.properties.add(PropertyDef::new(
        "z".to_string(),
        PropertyType::Scalar(ScalarType::Float),
    ));
    vertex_def.count = mesh.positions.len();
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face_def.count = mesh.faces.len();
    ply.header.elements.add(face_def);

    let mut vertex_elements = Vec::with_capacity(mesh.positions.len());
    for p in &mesh.positions {
        let mut element = DefaultElement::new();
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: f64 to f32 is intentional, PLY stores f32 positions
        {
            element.insert("x".to_string(), Property::Float(p.x as f32));
            element.insert("y".to_string(), Property::Float(p.y as f32));
            element.insert("z".to_string(), Property::Float(p.z as f32));
        }
        vertex_elements.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertex_elements);

    let mut face_elements = Vec::with_capacity(mesh.faces.len());
    for &[i0, i1, i2] in &mesh.faces {
        let mut element = DefaultElement::new();
        #[allow(clippy::cast_possible_wrap)]
        let indices = vec![i0 as i32, i1 as i32, i2 as i32];
        element.insert("vertex_indices".to_string(), Property::ListInt(indices));
        face_elements.push(element);
    }
    ply.payload.insert("face".to_string(), face_elements);

    let ply_writer = Writer::new();
    ply_writer
        .write_ply(writer, &mut ply)
        .map_err(|e| MeshError::invalid_content(format!("failed to write PLY: {e}")))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_triangle() -> TriMesh {
        let mut mesh = TriMesh::new();
        mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh
    }

    #[test]
    fn roundtrip_binary() {
        let original = test_triangle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.ply");

        save_ply(&original, &path, true).unwrap();
        let loaded = load_ply(&path).unwrap();

        assert_eq!(loaded.face_count(), original.face_count());
        assert_eq!(loaded.vertex_count(), original.vertex_count());
        for (orig, load) in original.positions.iter().zip(loaded.positions.iter()) {
            assert!((orig.x - load.x).abs() < 1e-5);
            assert!((orig.y - load.y).abs() < 1e-5);
            assert!((orig.z - load.z).abs() < 1e-5);
        }
    }

    #[test]
    fn roundtrip_ascii() {
        let original = test_triangle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_ascii.ply");

        save_ply(&original, &path, false).unwrap();
        let loaded = load_ply(&path).unwrap();

        assert_eq!(loaded.face_count(), original.face_count());
        assert_eq!(loaded.vertex_count(), original.vertex_count());
    }

    #[test]
    fn ascii_quad_is_fan_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.ply");
        let content = "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
        std::fs::write(&path, content).unwrap();

        let mesh = load_ply(&path).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.faces[1], [0, 2, 3]);
    }

    #[test]
    fn face_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ply");
        let content = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n3 0 1 5\n";
        std::fs::write(&path, content).unwrap();

        let result = load_ply(&path);
        assert!(matches!(
            result,
            Err(MeshError::FaceIndexOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_ply("nonexistent_file_12345.ply");
        assert!(matches!(result, Err(MeshError::FileNotFound { .. })));
    }
}
