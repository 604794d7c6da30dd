//! STL (Stereolithography) file format support.
//!
//! Supports both ASCII and binary STL. ASCII files start with "solid"
//! (after optional whitespace); binary files have an 80-byte header followed
//! by a face count. Some binary files also begin with "solid", so the header
//! is additionally checked for NUL bytes before choosing the ASCII path.
//!
//! STL stores no shared vertices, so every triangle contributes three
//! positions of its own.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, MeshResult};
use crate::types::TriMesh;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle record in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Load a mesh from an STL file.
///
/// Automatically detects ASCII vs binary format.
///
/// # Arguments
///
/// * `path` - Path to the STL file
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file content is not valid STL
pub fn load_stl<P: AsRef<Path>>(path: P) -> MeshResult<TriMesh> {
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

    // Read enough to determine the format
    let mut header = [0u8; HEADER_SIZE + 4];
    let bytes_read = reader.read(&mut header)?;

    if bytes_read < 6 {
        return Err(MeshError::invalid_content("file too small to be valid STL"));
    }

    let header_str = String::from_utf8_lossy(&header[..bytes_read.min(HEADER_SIZE)]);
    if header_str.trim_start().starts_with("solid") && !header[..bytes_read].contains(&0) {
        // ASCII format, re-read from the start
        drop(reader);
        let file = File::open(path)?;
        load_stl_ascii(BufReader::new(file))
    } else {
        load_stl_binary_from_header(&header[..bytes_read], reader)
    }
}

/// Load a binary STL given the already-read header.
fn load_stl_binary_from_header<R: Read>(header: &[u8], mut reader: R) -> MeshResult<TriMesh> {
    if header.len() < HEADER_SIZE + 4 {
        return Err(MeshError::invalid_content(format!(
            "binary STL header truncated at {} bytes",
            header.len()
        )));
    }

    // Face count sits after the 80-byte header
    let face_count = u32::from_le_bytes([
        header[HEADER_SIZE],
        header[HEADER_SIZE + 1],
        header[HEADER_SIZE + 2],
        header[HEADER_SIZE + 3],
    ]);

    // The header's count may lie, so cap the preallocation
    let expected = (face_count as usize).min(1 << 20);
    let mut mesh = TriMesh::with_capacity(expected * 3, expected);

    let mut triangle_buf = [0u8; TRIANGLE_SIZE];
    for i in 0..face_count {
        if let Err(e) = reader.read_exact(&mut triangle_buf) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(MeshError::invalid_content(format!(
                    "binary STL ended after {i} of {face_count} triangles"
                )));
            }
            return Err(MeshError::Io(e));
        }

        // Skip the stored normal (12 bytes); positions follow
        push_triangle(
            &mut mesh,
            read_point(&triangle_buf[12..24]),
            read_point(&triangle_buf[24..36]),
            read_point(&triangle_buf[36..48]),
        );
    }

    Ok(mesh)
}

/// Read a position from 12 bytes (3 little-endian f32s).
fn read_point(buf: &[u8]) -> Point3<f64> {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    Point3::new(f64::from(x), f64::from(y), f64::from(z))
}

/// Append one triangle's three positions and its face.
fn push_triangle(mesh: &mut TriMesh, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) {
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
    let base = mesh.positions.len() as u32;
    mesh.positions.push(a);
    mesh.positions.push(b);
    mesh.positions.push(c);
    mesh.faces.push([base, base + 1, base + 2]);
}

/// Load an ASCII STL file.
fn load_stl_ascii<R: BufRead>(reader: R) -> MeshResult<TriMesh> {
    let mut mesh = TriMesh::new();
    let mut in_facet = false;
    let mut in_loop = false;
    let mut corners: Vec<Point3<f64>> = Vec::with_capacity(3);

    for line in reader.lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&keyword) = parts.first() else {
            continue;
        };

        match keyword.to_lowercase().as_str() {
            "facet" => {
                // Normal follows but is ignored; recomputed on save
                in_facet = true;
            }
            "outer" => {
                if parts.len() >= 2 && parts[1].eq_ignore_ascii_case("loop") {
                    in_loop = true;
                    corners.clear();
                }
            }
            "vertex" => {
                if in_loop && parts.len() >= 4 {
                    let x: f64 = parts[1].parse()?;
                    let y: f64 = parts[2].parse()?;
                    let z: f64 = parts[3].parse()?;
                    corners.push(Point3::new(x, y, z));
                }
            }
            "endloop" => {
                in_loop = false;
            }
            "endfacet" => {
                if in_facet && corners.len() == 3 {
                    push_triangle(&mut mesh, corners[0], corners[1], corners[2]);
                }
                in_facet = false;
            }
            "endsolid" => {
                break;
            }
            _ => {}
        }
    }

    Ok(mesh)
}

/// Save a mesh to an STL file.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Output file path
/// * `binary` - If true, save as binary STL; if false, save as ASCII
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_stl<P: AsRef<Path>>(mesh: &TriMesh, path: P, binary: bool) -> MeshResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    if binary {
        save_stl_binary(mesh, writer)
    } else {
        save_stl_ascii(mesh, writer)
    }
}

/// Unit normal of a triangle, or zero for degenerate triangles.
fn face_normal(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> (f64, f64, f64) {
    let normal = (b - a).cross(&(c - a));
    let len = normal.norm();
    if len > f64::EPSILON {
        (normal.x / len, normal.y / len, normal.z / len)
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// Save mesh as binary STL.
fn save_stl_binary<W: Write>(mesh: &TriMesh, mut writer: W) -> MeshResult<()> {
    // 80-byte header padded with spaces
    let mut header = [b' '; HEADER_SIZE];
    let text = b"Binary STL generated by mesh-prep";
    header[..text.len()].copy_from_slice(text);
    writer.write_all(&header)?;

    #[allow(clippy::cast_possible_truncation)]
    // Truncation: face counts limited to u32 range by the index type
    let face_count = mesh.faces.len() as u32;
    writer.write_all(&face_count.to_le_bytes())?;

    for &[i0, i1, i2] in &mesh.faces {
        let a = mesh.positions[i0 as usize];
        let b = mesh.positions[i1 as usize];
        let c = mesh.positions[i2 as usize];

        let (nx, ny, nz) = face_normal(a, b, c);
        write_f32_triple(&mut writer, nx, ny, nz)?;
        write_f32_triple(&mut writer, a.x, a.y, a.z)?;
        write_f32_triple(&mut writer, b.x, b.y, b.z)?;
        write_f32_triple(&mut writer, c.x, c.y, c.z)?;

        // Attribute byte count
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

/// Write three f64 values as little-endian f32s.
fn write_f32_triple<W: Write>(writer: &mut W, x: f64, y: f64, z: f64) -> MeshResult<()> {
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: f64 to f32 is intentional, STL stores f32
    {
        writer.write_all(&(x as f32).to_le_bytes())?;
        writer.write_all(&(y as f32).to_le_bytes())?;
        writer.write_all(&(z as f32).to_le_bytes())?;
    }
    Ok(())
}

/// Save mesh as ASCII STL.
fn save_stl_ascii<W: Write>(mesh: &TriMesh, mut writer: W) -> MeshResult<()> {
    writeln!(writer, "solid mesh")?;

    for &[i0, i1, i2] in &mesh.faces {
        let a = mesh.positions[i0 as usize];
        let b = mesh.positions[i1 as usize];
        let c = mesh.positions[i2 as usize];

        let (nx, ny, nz) = face_normal(a, b, c);
        writeln!(writer, "  facet normal {nx:.6e} {ny:.6e} {nz:.6e}")?;
        writeln!(writer, "    outer loop")?;
        writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", a.x, a.y, a.z)?;
        writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", b.x, b.y, b.z)?;
        writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", c.x, c.y, c.z)?;
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }

    writeln!(writer, "endsolid mesh")?;

    Ok(())
}
