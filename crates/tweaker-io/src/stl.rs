//! STL reading and writing.
//!
//! The reader accepts both encodings. A file is ASCII when it starts with
//! `solid` and carries at least one triangle worth of `vertex` lines;
//! anything else is read as binary:
//!
//! ```text
//! UINT8[80]    header
//! UINT32       triangle count
//! foreach triangle
//!     REAL32[3] normal (ignored)
//!     REAL32[3] vertex 1..3
//!     UINT16    attribute byte count
//! ```
//!
//! Writers rotate every vertex and recompute facet normals from the rotated
//! triangle, so stale normals in the input never reach the output.

use std::fmt::Write as _;

use tweaker::Rotation;
use tweaker_math::{Point3, Vec3};

use crate::error::{IoError, Result};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle record in binary STL.
const TRIANGLE_SIZE: usize = 50;

/// Header written into binary output.
const BINARY_HEADER: &[u8] = b"Tweaked by tweaker";

/// Parse STL bytes into a flat triangle point stream.
pub fn parse_stl(bytes: &[u8]) -> Result<Vec<Point3>> {
    if is_ascii(bytes) {
        parse_ascii(&String::from_utf8_lossy(bytes))
    } else {
        parse_binary(bytes)
    }
}

fn is_ascii(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    text.trim_start().starts_with("solid") && vertex_lines(&text).take(3).count() == 3
}

fn vertex_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("vertex"))
}

fn parse_ascii(text: &str) -> Result<Vec<Point3>> {
    let mut points = Vec::new();
    for (i, line) in vertex_lines(text).enumerate() {
        let coords: Vec<f64> = line
            .split_whitespace()
            .skip(1)
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|e| IoError::Stl(format!("vertex {i}: invalid coordinate {s:?}: {e}")))
            })
            .collect::<Result<_>>()?;
        if coords.len() != 3 {
            return Err(IoError::Stl(format!(
                "vertex {i}: expected 3 coordinates, got {}",
                coords.len()
            )));
        }
        points.push(Point3::new(coords[0], coords[1], coords[2]));
    }
    if points.len() % 3 != 0 {
        return Err(IoError::Stl(format!(
            "{} vertices do not form whole triangles",
            points.len()
        )));
    }
    Ok(points)
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<Point3>> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(IoError::Stl(format!(
            "binary header needs {} bytes, got {}",
            HEADER_SIZE + 4,
            bytes.len()
        )));
    }

    let count = u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ]) as usize;

    let body = &bytes[HEADER_SIZE + 4..];
    let needed = count
        .checked_mul(TRIANGLE_SIZE)
        .ok_or_else(|| IoError::Stl(format!("triangle count {count} overflows")))?;
    if body.len() < needed {
        return Err(IoError::Stl(format!(
            "truncated file: {count} triangles need {needed} bytes, got {}",
            body.len()
        )));
    }

    let mut points = Vec::with_capacity(count * 3);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(count) {
        // Skip the 12-byte normal
        for v in 0..3 {
            let offset = 12 + v * 12;
            points.push(Point3::new(
                read_f32(record, offset),
                read_f32(record, offset + 4),
                read_f32(record, offset + 8),
            ));
        }
    }
    Ok(points)
}

fn read_f32(record: &[u8], offset: usize) -> f64 {
    f32::from_le_bytes([
        record[offset],
        record[offset + 1],
        record[offset + 2],
        record[offset + 3],
    ]) as f64
}

/// Rotate a triangle and compute its unit normal. Degenerate triangles get a
/// zero normal.
fn rotated_facet(tri: &[Point3], rotation: &Rotation) -> (Vec3, [Point3; 3]) {
    let v = [
        rotation.apply_point(&tri[0]),
        rotation.apply_point(&tri[1]),
        rotation.apply_point(&tri[2]),
    ];
    let normal = (v[1] - v[0])
        .cross(&(v[2] - v[0]))
        .try_normalize(0.0)
        .unwrap_or_else(Vec3::zeros);
    (normal, v)
}

/// Write rotated triangles as ASCII STL.
pub fn write_ascii_stl(name: &str, points: &[Point3], rotation: &Rotation) -> String {
    let mut out = String::with_capacity(points.len() / 3 * 256);
    // Writing into a String cannot fail
    let _ = writeln!(out, "solid {name}");
    for tri in points.chunks_exact(3) {
        let (n, v) = rotated_facet(tri, rotation);
        let _ = writeln!(out, "  facet normal {:.6} {:.6} {:.6}", n.x, n.y, n.z);
        let _ = writeln!(out, "    outer loop");
        for p in &v {
            let _ = writeln!(out, "      vertex {:.6} {:.6} {:.6}", p.x, p.y, p.z);
        }
        let _ = writeln!(out, "    endloop");
        let _ = writeln!(out, "  endfacet");
    }
    let _ = write!(out, "endsolid {name}");
    out
}

/// Write rotated triangles as binary STL.
pub fn write_binary_stl(points: &[Point3], rotation: &Rotation) -> Vec<u8> {
    let count = points.len() / 3;
    let mut out = Vec::with_capacity(HEADER_SIZE + 4 + count * TRIANGLE_SIZE);

    let mut header = [b' '; HEADER_SIZE];
    header[..BINARY_HEADER.len()].copy_from_slice(BINARY_HEADER);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(count as u32).to_le_bytes());

    for tri in points.chunks_exact(3) {
        let (n, v) = rotated_facet(tri, rotation);
        for c in [n.x, n.y, n.z] {
            out.extend_from_slice(&(c as f32).to_le_bytes());
        }
        for p in &v {
            for c in [p.x, p.y, p.z] {
                out.extend_from_slice(&(c as f32).to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}
