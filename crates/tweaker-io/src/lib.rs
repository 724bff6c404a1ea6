#![warn(missing_docs)]

//! Mesh file handling for the tweaker orientation search.
//!
//! Loads STL (ASCII or binary) and 3MF files into the flat triangle point
//! stream [`tweaker::tweak`] consumes, and writes the reoriented result back
//! in the format it came from.

pub mod error;
pub mod stl;
pub mod threemf;

pub use error::{IoError, Result};
pub use stl::{parse_stl, write_ascii_stl, write_binary_stl};
pub use threemf::{parse_3mf, rewrite_3mf};

use std::path::{Path, PathBuf};

use tracing::debug;
use tweaker::{Orientation, Point3};

/// Annotation appended to ASCII STL output when support is suggested.
pub const SUPPORT_ANNOTATION: &str = " {supportstructure: yes}";

/// Supported mesh container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// STL, ASCII or binary.
    Stl,
    /// 3D Manufacturing Format archive.
    ThreeMf,
}

impl MeshFormat {
    /// Format for a path, judged by its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "stl" => Ok(Self::Stl),
            "3mf" => Ok(Self::ThreeMf),
            _ => Err(IoError::UnsupportedFormat(format!(
                "{}: expected .stl or .3mf",
                path.display()
            ))),
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::ThreeMf => "3mf",
        }
    }
}

/// A mesh read from disk.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    /// File stem, used as the STL solid name.
    pub name: String,
    /// Container format of the source.
    pub format: MeshFormat,
    /// Triangle points, three per facet.
    pub points: Vec<Point3>,
    /// Raw file contents, kept for 3MF rewriting.
    pub source: Vec<u8>,
}

impl LoadedMesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.points.len() / 3
    }
}

/// Parse mesh bytes in a known format.
pub fn parse_mesh(name: &str, format: MeshFormat, source: Vec<u8>) -> Result<LoadedMesh> {
    let points = match format {
        MeshFormat::Stl => parse_stl(&source)?,
        MeshFormat::ThreeMf => parse_3mf(&source)?,
    };
    debug!(name, triangles = points.len() / 3, ?format, "mesh loaded");
    Ok(LoadedMesh {
        name: name.to_string(),
        format,
        points,
        source,
    })
}

/// Load a mesh, choosing the parser from the file extension.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<LoadedMesh> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;
    let source = std::fs::read(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    parse_mesh(&name, format, source)
}

/// Default output path: `<stem>_tweaked.<ext>` next to the input.
pub fn default_output_path(input: &Path, format: MeshFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    input.with_file_name(format!("{stem}_tweaked.{}", format.extension()))
}

/// How to write the reoriented mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteOptions {
    /// Write STL output in the binary encoding.
    pub binary: bool,
    /// Unprintability above which support structures are suggested.
    pub support_threshold: f64,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            binary: false,
            support_threshold: 8.0,
        }
    }
}

/// Serialize the mesh reoriented by `orientation` in its source format.
pub fn write_output(
    loaded: &LoadedMesh,
    orientation: &Orientation,
    options: &WriteOptions,
) -> Result<Vec<u8>> {
    let support = orientation.needs_support(options.support_threshold);
    let rotation = &orientation.rotation;
    let bytes = match loaded.format {
        MeshFormat::Stl if options.binary => write_binary_stl(&loaded.points, rotation),
        MeshFormat::Stl => {
            let mut text = write_ascii_stl(&loaded.name, &loaded.points, rotation);
            if support {
                text.push_str(SUPPORT_ANNOTATION);
            }
            text.into_bytes()
        }
        MeshFormat::ThreeMf => rewrite_3mf(&loaded.source, rotation, support)?,
    };
    debug!(bytes = bytes.len(), support, "mesh written");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweaker::{Rotation, Vec3};

    const TRIANGLE: &str = "solid t
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 4 0 0
vertex 0 4 0
endloop
endfacet
endsolid t
";

    fn orientation(unprintability: f64) -> Orientation {
        Orientation {
            rotation: Rotation::identity(),
            unprintability,
            direction: Vec3::z(),
            default_accepted: true,
            evaluated: Vec::new(),
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            MeshFormat::from_path(Path::new("a/part.STL")).unwrap(),
            MeshFormat::Stl
        );
        assert_eq!(
            MeshFormat::from_path(Path::new("part.3mf")).unwrap(),
            MeshFormat::ThreeMf
        );
        assert!(matches!(
            MeshFormat::from_path(Path::new("part.obj")),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(MeshFormat::from_path(Path::new("part")).is_err());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("dir/part.stl"), MeshFormat::Stl),
            PathBuf::from("dir/part_tweaked.stl")
        );
    }

    #[test]
    fn test_support_annotation() {
        let loaded = parse_mesh("t", MeshFormat::Stl, TRIANGLE.as_bytes().to_vec()).unwrap();
        assert_eq!(loaded.triangle_count(), 1);

        let options = WriteOptions::default();
        let plain = write_output(&loaded, &orientation(1.0), &options).unwrap();
        assert!(String::from_utf8(plain).unwrap().ends_with("endsolid t"));

        let flagged = write_output(&loaded, &orientation(12.0), &options).unwrap();
        assert!(String::from_utf8(flagged)
            .unwrap()
            .ends_with("endsolid t {supportstructure: yes}"));
    }

    #[test]
    fn test_binary_option() {
        let loaded = parse_mesh("t", MeshFormat::Stl, TRIANGLE.as_bytes().to_vec()).unwrap();
        let options = WriteOptions {
            binary: true,
            ..Default::default()
        };
        let bytes = write_output(&loaded, &orientation(1.0), &options).unwrap();
        assert_eq!(bytes.len(), 84 + 50);
        assert_eq!(parse_stl(&bytes).unwrap(), loaded.points);
    }
}
