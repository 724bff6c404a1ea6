//! Facet construction from a flat triangle-vertex stream.

use tweaker_math::{Point3, Vec3};

use crate::error::{Result, TweakError};

/// One triangle of the mesh with its area-weighted normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    /// `(v1 - v0) × (v2 - v0)`. Its norm is twice the triangle area.
    pub normal: Vec3,
    /// Triangle corners in input order.
    pub vertices: [Point3; 3],
}

impl Facet {
    /// Build a facet from three corners, computing its normal.
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        let normal = (v1 - v0).cross(&(v2 - v0));
        Self {
            normal,
            vertices: [v0, v1, v2],
        }
    }

    /// Triangle area.
    pub fn area(&self) -> f64 {
        self.normal.norm() / 2.0
    }

    /// Normalized outward normal, or `None` for a zero-area facet.
    pub fn unit_normal(&self) -> Option<Vec3> {
        let norm = self.normal.norm();
        if norm > 0.0 && norm.is_finite() {
            Some(self.normal / norm)
        } else {
            None
        }
    }

    /// Lowest projection of any corner onto `dir` (assumed unit length).
    pub fn min_projection(&self, dir: &Vec3) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.coords.dot(dir))
            .fold(f64::INFINITY, f64::min)
    }

    /// The three edges as corner pairs: (v0,v1), (v1,v2), (v2,v0).
    pub fn edges(&self) -> [(Point3, Point3); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Group a flat point stream into facets, one per consecutive triple.
///
/// Fails when the stream is empty or its length is not a multiple of 3.
pub fn build_facets(points: &[Point3]) -> Result<Vec<Facet>> {
    if points.is_empty() {
        return Err(TweakError::InvalidMesh("mesh has no points".into()));
    }
    if points.len() % 3 != 0 {
        return Err(TweakError::InvalidMesh(format!(
            "point count {} is not a multiple of 3",
            points.len()
        )));
    }

    Ok(points
        .chunks_exact(3)
        .map(|tri| Facet::new(tri[0], tri[1], tri[2]))
        .collect())
}

/// Fail if every facet is at or below `min_area`, the smallest area the
/// lithograph scores.
pub fn ensure_non_degenerate(facets: &[Facet], min_area: f64) -> Result<()> {
    if facets.iter().any(|f| f.area() > min_area) {
        Ok(())
    } else {
        Err(TweakError::DegenerateGeometry(format!(
            "all {} facets have area <= {min_area} (lithograph_min_area); \
             use TweakSettings::scaled for models in small units",
            facets.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_single_facet() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        let facets = build_facets(&points).unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].normal, Vec3::new(0.0, 0.0, 6.0));
        assert_relative_eq!(facets[0].area(), 3.0);
        assert_eq!(facets[0].unit_normal(), Some(Vec3::z()));
    }

    #[test]
    fn test_reject_empty() {
        assert!(matches!(build_facets(&[]), Err(TweakError::InvalidMesh(_))));
    }

    #[test]
    fn test_reject_partial_triangle() {
        let points = vec![Point3::origin(); 4];
        assert!(matches!(
            build_facets(&points),
            Err(TweakError::InvalidMesh(_))
        ));
    }

    #[test]
    fn test_degenerate_mesh() {
        // Collinear points
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let facets = build_facets(&points).unwrap();
        assert!(facets[0].unit_normal().is_none());
        assert!(matches!(
            ensure_non_degenerate(&facets, 1.0),
            Err(TweakError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_area_cutoff() {
        // Area 1.0 sits on the cutoff, 1.5 is above it
        let small = Facet::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert!(ensure_non_degenerate(&[small], 1.0).is_err());
        let large = Facet::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert!(ensure_non_degenerate(&[small, large], 1.0).is_ok());
    }

    #[test]
    fn test_min_projection() {
        let f = Facet::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, -2.0),
            Point3::new(0.0, 1.0, 3.0),
        );
        assert_relative_eq!(f.min_projection(&Vec3::z()), -2.0);
        assert_relative_eq!(f.min_projection(&-Vec3::z()), -3.0);
    }
}
