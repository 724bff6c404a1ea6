//! Overhang and contact scoring for a trial orientation.
//!
//! For an "up" direction and the contact-plane height along it, facets that
//! face away from `up` more steeply than the critical angle are split into
//! area resting on the bed (touching) and area hanging above it (overhang).

use std::collections::HashSet;

use tweaker_math::{quantize, Point3, Vec3};

use crate::facet::Facet;
use crate::TweakSettings;

/// Digits kept when matching edge endpoints for the touching line.
const VERTEX_KEY_PRECISION: u32 = 6;

/// Area split for one orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lithograph {
    /// Area resting on the contact plane. Seeded at 1.0.
    pub touching_area: f64,
    /// Area facing down above the contact plane. Seeded at 1.0.
    pub overhang_area: f64,
    /// Length of edges lying on the contact plane that do not border a
    /// touching facet. Zero when the refinement is disabled.
    pub touching_line: f64,
}

impl Default for Lithograph {
    fn default() -> Self {
        Self {
            touching_area: 1.0,
            overhang_area: 1.0,
            touching_line: 0.0,
        }
    }
}

type EdgeKey = ([i64; 3], [i64; 3]);

fn edge_key(a: &Point3, b: &Point3) -> EdgeKey {
    let ka = quantize(&a.coords, VERTEX_KEY_PRECISION);
    let kb = quantize(&b.coords, VERTEX_KEY_PRECISION);
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Compute touching and overhang areas with `up` as the build direction and
/// `amin` as the contact-plane height along it.
pub fn lithograph(facets: &[Facet], up: &Vec3, amin: f64, settings: &TweakSettings) -> Lithograph {
    let mut result = Lithograph::default();
    let Some(up) = up.try_normalize(0.0) else {
        return result;
    };

    let alpha = -(90.0 - settings.critical_angle).to_radians().cos();
    let min_norm = 2.0 * settings.lithograph_min_area;
    let base = amin + settings.height_tolerance;
    let mut rim: HashSet<EdgeKey> = HashSet::new();

    for facet in facets {
        let norm = facet.normal.norm();
        if norm <= min_norm {
            continue;
        }

        let facing = facet.normal.dot(&up);
        let mut touches = false;
        if facing / norm < alpha {
            let area = facing.abs() / 2.0;
            if facet.min_projection(&up) > base {
                result.overhang_area += area;
            } else {
                result.touching_area += area;
                touches = true;
            }
        }

        if settings.touching_line && !touches {
            for (a, b) in facet.edges() {
                if a.coords.dot(&up) <= base
                    && b.coords.dot(&up) <= base
                    && rim.insert(edge_key(&a, &b))
                {
                    result.touching_line += (b - a).norm();
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::contact_height;
    use crate::test_meshes::{cube, mushroom};
    use approx::assert_relative_eq;

    fn settings(touching_line: bool) -> TweakSettings {
        TweakSettings {
            touching_line,
            ..Default::default()
        }
    }

    #[test]
    fn test_cube_on_bed() {
        let facets = cube(10.0);
        let up = Vec3::z();
        let amin = contact_height(&facets, &-up);
        let lit = lithograph(&facets, &up, amin, &settings(true));
        assert_relative_eq!(lit.touching_area, 101.0, epsilon = 1e-9);
        assert_relative_eq!(lit.overhang_area, 1.0);
        // Bottom rim of the four walls
        assert_relative_eq!(lit.touching_line, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_line_refinement_disabled() {
        let facets = cube(10.0);
        let lit = lithograph(&facets, &Vec3::z(), 0.0, &settings(false));
        assert_eq!(lit.touching_line, 0.0);
    }

    #[test]
    fn test_mushroom_overhang() {
        let facets = mushroom();
        let up = Vec3::z();
        let amin = contact_height(&facets, &-up);
        let lit = lithograph(&facets, &up, amin, &settings(false));
        // Stem foot touches, cap underside hangs
        assert_relative_eq!(lit.touching_area, 5.0, epsilon = 1e-9);
        assert_relative_eq!(lit.overhang_area, 401.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mushroom_flipped() {
        let facets = mushroom();
        let up = -Vec3::z();
        let amin = contact_height(&facets, &-up);
        let lit = lithograph(&facets, &up, amin, &settings(false));
        // Cap top rests on the bed, stem top face hangs 2 units above it
        assert_relative_eq!(lit.touching_area, 401.0, epsilon = 1e-9);
        assert_relative_eq!(lit.overhang_area, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_seeds_never_violated() {
        let facets = mushroom();
        for up in [
            Vec3::x(),
            -Vec3::x(),
            Vec3::y(),
            Vec3::new(0.3, -0.2, 0.9),
            Vec3::new(-0.5, 0.5, -0.7),
        ] {
            let amin = contact_height(&facets, &-up);
            let lit = lithograph(&facets, &up, amin, &settings(true));
            assert!(lit.touching_area >= 1.0);
            assert!(lit.overhang_area >= 1.0);
            assert!(lit.touching_line >= 0.0);
        }
    }

    #[test]
    fn test_small_facets_skipped() {
        // Cube with 1-unit sides: every triangle has area 0.5, below the cutoff
        let facets = cube(1.0);
        let lit = lithograph(&facets, &Vec3::z(), 0.0, &settings(true));
        assert_eq!(lit, Lithograph::default());
    }
}
