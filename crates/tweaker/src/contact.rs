//! Contact-plane estimation.

use tweaker_math::Vec3;

use crate::facet::Facet;

/// Height of the plane that first touches the bed when the mesh is placed
/// with `down` pointing at it.
///
/// This is the minimum over all vertices of `v · (-down) / |down|`. For the
/// default `down = [0, 0, -1]` it is the lowest z coordinate.
pub fn contact_height(facets: &[Facet], down: &Vec3) -> f64 {
    let up = -down;
    let norm = up.norm();
    facets
        .iter()
        .flat_map(|f| f.vertices.iter())
        .map(|v| v.coords.dot(&up) / norm)
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tweaker_math::Point3;

    fn tilted() -> Vec<Facet> {
        vec![
            Facet::new(
                Point3::new(0.0, 0.0, 2.0),
                Point3::new(4.0, 0.0, 5.0),
                Point3::new(0.0, 4.0, 3.0),
            ),
            Facet::new(
                Point3::new(-1.0, 0.0, 7.0),
                Point3::new(4.0, 0.0, 5.0),
                Point3::new(0.0, 4.0, 3.0),
            ),
        ]
    }

    #[test]
    fn test_default_down_is_lowest_z() {
        let h = contact_height(&tilted(), &Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(h, 2.0);
    }

    #[test]
    fn test_unnormalized_direction() {
        // -x with a non-unit length: minimum of x coordinates
        let h = contact_height(&tilted(), &Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(h, -4.0);
        let h = contact_height(&tilted(), &Vec3::new(-3.0, 0.0, 0.0));
        assert_relative_eq!(h, -1.0);
    }
}
