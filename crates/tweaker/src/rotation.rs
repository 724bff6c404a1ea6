//! Rotation derivation for the chosen orientation.

use std::f64::consts::PI;

use tweaker_math::{rotation_matrix, Dir3, Mat3, Point3, Tolerance, Vec3, DOWN, UP};

/// Axis/angle pair and matrix that bring the chosen up-vector onto +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Unit rotation axis; `[1, 0, 0]` in the degenerate cases.
    pub axis: Vec3,
    /// Rotation angle in radians, in `[0, π]`.
    pub angle: f64,
    /// Rodrigues matrix for `(axis, angle)`.
    ///
    /// Vertices are rotated as row vectors, `p' = p · R`, which is `Rᵀ · p`
    /// in column form.
    pub matrix: Mat3,
}

impl Rotation {
    /// The identity rotation.
    pub fn identity() -> Self {
        Self::from_axis_angle(Vec3::x(), 0.0)
    }

    fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let matrix = rotation_matrix(&Dir3::new_unchecked(axis), angle);
        Self {
            axis,
            angle,
            matrix,
        }
    }

    /// Build the rotation that turns `best` (the outward direction that
    /// becomes the new "up") onto `[0, 0, 1]`.
    pub fn from_up_direction(best: &Vec3) -> Self {
        let tol = Tolerance::DEFAULT;
        let down = Vec3::from(DOWN);
        if tol.directions_equal(best, &down) {
            return Self::from_axis_angle(Vec3::x(), PI);
        }
        if tol.directions_equal(best, &Vec3::from(UP)) {
            return Self::identity();
        }

        let cross = best.cross(&down);
        let norm = cross.norm();
        if tol.is_zero(norm) {
            // Parallel to Z but not caught above (not unit length)
            return if best.z < 0.0 {
                Self::from_axis_angle(Vec3::x(), PI)
            } else {
                Self::identity()
            };
        }

        let cos = (-best.z / best.norm()).clamp(-1.0, 1.0);
        let angle = PI - cos.acos();
        Self::from_axis_angle(cross / norm, angle)
    }

    /// Rotate a point the way the mesh writer does.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.matrix.transpose() * p.coords)
    }

    /// Rotate a direction the way the mesh writer does.
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.matrix.transpose() * v
    }

    /// Whether this rotation leaves the mesh unchanged.
    pub fn is_identity(&self) -> bool {
        self.angle.abs() < Tolerance::DEFAULT.angular
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_up_is_identity() {
        let r = Rotation::from_up_direction(&Vec3::z());
        assert_eq!(r.angle, 0.0);
        assert_eq!(r.axis, Vec3::x());
        assert_relative_eq!(r.matrix, Mat3::identity(), epsilon = 1e-12);
        assert!(r.is_identity());
        assert_relative_eq!(r.apply_vec(&Vec3::z()), Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_down_is_half_turn() {
        let r = Rotation::from_up_direction(&Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(r.angle, PI);
        assert_eq!(r.axis, Vec3::x());
        assert_relative_eq!(
            r.apply_vec(&Vec3::new(0.0, 0.0, -1.0)),
            Vec3::z(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_side_direction() {
        let r = Rotation::from_up_direction(&Vec3::x());
        assert_relative_eq!(r.angle, PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(r.axis, Vec3::y(), epsilon = 1e-12);
        assert_relative_eq!(r.apply_vec(&Vec3::x()), Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_general_direction_lands_on_z() {
        for d in [
            Vec3::new(0.0, -0.642787, -0.766045),
            Vec3::new(0.3, 0.4, 0.866),
            Vec3::new(-0.7, 0.1, -0.2),
            Vec3::new(0.0, 1.0, 1e-7),
        ] {
            let d = d.normalize();
            let r = Rotation::from_up_direction(&d);
            assert!(r.angle >= 0.0 && r.angle <= PI);
            assert_relative_eq!(r.axis.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(r.apply_vec(&d), Vec3::z(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_near_parallel_falls_back() {
        let r = Rotation::from_up_direction(&Vec3::new(1e-14, 0.0, -1.0));
        assert_relative_eq!(r.angle, PI);
        assert_eq!(r.axis, Vec3::x());
    }

    #[test]
    fn test_apply_point_preserves_length() {
        let r = Rotation::from_up_direction(&Vec3::new(0.2, -0.5, 0.3).normalize());
        let p = Point3::new(3.0, -4.0, 12.0);
        assert_relative_eq!(r.apply_point(&p).coords.norm(), 13.0, epsilon = 1e-9);
    }
}
