#![warn(missing_docs)]

//! Math types for the tweaker orientation search.
//!
//! Thin wrappers around nalgebra providing the handful of domain types the
//! search needs: points, vectors, rotation matrices, integer-quantized
//! direction keys, and tolerance constants.

use nalgebra::{Matrix3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 3x3 rotation matrix.
pub type Mat3 = Matrix3<f64>;

/// The print-bed "up" axis.
pub const UP: [f64; 3] = [0.0, 0.0, 1.0];

/// The print-bed "down" axis, the default contact direction.
pub const DOWN: [f64; 3] = [0.0, 0.0, -1.0];

/// Rotation about an arbitrary axis through the origin by `angle` radians.
///
/// Uses Rodrigues' rotation formula. The result acts on column vectors
/// (`R * v`); callers that rotate row vectors use the transpose.
pub fn rotation_matrix(axis: &Dir3, angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let (x, y, z) = (axis.as_ref().x, axis.as_ref().y, axis.as_ref().z);
    Mat3::new(
        t * x * x + c,
        t * x * y - s * z,
        t * x * z + s * y,
        t * x * y + s * z,
        t * y * y + c,
        t * y * z - s * x,
        t * x * z - s * y,
        t * y * z + s * x,
        t * z * z + c,
    )
}

/// Round each component to `precision` decimal digits and return the
/// integer-scaled values.
///
/// `-0.0` and `0.0` map to the same integer, so keys built from these
/// values compare equal across platforms.
pub fn quantize(v: &Vec3, precision: u32) -> [i64; 3] {
    let scale = 10f64.powi(precision as i32);
    [
        (v.x * scale).round() as i64,
        (v.y * scale).round() as i64,
        (v.z * scale).round() as i64,
    ]
}

/// A direction rounded to a fixed number of decimal digits, stored as
/// integers so it can key a hash map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectionKey {
    components: [i64; 3],
    precision: u32,
}

impl DirectionKey {
    /// Normalize `v` and quantize it. Returns `None` for a zero-length vector.
    pub fn from_vector(v: &Vec3, precision: u32) -> Option<Self> {
        let norm = v.norm();
        if !norm.is_finite() || norm <= Tolerance::DEFAULT.linear {
            return None;
        }
        Some(Self::from_unit(&(v / norm), precision))
    }

    /// Quantize an already normalized vector.
    pub fn from_unit(v: &Vec3, precision: u32) -> Self {
        Self {
            components: quantize(v, precision),
            precision,
        }
    }

    /// The integer-scaled components.
    pub fn components(&self) -> [i64; 3] {
        self.components
    }

    /// The number of decimal digits kept.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// The rounded direction as a vector. Not renormalized.
    pub fn to_vector(&self) -> Vec3 {
        let scale = 10f64.powi(self.precision as i32);
        Vec3::new(
            self.components[0] as f64 / scale,
            self.components[1] as f64 / scale,
            self.components[2] as f64 / scale,
        )
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-12 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-12,
        angular: 1e-9,
    };

    /// Check if a scalar is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two unit directions coincide within the angular tolerance.
    pub fn directions_equal(&self, a: &Vec3, b: &Vec3) -> bool {
        (a - b).norm() < self.angular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
