//! Mesh fixtures shared by the unit and integration tests.

#![allow(dead_code)]

use tweaker_math::Point3;

/// Axis-aligned box as a triangle soup with outward winding.
pub fn cuboid(min: [f64; 3], max: [f64; 3]) -> Vec<Point3> {
    let c = |i: usize| {
        Point3::new(
            if i & 1 == 0 { min[0] } else { max[0] },
            if i & 2 == 0 { min[1] } else { max[1] },
            if i & 4 == 0 { min[2] } else { max[2] },
        )
    };
    // Corner index bits: x=1, y=2, z=4
    let corners = [c(0), c(1), c(3), c(2), c(4), c(5), c(7), c(6)];
    let indices = [
        0, 2, 1, 0, 3, 2, //
        4, 5, 6, 4, 6, 7, //
        0, 1, 5, 0, 5, 4, //
        2, 3, 7, 2, 7, 6, //
        0, 4, 7, 0, 7, 3, //
        1, 2, 6, 1, 6, 5,
    ];
    indices.iter().map(|&i| corners[i]).collect()
}

/// Cube with one corner at the origin.
pub fn cube(size: f64) -> Vec<Point3> {
    cuboid([0.0; 3], [size; 3])
}

/// A 2x2x10 stem under a 20x20x2 cap: stable upside down only.
pub fn mushroom() -> Vec<Point3> {
    let mut points = cuboid([-1.0, -1.0, 0.0], [1.0, 1.0, 10.0]);
    points.extend(cuboid([-10.0, -10.0, 10.0], [10.0, 10.0, 12.0]));
    points
}

/// An L-shaped bracket standing on the end of its long arm.
pub fn bracket() -> Vec<Point3> {
    let mut points = cuboid([0.0, 0.0, 0.0], [4.0, 30.0, 40.0]);
    points.extend(cuboid([4.0, 0.0, 36.0], [30.0, 30.0, 40.0]));
    points
}
