//! Result reporting.

use std::time::Duration;

use serde::Serialize;
use tweaker::Orientation;

/// Search outcome as printed by `--result` and `--json`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub input: String,
    pub triangles: usize,
    /// Up-vector of the chosen orientation in input coordinates.
    pub direction: [f64; 3],
    pub axis: [f64; 3],
    pub angle: f64,
    /// Row-vector rotation matrix: `p' = p · matrix`.
    pub matrix: [[f64; 3]; 3],
    pub unprintability: f64,
    pub support_suggested: bool,
    pub default_accepted: bool,
    pub evaluated: usize,
    pub elapsed_ms: u64,
}

impl Report {
    pub fn new(
        input: String,
        triangles: usize,
        orientation: &Orientation,
        support_threshold: f64,
        elapsed: Duration,
    ) -> Self {
        let r = &orientation.rotation;
        let m = &r.matrix;
        Self {
            input,
            triangles,
            direction: [
                orientation.direction.x,
                orientation.direction.y,
                orientation.direction.z,
            ],
            axis: [r.axis.x, r.axis.y, r.axis.z],
            angle: r.angle,
            matrix: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
            unprintability: orientation.unprintability,
            support_suggested: orientation.needs_support(support_threshold),
            default_accepted: orientation.default_accepted,
            evaluated: orientation.evaluated.len(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn to_text(&self) -> String {
        let d = self.direction;
        let a = self.axis;
        let mut lines = vec![
            format!("Result for {} ({} triangles)", self.input, self.triangles),
            format!("  Up direction:   [{:.6}, {:.6}, {:.6}]", d[0], d[1], d[2]),
            format!(
                "  Axis, angle:    [{:.6}, {:.6}, {:.6}], {:.6} rad",
                a[0], a[1], a[2], self.angle
            ),
            "  Rotation matrix:".to_string(),
        ];
        for row in &self.matrix {
            lines.push(format!(
                "    {:>10.6} {:>10.6} {:>10.6}",
                row[0], row[1], row[2]
            ));
        }
        lines.push(format!("  Unprintability: {:.4}", self.unprintability));
        lines.push(format!(
            "  Support:        {}",
            if self.support_suggested {
                "suggested"
            } else {
                "not needed"
            }
        ));
        lines.push(format!(
            "  Evaluated {} orientation(s) in {} ms",
            self.evaluated, self.elapsed_ms
        ));
        lines.join("\n")
    }
}
