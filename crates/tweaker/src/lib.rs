#![warn(missing_docs)]

//! Print-orientation search for triangle meshes.
//!
//! Given a triangle soup, this crate finds the rotation that minimizes an
//! estimated "unprintability": the ratio of overhanging, unsupported surface
//! to surface resting on the print bed. The result is an axis/angle pair and
//! the matching rotation matrix.
//!
//! # Example
//!
//! ```ignore
//! use tweaker::{tweak, TweakSettings};
//!
//! let points: Vec<Point3> = // ... three points per triangle
//! let orientation = tweak(&points, &TweakSettings::default())?;
//!
//! println!("axis {:?}, angle {:.3}", orientation.rotation.axis, orientation.rotation.angle);
//! println!("unprintability {:.2}", orientation.unprintability);
//! ```

pub mod candidates;
pub mod contact;
pub mod dedup;
pub mod error;
pub mod facet;
pub mod lithograph;
pub mod rotation;
pub mod select;

pub use candidates::{area_cumulation, generate_candidates, random_sampling, Candidate};
pub use contact::contact_height;
pub use dedup::remove_duplicates;
pub use error::{Result, TweakError};
pub use facet::{build_facets, Facet};
pub use lithograph::{lithograph, Lithograph};
pub use rotation::Rotation;
pub use select::{score_direction, target_function, ScoreResult, Selector};
pub use tweaker_math::{Point3, Vec3};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Search parameters.
///
/// Every field has a default, so a TOML file may set any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweakSettings {
    /// Overhang threshold (degrees from horizontal). At 90 nothing overhangs.
    pub critical_angle: f64,
    /// Height band above the contact plane that still counts as touching.
    pub height_tolerance: f64,
    /// Facets at or below this area are ignored by the lithograph. A mesh
    /// with no larger facet is rejected as degenerate.
    pub lithograph_min_area: f64,
    /// Facets at or below this area are ignored by area cumulation.
    pub min_facet_area: f64,
    /// Absolute overhang scale of the target function.
    pub abs_limit: f64,
    /// Relative overhang scale of the target function.
    pub rel_limit: f64,
    /// Weight of the touching line next to the touching area.
    pub line_factor: f64,
    /// Credit contact along thin edges.
    pub touching_line: bool,
    /// A new best must beat the current one by more than this.
    pub hysteresis: f64,
    /// Default orientation is kept without searching below this score.
    pub acceptance_threshold: f64,
    /// Decimal digits kept in direction keys.
    pub precision: u32,
    /// Candidates closer than this are merged.
    pub duplicate_distance: f64,
    /// Directions kept from area cumulation.
    pub area_best_n: usize,
    /// Directions kept from random sampling.
    pub sampling_best_n: usize,
    /// Random vertices tried per facet edge.
    pub samples_per_edge: usize,
    /// From this many points on, only one edge per facet is sampled.
    pub large_mesh_points: usize,
    /// Upper bound on sampling trials.
    pub max_samples: usize,
    /// Run random sampling next to area cumulation.
    pub use_both_heuristics: bool,
    /// Run the two heuristics in parallel.
    pub parallel: bool,
    /// Seed for random sampling; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for TweakSettings {
    fn default() -> Self {
        Self {
            critical_angle: 45.0,
            height_tolerance: 0.15,
            lithograph_min_area: 1.0,
            min_facet_area: 0.5,
            abs_limit: 100.0,
            rel_limit: 1.0,
            line_factor: 0.5,
            touching_line: true,
            hysteresis: 0.05,
            acceptance_threshold: 1.0,
            precision: 6,
            duplicate_distance: 0.001,
            area_best_n: 6,
            sampling_best_n: 12,
            samples_per_edge: 5,
            large_mesh_points: 40_000,
            max_samples: 2_000_000,
            use_both_heuristics: true,
            parallel: true,
            seed: None,
        }
    }
}

impl TweakSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.critical_angle > 0.0 && self.critical_angle <= 90.0) {
            return Err(TweakError::InvalidSettings(
                "critical_angle must be in (0, 90] degrees".into(),
            ));
        }
        if self.abs_limit <= 0.0 || self.rel_limit <= 0.0 {
            return Err(TweakError::InvalidSettings(
                "abs_limit and rel_limit must be positive".into(),
            ));
        }
        if self.height_tolerance < 0.0
            || self.lithograph_min_area < 0.0
            || self.min_facet_area < 0.0
            || self.line_factor < 0.0
        {
            return Err(TweakError::InvalidSettings(
                "tolerances and area cutoffs must not be negative".into(),
            ));
        }
        if self.hysteresis < 0.0 {
            return Err(TweakError::InvalidSettings(
                "hysteresis must not be negative".into(),
            ));
        }
        if self.duplicate_distance <= 0.0 {
            return Err(TweakError::InvalidSettings(
                "duplicate_distance must be positive".into(),
            ));
        }
        if self.area_best_n == 0 || self.samples_per_edge == 0 {
            return Err(TweakError::InvalidSettings(
                "area_best_n and samples_per_edge must be at least 1".into(),
            ));
        }
        if self.precision > 9 {
            return Err(TweakError::InvalidSettings(
                "precision must be at most 9 digits".into(),
            ));
        }
        Ok(())
    }

    /// Parse settings from TOML. Missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Parse TOML over these settings. Fields the text sets replace ours,
    /// the rest are kept.
    pub fn with_toml_str(&self, s: &str) -> Result<Self> {
        let invalid = |e: &dyn std::fmt::Display| TweakError::InvalidSettings(e.to_string());
        let file: toml::Table = toml::from_str(s).map_err(|e| invalid(&e))?;
        let mut merged = match toml::Value::try_from(self).map_err(|e| invalid(&e))? {
            toml::Value::Table(table) => table,
            other => return Err(invalid(&format!("expected a table, got {}", other.type_str()))),
        };
        merged.extend(file);
        toml::Value::Table(merged).try_into().map_err(|e| invalid(&e))
    }

    /// Settings for the same mesh scaled by `factor`.
    ///
    /// Length tolerances scale linearly and area cutoffs quadratically, so
    /// the chosen orientation does not change with the model's units.
    pub fn scaled(&self, factor: f64) -> Self {
        let area = factor * factor;
        Self {
            height_tolerance: self.height_tolerance * factor,
            line_factor: self.line_factor * factor,
            lithograph_min_area: self.lithograph_min_area * area,
            min_facet_area: self.min_facet_area * area,
            abs_limit: self.abs_limit * area,
            ..self.clone()
        }
    }
}

/// Result of the orientation search.
#[derive(Debug, Clone)]
pub struct Orientation {
    /// Rotation bringing `direction` onto +Z.
    pub rotation: Rotation,
    /// Best target function value, never below 1.
    pub unprintability: f64,
    /// Up-vector of the chosen orientation in the input frame.
    pub direction: Vec3,
    /// The default orientation scored well enough to skip the search.
    pub default_accepted: bool,
    /// Every scored orientation, default first.
    pub evaluated: Vec<ScoreResult>,
}

impl Orientation {
    /// Whether the result suggests adding support structures.
    pub fn needs_support(&self, threshold: f64) -> bool {
        self.unprintability > threshold
    }
}

/// Round an up-vector to the key precision, normalized.
fn rounded_up(direction: &Vec3, precision: u32) -> Vec3 {
    let up = tweaker_math::DirectionKey::from_unit(&-direction, precision).to_vector();
    up.try_normalize(0.0).unwrap_or(up)
}

/// Find the best print orientation for a triangle soup.
///
/// This is the main entry point. It:
/// 1. Groups points into facets
/// 2. Scores the default orientation and returns early if it is good enough
/// 3. Generates and deduplicates candidate directions
/// 4. Scores each candidate and keeps the best with hysteresis
/// 5. Derives the rotation for the winner
pub fn tweak(points: &[Point3], settings: &TweakSettings) -> Result<Orientation> {
    settings.validate()?;
    let started = Instant::now();

    let facets = build_facets(points)?;
    facet::ensure_non_degenerate(&facets, settings.lithograph_min_area)?;

    let up = Vec3::z();
    let default = score_direction(&facets, &up, settings);

    if default.unprintability < settings.acceptance_threshold {
        info!(
            facets = facets.len(),
            unprintability = default.unprintability,
            "default orientation accepted"
        );
        return Ok(Orientation {
            rotation: Rotation::identity(),
            unprintability: 1.0,
            direction: up,
            default_accepted: true,
            evaluated: vec![default],
        });
    }

    let candidates = generate_candidates(&facets, settings, settings.use_both_heuristics);
    let found = candidates.len();
    let candidates = remove_duplicates(candidates, settings.duplicate_distance);
    debug!(
        found,
        unique = candidates.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "candidates generated"
    );

    let mut evaluated = Vec::with_capacity(candidates.len() + 1);
    evaluated.push(default);
    evaluated.extend(
        candidates
            .iter()
            .map(|c| score_direction(&facets, &rounded_up(&c.direction, settings.precision), settings)),
    );

    let best = Selector::new(settings.hysteresis)
        .offer_all(evaluated.iter().copied())
        .into_best()
        .unwrap_or(default);

    let unprintability = best.unprintability.max(1.0);
    info!(
        facets = facets.len(),
        evaluated = evaluated.len(),
        direction = ?[best.direction.x, best.direction.y, best.direction.z],
        unprintability,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "orientation found"
    );

    Ok(Orientation {
        rotation: Rotation::from_up_direction(&best.direction),
        unprintability,
        direction: best.direction,
        default_accepted: false,
        evaluated,
    })
}

/// Find the best orientation with default settings, a critical angle in
/// degrees and an optional second heuristic.
pub fn compute_orientation(
    points: &[Point3],
    critical_angle: f64,
    use_both_heuristics: bool,
) -> Result<Orientation> {
    let settings = TweakSettings {
        critical_angle,
        use_both_heuristics,
        ..Default::default()
    };
    tweak(points, &settings)
}

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
pub(crate) mod fixtures;

#[cfg(test)]
pub(crate) mod test_meshes {
    //! Facet views of the shared fixtures for the unit tests.

    use super::*;

    fn facets(points: &[Point3]) -> Vec<Facet> {
        points
            .chunks_exact(3)
            .map(|t| Facet::new(t[0], t[1], t[2]))
            .collect()
    }

    /// Cube with one corner at the origin.
    pub fn cube(size: f64) -> Vec<Facet> {
        facets(&crate::fixtures::cube(size))
    }

    /// A 2x2x10 stem under a 20x20x2 cap: stable upside down only.
    pub fn mushroom() -> Vec<Facet> {
        facets(&crate::fixtures::mushroom())
    }

    /// One triangle at `origin` whose normal points along `direction` and
    /// whose area is `area`.
    pub fn oriented_patch(origin: Point3, direction: Vec3, area: f64) -> Vec<Facet> {
        let n = direction.normalize();
        let helper = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let u = n.cross(&helper).normalize();
        let w = n.cross(&u);
        let s = (2.0 * area).sqrt();
        vec![Facet::new(origin, origin + u * s, origin + w * s)]
    }
}
