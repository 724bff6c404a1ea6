//! Scoring of candidate orientations and best-orientation selection.

use tracing::debug;
use tweaker_math::Vec3;

use crate::contact::contact_height;
use crate::facet::Facet;
use crate::lithograph::{lithograph, Lithograph};
use crate::TweakSettings;

/// Score of one evaluated orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    /// Up-vector the mesh was evaluated with.
    pub direction: Vec3,
    /// Area resting on the bed (≥ 1).
    pub touching_area: f64,
    /// Area needing support (≥ 1).
    pub overhang_area: f64,
    /// Length of thin-edge contact with the bed (≥ 0).
    pub touching_line: f64,
    /// Target function value; lower is better.
    pub unprintability: f64,
}

/// `overhang / abs_limit + overhang / (touching + line_factor · line) / rel_limit`.
///
/// The line term is dropped when the touching-line refinement is off.
pub fn target_function(lit: &Lithograph, settings: &TweakSettings) -> f64 {
    let base = if settings.touching_line {
        lit.touching_area + settings.line_factor * lit.touching_line
    } else {
        lit.touching_area
    };
    lit.overhang_area / settings.abs_limit + lit.overhang_area / base / settings.rel_limit
}

/// Score the mesh placed with `up` as its build direction.
pub fn score_direction(facets: &[Facet], up: &Vec3, settings: &TweakSettings) -> ScoreResult {
    let amin = contact_height(facets, &-up);
    let lit = lithograph(facets, up, amin, settings);
    let unprintability = target_function(&lit, settings);
    debug!(
        direction = ?[up.x, up.y, up.z],
        touching = lit.touching_area,
        overhang = lit.overhang_area,
        line = lit.touching_line,
        unprintability,
        "scored orientation"
    );
    ScoreResult {
        direction: *up,
        touching_area: lit.touching_area,
        overhang_area: lit.overhang_area,
        touching_line: lit.touching_line,
        unprintability,
    }
}

/// Running minimum over scored orientations with hysteresis.
///
/// A later score replaces the current best only when it is lower by more
/// than `hysteresis`, so near-ties keep the earliest orientation.
#[derive(Debug, Clone)]
pub struct Selector {
    hysteresis: f64,
    best: Option<ScoreResult>,
}

impl Selector {
    /// Create an empty selector.
    pub fn new(hysteresis: f64) -> Self {
        Self {
            hysteresis,
            best: None,
        }
    }

    /// Offer a score. Returns true if it became the new best.
    pub fn offer(&mut self, score: ScoreResult) -> bool {
        let replace = match &self.best {
            None => true,
            Some(best) => score.unprintability < best.unprintability - self.hysteresis,
        };
        if replace {
            self.best = Some(score);
        }
        replace
    }

    /// Fold an iterator of scores into the selector.
    pub fn offer_all(mut self, scores: impl IntoIterator<Item = ScoreResult>) -> Self {
        for score in scores {
            self.offer(score);
        }
        self
    }

    /// The best score so far.
    pub fn best(&self) -> Option<&ScoreResult> {
        self.best.as_ref()
    }

    /// Consume the selector, returning the best score.
    pub fn into_best(self) -> Option<ScoreResult> {
        self.best
    }
}
