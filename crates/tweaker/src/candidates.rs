//! Candidate orientation generation.
//!
//! Two independent heuristics propose "down" directions worth scoring:
//!
//! - **Area cumulation** sums facet area per quantized normal, so large flat
//!   faces become candidates.
//! - **Random sampling** crosses a facet edge with a random mesh vertex. Planes
//!   through many vertices, such as sharp edges or coplanar vertex clusters,
//!   gather hits and surface as candidates even when no single large face
//!   lies on them.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use tweaker_math::{DirectionKey, Point3, Vec3};

use crate::facet::Facet;
use crate::TweakSettings;

/// A proposed contact direction with its heuristic weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Unit "down" direction, rounded to the quantization precision.
    pub direction: Vec3,
    /// Cumulative area or sample frequency.
    pub weight: f64,
}

impl Candidate {
    fn from_key(key: &DirectionKey, weight: f64) -> Self {
        Self {
            direction: key.to_vector(),
            weight,
        }
    }
}

/// Sort accumulated weights descending and keep the first `best_n`.
///
/// Ties are broken by key so the output does not depend on hash order.
fn top_n(weights: HashMap<DirectionKey, f64>, best_n: usize) -> Vec<Candidate> {
    let mut sorted: Vec<(DirectionKey, f64)> = weights.into_iter().collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
        .iter()
        .take(best_n)
        .map(|(key, weight)| Candidate::from_key(key, *weight))
        .collect()
}

/// Accumulate facet area per quantized normal direction.
///
/// Facets already facing `default_down` and facets with area at or below
/// `min_facet_area` are ignored. Returns the `area_best_n` heaviest
/// directions.
pub fn area_cumulation(
    facets: &[Facet],
    default_down: &Vec3,
    settings: &TweakSettings,
) -> Vec<Candidate> {
    let precision = settings.precision;
    let skip = DirectionKey::from_vector(default_down, precision);
    let mut areas: HashMap<DirectionKey, f64> = HashMap::new();

    for facet in facets {
        let Some(key) = DirectionKey::from_vector(&facet.normal, precision) else {
            continue;
        };
        if Some(key) == skip {
            continue;
        }
        let area = facet.area();
        if area > settings.min_facet_area {
            *areas.entry(key).or_insert(0.0) += area;
        }
    }

    debug!(clusters = areas.len(), "area cumulation");
    top_n(areas, settings.area_best_n)
}

/// Build the RNG for [`random_sampling`] from the configured seed.
pub fn sampling_rng(settings: &TweakSettings) -> StdRng {
    match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Sample planes spanned by a facet edge and a random mesh vertex.
///
/// Each facet contributes all three edges, or only its first edge once the
/// mesh reaches `large_mesh_points` points. Every edge gets
/// `samples_per_edge` trials, and the total is capped at `max_samples` by
/// striding over facets. Directions hit fewer than twice are dropped as
/// noise.
pub fn random_sampling<R: Rng>(
    facets: &[Facet],
    settings: &TweakSettings,
    rng: &mut R,
) -> Vec<Candidate> {
    if facets.is_empty() || settings.sampling_best_n == 0 {
        return Vec::new();
    }

    let point_count = facets.len() * 3;
    let edges_per_facet = if point_count < settings.large_mesh_points {
        3
    } else {
        1
    };
    let trials_per_facet = edges_per_facet * settings.samples_per_edge.max(1);
    let wanted = facets.len() * trials_per_facet;
    let stride = wanted.div_ceil(settings.max_samples.max(1)).max(1);

    let vertex = |i: usize| -> Point3 { facets[i / 3].vertices[i % 3] };

    let mut hits: HashMap<DirectionKey, u32> = HashMap::new();
    let mut trials = 0usize;
    for facet in facets.iter().step_by(stride) {
        for (a, b) in facet.edges().into_iter().take(edges_per_facet) {
            for _ in 0..settings.samples_per_edge {
                trials += 1;
                let r = vertex(rng.gen_range(0..point_count));
                let n = (a - r).cross(&(b - r));
                if let Some(key) = DirectionKey::from_vector(&n, settings.precision) {
                    *hits.entry(key).or_insert(0) += 1;
                }
            }
        }
    }

    let frequent: HashMap<DirectionKey, f64> = hits
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(key, count)| (key, count as f64))
        .collect();

    debug!(trials, stride, directions = frequent.len(), "random sampling");
    top_n(frequent, settings.sampling_best_n)
}

/// Run the candidate heuristics and concatenate their results.
///
/// Area cumulation always runs. Random sampling joins it when `use_both` is
/// set, in parallel when `settings.parallel` is true. The output is always
/// area candidates followed by sampled ones, whichever way they ran.
pub fn generate_candidates(
    facets: &[Facet],
    settings: &TweakSettings,
    use_both: bool,
) -> Vec<Candidate> {
    let down = Vec3::from(tweaker_math::DOWN);

    if !use_both {
        return area_cumulation(facets, &down, settings);
    }

    let mut rng = sampling_rng(settings);
    let (mut area, sampled) = if settings.parallel {
        rayon::join(
            || area_cumulation(facets, &down, settings),
            move || random_sampling(facets, settings, &mut rng),
        )
    } else {
        (
            area_cumulation(facets, &down, settings),
            random_sampling(facets, settings, &mut rng),
        )
    };

    area.extend(sampled);
    area
}
