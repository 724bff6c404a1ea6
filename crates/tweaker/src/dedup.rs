//! Merging of near-identical candidate directions.

use crate::candidates::Candidate;

/// Drop candidates whose direction lies within `distance` of one already kept.
///
/// Arrival order decides which of two near-duplicates survives: the first one
/// wins.
pub fn remove_duplicates(candidates: Vec<Candidate>, distance: f64) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let duplicate = kept
            .iter()
            .any(|k| (k.direction - candidate.direction).norm() < distance);
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweaker_math::Vec3;

    fn candidate(x: f64, y: f64, z: f64, weight: f64) -> Candidate {
        Candidate {
            direction: Vec3::new(x, y, z),
            weight,
        }
    }

    #[test]
    fn test_first_wins() {
        let kept = remove_duplicates(
            vec![
                candidate(1.0, 0.0, 0.0, 10.0),
                candidate(0.0, 1.0, 0.0, 5.0),
                candidate(0.9999, 0.0001, 0.0, 99.0),
            ],
            0.001,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].weight, 10.0);
        assert_eq!(kept[1].weight, 5.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let kept = remove_duplicates(
            vec![candidate(0.0, 0.0, 1.0, 1.0), candidate(0.0, 0.002, 1.0, 2.0)],
            0.001,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(remove_duplicates(Vec::new(), 0.001).is_empty());
    }
}
