//! Discrete curvature estimation for embedding point clouds.
//!
//! Two independent statistics over seeded random samples:
//!
//! - **δ-hyperbolicity** via the Gromov four-point condition: for points
//!   `w, x, y, z` form the three pairwise sums, take the gap between the two
//!   largest, halve it, and keep the worst case over samples, normalized by
//!   the sample diameter.
//! - **Curvature proxy** via triangle comparison: for a sampled triple,
//!   compare the actual vertex-to-midpoint distance against the Euclidean
//!   (Apollonius) prediction. Thin triangles (shorter medians) push the
//!   estimate negative, fat triangles positive.
//!
//! Classification thresholds are fixed constants
//! ([`crate::types::CURVATURE_CLASS_THRESHOLD`]); a fixed sample therefore
//! classifies deterministically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::math::euclidean_distance;
use crate::types::{ManifoldSample, ManifoldShape};

/// Minimum distinct points the four-point condition needs.
pub const MIN_POINTS: usize = 4;

/// Parameters for a curvature estimation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvatureParams {
    /// Perturbation/noise factor in [0, 1]; jitters sampled distances to
    /// stabilize estimates over degenerate clouds
    pub epsilon: f64,
    /// Number of 4-point samples for the δ estimate
    pub quad_samples: usize,
    /// Number of triangle samples for the curvature proxy
    pub triple_samples: usize,
    /// RNG seed for subset sampling
    pub seed: u64,
}

impl Default for CurvatureParams {
    fn default() -> Self {
        Self {
            epsilon: 0.05,
            quad_samples: 200,
            triple_samples: 200,
            seed: 42,
        }
    }
}

impl CurvatureParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.epsilon.is_finite() || !(0.0..=1.0).contains(&self.epsilon) {
            return Err(EngineError::InvalidConfig {
                field: "epsilon",
                message: format!("expected 0.0..=1.0, got {}", self.epsilon),
            });
        }
        if self.quad_samples == 0 || self.triple_samples == 0 {
            return Err(EngineError::InvalidConfig {
                field: "quad_samples/triple_samples",
                message: "expected >= 1".into(),
            });
        }
        Ok(())
    }
}

/// Estimate the intrinsic geometry of `points`.
///
/// Fails with [`EngineError::InsufficientData`] when fewer than 4 distinct
/// points are supplied; degenerate-but-distinct clouds (collinear points,
/// near-duplicates) still classify without panicking.
pub fn estimate(points: &[Vec<f32>], params: &CurvatureParams) -> EngineResult<ManifoldSample> {
    params.validate()?;

    let distinct = distinct_count(points);
    if distinct < MIN_POINTS {
        return Err(EngineError::InsufficientData {
            required: MIN_POINTS,
            actual: distinct,
        });
    }
    if let Some(bad) = points.iter().find(|p| p.len() != points[0].len()) {
        return Err(EngineError::DimensionMismatch {
            expected: points[0].len(),
            actual: bad.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let delta = delta_hyperbolicity(points, params, &mut rng);
    let curvature_k = curvature_proxy(points, params, &mut rng);
    let shape = ManifoldShape::classify(curvature_k);

    debug!(
        distinct,
        delta, curvature_k, ?shape,
        "curvature estimate complete"
    );

    Ok(ManifoldSample {
        curvature_k,
        delta_hyperbolicity: delta,
        epsilon: params.epsilon,
        shape,
    })
}

fn distinct_count(points: &[Vec<f32>]) -> usize {
    let mut seen: Vec<Vec<u32>> = points
        .iter()
        .map(|p| p.iter().map(|x| x.to_bits()).collect())
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Draw `count` distinct indices from `0..n` (n >= count).
fn sample_indices(rng: &mut ChaCha8Rng, n: usize, count: usize) -> Vec<usize> {
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let idx = rng.gen_range(0..n);
        if !picked.contains(&idx) {
            picked.push(idx);
        }
    }
    picked
}

/// Worst-case four-point δ over the sample set, normalized by diameter.
fn delta_hyperbolicity(
    points: &[Vec<f32>],
    params: &CurvatureParams,
    rng: &mut ChaCha8Rng,
) -> f64 {
    let n = points.len();
    let mut max_delta = 0.0f64;
    let mut diameter = 0.0f64;

    for _ in 0..params.quad_samples {
        let idx = sample_indices(rng, n, 4);
        let (w, x, y, z) = (&points[idx[0]], &points[idx[1]], &points[idx[2]], &points[idx[3]]);

        let d = |a: &Vec<f32>, b: &Vec<f32>| euclidean_distance(a, b) as f64;
        let pairs = [d(w, x), d(y, z), d(w, y), d(x, z), d(w, z), d(x, y)];
        for &dist in &pairs {
            diameter = diameter.max(dist);
        }

        let sums = [pairs[0] + pairs[1], pairs[2] + pairs[3], pairs[4] + pairs[5]];
        let mut sorted = sums;
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let delta = (sorted[0] - sorted[1]) / 2.0;
        max_delta = max_delta.max(delta);
    }

    if diameter <= f64::EPSILON {
        return 0.0;
    }
    max_delta / diameter
}

/// Mean signed triangle deviation: `(actual_median - flat_median) /
/// flat_median` per sampled triple, epsilon-jittered for stability.
fn curvature_proxy(points: &[Vec<f32>], params: &CurvatureParams, rng: &mut ChaCha8Rng) -> f64 {
    let n = points.len();
    let dim = points[0].len();
    let mut sum = 0.0f64;
    let mut used = 0usize;

    for _ in 0..params.triple_samples {
        let idx = sample_indices(rng, n, 3);
        let (a, b, c) = (&points[idx[0]], &points[idx[1]], &points[idx[2]]);

        let ab = euclidean_distance(a, b) as f64;
        let bc = euclidean_distance(b, c) as f64;
        let ac = euclidean_distance(a, c) as f64;
        if ab <= f64::EPSILON || bc <= f64::EPSILON || ac <= f64::EPSILON {
            continue;
        }

        // Apollonius: flat-space median from b to the midpoint of a-c.
        let flat_sq = (2.0 * ab * ab + 2.0 * bc * bc - ac * ac) / 4.0;
        if flat_sq <= f64::EPSILON {
            continue;
        }
        let flat_median = flat_sq.sqrt();

        let midpoint: Vec<f32> = (0..dim).map(|i| (a[i] + c[i]) / 2.0).collect();
        let mut actual_median = euclidean_distance(b, &midpoint) as f64;

        if params.epsilon > 0.0 {
            let jitter = 1.0 + params.epsilon * (rng.gen::<f64>() - 0.5) * 1e-3;
            actual_median *= jitter;
        }

        sum += (actual_median - flat_median) / flat_median;
        used += 1;
    }

    if used == 0 {
        0.0
    } else {
        sum / used as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<Vec<f32>> {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push(vec![i as f32, j as f32]);
            }
        }
        points
    }

    #[test]
    fn fewer_than_four_distinct_points_fails() {
        let points = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ];
        let err = estimate(&points, &CurvatureParams::default()).unwrap_err();
        match err {
            EngineError::InsufficientData { required, actual } => {
                assert_eq!(required, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn flat_grid_classifies_euclidean() {
        let sample = estimate(&grid_points(), &CurvatureParams::default()).unwrap();
        assert_eq!(sample.shape, ManifoldShape::Euclidean);
        assert!(sample.curvature_k.abs() <= 0.1);
    }

    #[test]
    fn collinear_points_still_classify() {
        let points: Vec<Vec<f32>> = (0..8).map(|i| vec![i as f32, 0.0, 0.0]).collect();
        let sample = estimate(&points, &CurvatureParams::default()).unwrap();
        assert!(sample.delta_hyperbolicity.is_finite());
        assert!(sample.curvature_k.is_finite());
    }

    #[test]
    fn estimate_is_deterministic_for_fixed_seed() {
        let points = grid_points();
        let params = CurvatureParams {
            seed: 11,
            ..CurvatureParams::default()
        };
        let a = estimate(&points, &params).unwrap();
        let b = estimate(&points, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn delta_is_nonnegative_and_diameter_normalized() {
        let sample = estimate(&grid_points(), &CurvatureParams::default()).unwrap();
        assert!(sample.delta_hyperbolicity >= 0.0);
        assert!(sample.delta_hyperbolicity <= 1.0);
    }

    #[test]
    fn epsilon_out_of_range_is_invalid_config() {
        let params = CurvatureParams {
            epsilon: 1.5,
            ..CurvatureParams::default()
        };
        let err = estimate(&grid_points(), &params).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn star_cloud_produces_a_finite_estimate() {
        // Hub plus distant spokes, the degenerate-but-valid layout preview
        // corpora tend to produce.
        let mut points = vec![vec![0.0f32, 0.0]];
        for i in 0..12 {
            let angle = i as f32 * std::f32::consts::TAU / 12.0;
            points.push(vec![10.0 * angle.cos(), 10.0 * angle.sin()]);
        }
        let sample = estimate(&points, &CurvatureParams::default()).unwrap();
        assert!(sample.curvature_k.is_finite());
    }
}
