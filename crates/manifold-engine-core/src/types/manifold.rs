//! Manifold shape classification types.

use serde::{Deserialize, Serialize};

/// Intrinsic geometry class of an embedding point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifoldShape {
    /// Negatively curved: tree-like, hierarchy-dominant structure
    Hyperbolic,
    /// Positively curved: cyclic / densely interconnected structure
    Spherical,
    /// Flat within tolerance
    Euclidean,
}

/// Classification threshold on the curvature proxy.
///
/// Fixed constant, not tunable at call time: `K < -THRESHOLD` is
/// hyperbolic, `K > THRESHOLD` spherical, otherwise Euclidean. Kept
/// dimension-independent; the proxy is scale-normalized before averaging.
pub const CURVATURE_CLASS_THRESHOLD: f64 = 0.1;

impl ManifoldShape {
    /// Classify a curvature estimate against the fixed thresholds.
    pub fn classify(curvature_k: f64) -> Self {
        if curvature_k < -CURVATURE_CLASS_THRESHOLD {
            ManifoldShape::Hyperbolic
        } else if curvature_k > CURVATURE_CLASS_THRESHOLD {
            ManifoldShape::Spherical
        } else {
            ManifoldShape::Euclidean
        }
    }
}

/// Derived geometry of one embedding point cloud.
///
/// Recomputed per request; the engine does not cache samples across calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManifoldSample {
    /// Signed curvature proxy averaged over sampled triples
    pub curvature_k: f64,
    /// Gromov four-point δ, normalized by sample diameter.
    /// Lower values indicate stronger tree-likeness.
    pub delta_hyperbolicity: f64,
    /// Perturbation factor the estimate was run with (0-1)
    pub epsilon: f64,
    /// Shape classification of `curvature_k`
    pub shape: ManifoldShape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_thresholds() {
        assert_eq!(ManifoldShape::classify(-0.5), ManifoldShape::Hyperbolic);
        assert_eq!(ManifoldShape::classify(-0.1), ManifoldShape::Euclidean);
        assert_eq!(ManifoldShape::classify(0.0), ManifoldShape::Euclidean);
        assert_eq!(ManifoldShape::classify(0.1), ManifoldShape::Euclidean);
        assert_eq!(ManifoldShape::classify(0.25), ManifoldShape::Spherical);
    }
}
