//! Manual verification of curvature estimation failure modes and
//! classification stability.

use manifold_engine_core::curvature::{estimate, CurvatureParams};
use manifold_engine_core::error::EngineError;
use manifold_engine_core::types::ManifoldShape;

#[test]
fn three_points_report_insufficient_data() {
    let points = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
    let err = estimate(&points, &CurvatureParams::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientData { required: 4, actual: 3 }
    ));
}

#[test]
fn duplicates_do_not_count_toward_the_minimum() {
    // Six points, only two distinct.
    let points = vec![
        vec![1.0, 2.0],
        vec![1.0, 2.0],
        vec![1.0, 2.0],
        vec![3.0, 4.0],
        vec![3.0, 4.0],
        vec![3.0, 4.0],
    ];
    let err = estimate(&points, &CurvatureParams::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientData { required: 4, actual: 2 }
    ));
}

#[test]
fn degenerate_collinear_cloud_classifies_without_panic() {
    let points: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32 * 0.5, 0.0, 0.0]).collect();
    let sample = estimate(&points, &CurvatureParams::default()).unwrap();
    assert!(sample.curvature_k.is_finite());
    assert!(sample.delta_hyperbolicity.is_finite());
}

#[test]
fn flat_grid_is_euclidean_across_seeds() {
    let mut points = Vec::new();
    for i in 0..6 {
        for j in 0..6 {
            points.push(vec![i as f32, j as f32, 0.0]);
        }
    }
    for seed in [1, 42, 1000] {
        let params = CurvatureParams {
            seed,
            ..CurvatureParams::default()
        };
        let sample = estimate(&points, &params).unwrap();
        assert_eq!(
            sample.shape,
            ManifoldShape::Euclidean,
            "seed {seed}: K = {}",
            sample.curvature_k
        );
    }
}

#[test]
fn epsilon_is_echoed_into_the_sample() {
    let points: Vec<Vec<f32>> = (0..8)
        .map(|i| vec![(i as f32).sin(), (i as f32).cos(), i as f32 * 0.1])
        .collect();
    let params = CurvatureParams {
        epsilon: 0.25,
        ..CurvatureParams::default()
    };
    let sample = estimate(&points, &params).unwrap();
    assert_eq!(sample.epsilon, 0.25);
}

#[test]
fn sample_is_serializable() {
    let points: Vec<Vec<f32>> = (0..8)
        .map(|i| vec![(i % 3) as f32, (i % 5) as f32])
        .collect();
    let sample = estimate(&points, &CurvatureParams::default()).unwrap();
    let json = serde_json::to_string(&sample).unwrap();
    assert!(json.contains("curvature_k"));
    let restored: manifold_engine_core::types::ManifoldSample =
        serde_json::from_str(&json).unwrap();
    assert_eq!(sample, restored);
}
