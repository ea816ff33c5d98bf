//! Small vector math helpers shared by clustering and curvature estimation.

/// Dot product of two equal-length vectors.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// Euclidean norm.
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Euclidean distance between two equal-length vectors.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity in [-1, 1]; 0.0 when either vector is degenerate.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = norm(a);
    let nb = norm(b);
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return 0.0;
    }
    (dot(a, b) / (na * nb)).clamp(-1.0, 1.0)
}

/// Component-wise mean of a set of equal-length vectors.
///
/// Returns a zero vector of length `dim` for an empty set.
pub fn mean_vector<'a, I>(vectors: I, dim: usize) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut mean = vec![0.0f32; dim];
    let mut count = 0usize;
    for v in vectors {
        for (m, &x) in mean.iter_mut().zip(v.iter()) {
            *m += x;
        }
        count += 1;
    }
    if count > 0 {
        let inv = 1.0 / count as f32;
        for m in &mut mean {
            *m *= inv;
        }
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn degenerate_vector_yields_zero_similarity() {
        let a = [0.0, 0.0];
        let b = [1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn mean_vector_averages_components() {
        let vs: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![3.0, 2.0]];
        let mean = mean_vector(vs.iter().map(|v| v.as_slice()), 2);
        assert_eq!(mean, vec![2.0, 1.0]);
    }

    #[test]
    fn mean_of_empty_set_is_zero_vector() {
        let mean = mean_vector(std::iter::empty(), 3);
        assert_eq!(mean, vec![0.0, 0.0, 0.0]);
    }
}
