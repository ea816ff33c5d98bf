//! Histogram Shannon entropy shared by clustering and spectral analysis.

/// Shannon entropy (log2) of `values` histogrammed into at most `bins`
/// equal-width buckets over the observed range.
///
/// Returns `(entropy, applied_bins)`. The bin count is clamped down to the
/// number of distinct values so empty-by-construction buckets cannot inflate
/// the bucket count; a constant sequence collapses to one bin and entropy 0.
/// Never errors: the clamp is the caller's to report.
pub fn shannon_entropy(values: &[f64], bins: usize) -> (f64, usize) {
    if values.is_empty() || bins == 0 {
        return (0.0, 0);
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    let distinct = distinct_count(values);
    let applied_bins = bins.min(distinct).max(1);

    if applied_bins == 1 || (max - min) <= f64::EPSILON {
        return (0.0, 1);
    }

    let width = (max - min) / applied_bins as f64;
    let mut counts = vec![0usize; applied_bins];
    for &v in values {
        let mut idx = ((v - min) / width) as usize;
        if idx >= applied_bins {
            idx = applied_bins - 1;
        }
        counts[idx] += 1;
    }

    let n = values.len() as f64;
    let mut entropy = 0.0;
    for &count in &counts {
        if count > 0 {
            let p = count as f64 / n;
            entropy -= p * p.log2();
        }
    }

    (entropy, applied_bins)
}

/// Count distinct values by bit pattern (exact, handles -0.0 vs 0.0 as
/// distinct which is acceptable for clamp purposes).
fn distinct_count(values: &[f64]) -> usize {
    let mut bits: Vec<u64> = values.iter().map(|v| v.to_bits()).collect();
    bits.sort_unstable();
    bits.dedup();
    bits.len()
}

/// Normalized spectral entropy of a magnitude distribution: Shannon entropy
/// of the magnitudes treated as a probability mass function.
pub fn distribution_entropy(magnitudes: &[f64]) -> f64 {
    let total: f64 = magnitudes.iter().filter(|m| m.is_finite()).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for &m in magnitudes {
        if m > 0.0 {
            let p = m / total;
            entropy -= p * p.log2();
        }
    }
    entropy
}
