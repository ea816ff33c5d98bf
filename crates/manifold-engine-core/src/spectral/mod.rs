//! Zeta-keyed spectral filtering.
//!
//! Transforms a real-valued sequence to the frequency domain, applies a
//! mask built from Gaussian bumps centered at Riemann zeta zero ordinates
//! (scaled into the sequence's positive-frequency range), and transforms
//! back. The basis is fixed and data-independent, so the filter needs no
//! training and is deterministic given the input length and `num_zeros`.
//!
//! The transform is a direct DFT: filter inputs are short per-cluster
//! signal series, so the O(n²) cost is irrelevant and the implementation
//! stays dependency-free.

mod zeros;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entropy::distribution_entropy;
use crate::error::{EngineError, EngineResult};

pub use zeros::{MAX_ZEROS, ZETA_ZERO_IM};

/// Parameters for one filter application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralParams {
    /// Resonance frequencies to key the mask to (clamped to [`MAX_ZEROS`])
    pub num_zeros: usize,
    /// Gaussian bump width, in frequency bins
    pub bump_sigma: f64,
}

impl Default for SpectralParams {
    fn default() -> Self {
        Self {
            num_zeros: 8,
            bump_sigma: 1.5,
        }
    }
}

impl SpectralParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> EngineResult<()> {
        if self.num_zeros == 0 {
            return Err(EngineError::InvalidConfig {
                field: "num_zeros",
                message: "expected >= 1".into(),
            });
        }
        if !self.bump_sigma.is_finite() || self.bump_sigma <= 0.0 {
            return Err(EngineError::InvalidConfig {
                field: "bump_sigma",
                message: format!("expected finite > 0.0, got {}", self.bump_sigma),
            });
        }
        Ok(())
    }
}

/// Output of one filter application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralResponse {
    /// Noise-filtered sequence, same length as the input
    pub filtered: Vec<f64>,
    /// Positive-frequency bin with the most post-filter energy (DC excluded)
    pub dominant_index: usize,
    /// Energy fraction concentrated in the dominant bin, in [0, 1]
    pub concentration: f64,
    /// Spectral entropy of the filtered magnitude distribution
    pub entropy: f64,
    /// Resonance frequencies actually used (after clamping)
    pub zeros_used: usize,
}

/// Apply the zeta-keyed filter to `signal`.
///
/// Sequences shorter than 2 samples carry no frequency content and fail
/// with [`EngineError::InsufficientData`]. A `num_zeros` beyond the table
/// is clamped and reported via `zeros_used`.
pub fn filter_sequence(signal: &[f64], params: &SpectralParams) -> EngineResult<SpectralResponse> {
    params.validate()?;

    let n = signal.len();
    if n < 2 {
        return Err(EngineError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let zeros_used = params.num_zeros.min(MAX_ZEROS);
    let (mut re, mut im) = dft(signal);

    let nyquist = n / 2;
    let mask = build_mask(n, zeros_used, params.bump_sigma);
    for j in 0..n {
        re[j] *= mask[j];
        im[j] *= mask[j];
    }

    // Post-filter magnitudes over positive frequencies, DC excluded.
    // Magnitudes below the rounding-noise floor snap to zero; a constant
    // signal therefore reports an empty positive spectrum.
    let scale = signal.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()));
    let noise_floor = scale * n as f64 * 1e-9;
    let magnitudes: Vec<f64> = (1..=nyquist)
        .map(|j| {
            let mag = (re[j] * re[j] + im[j] * im[j]).sqrt();
            if mag <= noise_floor {
                0.0
            } else {
                mag
            }
        })
        .collect();

    let mut dominant_index = 1;
    let mut dominant_energy = 0.0;
    let mut total_energy = 0.0;
    for (offset, &mag) in magnitudes.iter().enumerate() {
        let energy = mag * mag;
        total_energy += energy;
        if energy > dominant_energy {
            dominant_energy = energy;
            dominant_index = offset + 1;
        }
    }
    let concentration = if total_energy > 0.0 {
        dominant_energy / total_energy
    } else {
        0.0
    };
    let entropy = distribution_entropy(&magnitudes);

    let filtered = idft_real(&re, &im);

    debug!(
        n,
        zeros_used, dominant_index, concentration, entropy,
        "spectral filter applied"
    );

    Ok(SpectralResponse {
        filtered,
        dominant_index,
        concentration,
        entropy,
        zeros_used,
    })
}

/// Frequency mask: Gaussian bumps at scaled zeta ordinates, mirrored onto
/// the conjugate bins so the inverse transform stays real. DC passes
/// untouched, preserving the signal mean.
fn build_mask(n: usize, zeros_used: usize, sigma: f64) -> Vec<f64> {
    let nyquist = n / 2;
    let mut mask = vec![0.0f64; n];
    mask[0] = 1.0;

    let top_ordinate = ZETA_ZERO_IM[zeros_used - 1];
    for j in 1..=nyquist {
        let mut value = 0.0f64;
        for &ordinate in &ZETA_ZERO_IM[..zeros_used] {
            let center = ordinate / top_ordinate * nyquist as f64;
            let dist = j as f64 - center;
            value += (-dist * dist / (2.0 * sigma * sigma)).exp();
        }
        let value = value.min(1.0);
        mask[j] = value;
        mask[n - j] = value;
    }
    mask
}

/// Direct discrete Fourier transform of a real signal.
fn dft(signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = signal.len();
    let mut re = vec![0.0f64; n];
    let mut im = vec![0.0f64; n];
    let step = -2.0 * std::f64::consts::PI / n as f64;
    for (k, (rk, ik)) in re.iter_mut().zip(im.iter_mut()).enumerate() {
        for (t, &x) in signal.iter().enumerate() {
            let angle = step * (k * t) as f64;
            *rk += x * angle.cos();
            *ik += x * angle.sin();
        }
    }
    (re, im)
}

/// Inverse DFT, keeping only the real part (the masked spectrum is
/// conjugate-symmetric, so the imaginary part cancels to rounding noise).
fn idft_real(re: &[f64], im: &[f64]) -> Vec<f64> {
    let n = re.len();
    let step = 2.0 * std::f64::consts::PI / n as f64;
    let scale = 1.0 / n as f64;
    (0..n)
        .map(|t| {
            let mut acc = 0.0f64;
            for k in 0..n {
                let angle = step * (k * t) as f64;
                acc += re[k] * angle.cos() - im[k] * angle.sin();
            }
            acc * scale
        })
        .collect()
}
