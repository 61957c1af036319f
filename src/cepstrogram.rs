//! Cepstral analysis (MFCC) and delta dynamics
//!
//! Band energies from the filterbank are log-compressed and projected
//! through an orthonormal type-II DCT, one coefficient vector per frame.
//! First- and second-order dynamics use the Voicebox regression formula:
//! a slope fit over a fixed window of neighboring frames, not simple
//! differencing. The first and last frame of the delta-delta sequence
//! inherit a boundary asymmetry from the reference formula's padding;
//! that asymmetry is part of the contract, callers comparing against
//! reference data special-case exactly those two frames.

use crate::filterbank::Filterbank;
use crate::stft::ShortTimeFourierTransform;
use crate::{FeatureError, Result};

/// Multiplier applied to band energies before log compression
pub const LOG_MUL: f32 = 1.0;

/// Offset added to band energies before log compression, the reference
/// library's machine epsilon guard against log10(0)
pub const LOG_ADD: f32 = 2.220_446_1e-16;

/// Half-width of the delta regression window (9-tap filter)
pub const DELTA_HALF_WIDTH: usize = 4;

/// Cepstral coefficients, one vector per frame
#[derive(Debug, Clone)]
pub struct Mfcc {
    /// Coefficients, `[frame][band]`
    coefficients: Vec<Vec<f32>>,
    num_bands: usize,
}

impl Mfcc {
    /// Compute MFCCs from a complex spectrogram
    ///
    /// Magnitudes are projected through the filterbank, log-compressed
    /// as `log10(mul * energy + add)` and transformed with an
    /// orthonormal DCT-II.
    ///
    /// # Errors
    /// `ShapeMismatch` if the filterbank's column count differs from the
    /// transform's bin count.
    pub fn from_stft(
        stft: &ShortTimeFourierTransform,
        filterbank: &Filterbank,
        mul: f32,
        add: f32,
    ) -> Result<Self> {
        let energies = filterbank.apply_all(&stft.magnitudes())?;
        Self::from_band_energies(energies, mul, add)
    }

    /// Compute MFCCs from precomputed band energies
    ///
    /// # Errors
    /// `ShapeMismatch` if the energy rows are ragged.
    pub fn from_band_energies(energies: Vec<Vec<f32>>, mul: f32, add: f32) -> Result<Self> {
        let num_bands = energies.first().map(|r| r.len()).unwrap_or(0);
        for row in &energies {
            if row.len() != num_bands {
                return Err(FeatureError::ShapeMismatch {
                    expected: (energies.len(), num_bands),
                    actual: (energies.len(), row.len()),
                });
            }
        }

        let coefficients = energies
            .into_iter()
            .map(|row| {
                let logged: Vec<f32> = row.iter().map(|&e| (mul * e + add).log10()).collect();
                dct_ii_ortho(&logged)
            })
            .collect();

        Ok(Self {
            coefficients,
            num_bands,
        })
    }

    /// Get the number of frames
    pub fn num_frames(&self) -> usize {
        self.coefficients.len()
    }

    /// Get the number of cepstral coefficients per frame
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Get the coefficient matrix, `[frame][band]`
    pub fn coefficients(&self) -> &[Vec<f32>] {
        &self.coefficients
    }

    /// First-order dynamics via the regression window
    ///
    /// `delta[t] = Σ_j j · c[t+j] / (2 Σ d²)` over
    /// `j = -W..W`, the sequence edge-replicated.
    pub fn deltas(&self) -> Vec<Vec<f32>> {
        regress(&self.coefficients, DELTA_HALF_WIDTH, 0)
    }

    /// Second-order dynamics: the half-width-1 regression (a central
    /// difference) applied to [`Self::deltas`], edge-replicated
    pub fn delta_deltas(&self) -> Vec<Vec<f32>> {
        regress(&self.deltas(), 1, 0)
    }

    /// Stack `[coefficients | deltas | delta-deltas]` per frame,
    /// Voicebox style
    ///
    /// The delta sequence is computed one frame beyond each end of the
    /// cepstra and the delta-deltas are the central difference of that
    /// extended sequence. The delta block equals [`Self::deltas`] for
    /// every frame; the delta-delta block equals [`Self::delta_deltas`]
    /// everywhere except the first and last frame, where the extended
    /// padding legitimately diverges.
    pub fn delta_stack(&self) -> Vec<Vec<f32>> {
        let num_frames = self.coefficients.len();
        if num_frames == 0 {
            return Vec::new();
        }

        // T + 2 rows: one extra delta frame beyond each end
        let extended = regress(&self.coefficients, DELTA_HALF_WIDTH, 1);

        (0..num_frames)
            .map(|t| {
                let mut row = Vec::with_capacity(3 * self.num_bands);
                row.extend_from_slice(&self.coefficients[t]);
                row.extend_from_slice(&extended[t + 1]);
                for b in 0..self.num_bands {
                    row.push((extended[t + 2][b] - extended[t][b]) * 0.5);
                }
                row
            })
            .collect()
    }
}

/// Regression weights `j / (2 Σ d²)` for `j = -half_width..=half_width`
fn regression_weights(half_width: usize) -> Vec<f32> {
    let norm: f32 = 2.0 * (1..=half_width).map(|d| (d * d) as f32).sum::<f32>();
    (-(half_width as isize)..=half_width as isize)
        .map(|j| j as f32 / norm)
        .collect()
}

/// Apply the regression filter along the frame axis
///
/// The sequence is edge-replicated; the output covers `extra` positions
/// beyond each end of the input (`frames.len() + 2 * extra` rows).
fn regress(frames: &[Vec<f32>], half_width: usize, extra: usize) -> Vec<Vec<f32>> {
    if frames.is_empty() {
        return Vec::new();
    }

    let num_frames = frames.len() as isize;
    let width = frames[0].len();
    let weights = regression_weights(half_width);
    let hw = half_width as isize;

    (0..frames.len() + 2 * extra)
        .map(|o| {
            let center = o as isize - extra as isize;
            let mut row = vec![0.0_f32; width];
            for (wi, &w) in weights.iter().enumerate() {
                let idx = (center + wi as isize - hw).clamp(0, num_frames - 1) as usize;
                for (acc, &c) in row.iter_mut().zip(&frames[idx]) {
                    *acc += w * c;
                }
            }
            row
        })
        .collect()
}

/// Orthonormal type-II discrete cosine transform
///
/// `y[k] = s_k Σ_n x[n] cos(π k (2n+1) / 2N)` with `s_0 = √(1/N)`,
/// `s_k = √(2/N)`; output length equals input length.
fn dct_ii_ortho(input: &[f32]) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let nf = n as f32;

    (0..n)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * k as f32 * (2 * i + 1) as f32 / (2.0 * nf)).cos()
                })
                .sum();
            let scale = if k == 0 {
                (1.0 / nf).sqrt()
            } else {
                (2.0 / nf).sqrt()
            };
            scale * sum
        })
        .collect()
}
