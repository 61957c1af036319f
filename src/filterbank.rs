//! Mel filterbank
//!
//! A Filterbank is a fixed band-weight matrix (rows = bands, columns =
//! spectral bins) built once, either from externally supplied weights or
//! from triangular mel-spaced filters spanning `[fmin, fmax]`. Applying
//! it to a magnitude spectrum is a plain matrix–vector product.

use crate::{hz_to_mel, mel_to_hz, FeatureError, Result};

/// Band-weight matrix mapping spectral bins to band energies
#[derive(Debug, Clone)]
pub struct Filterbank {
    /// Weights, `[band][bin]`
    weights: Vec<Vec<f32>>,
    /// Frequency of each spectral bin in Hz
    bin_frequencies: Vec<f32>,
}

impl Filterbank {
    /// Create a Filterbank from externally supplied weights
    ///
    /// # Arguments
    /// * `weights` - Band weights, rows = bands, columns = bins
    /// * `bin_frequencies` - Frequency of each spectral bin in Hz
    ///
    /// # Errors
    /// `ShapeMismatch` if any row's length differs from the number of
    /// bin frequencies.
    pub fn from_weights(weights: Vec<Vec<f32>>, bin_frequencies: Vec<f32>) -> Result<Self> {
        let num_bins = bin_frequencies.len();
        for row in &weights {
            if row.len() != num_bins {
                return Err(FeatureError::ShapeMismatch {
                    expected: (weights.len(), num_bins),
                    actual: (weights.len(), row.len()),
                });
            }
        }

        Ok(Self {
            weights,
            bin_frequencies,
        })
    }

    /// Build triangular mel-spaced filters spanning `[fmin, fmax]`
    ///
    /// Band edges are `num_bands + 2` points equally spaced on the mel
    /// scale; band `m` rises linearly from edge `m` to edge `m+1` and
    /// falls back to zero at edge `m+2`. With `normalize` each band's
    /// weights are scaled to sum to one (bands whose edges fall between
    /// two bins may stay empty and are left as dead bands).
    ///
    /// # Errors
    /// `InvalidParameter` if `num_bands` is zero, the frequency range is
    /// empty, or no bin frequencies are given.
    pub fn mel(
        num_bands: usize,
        fmin: f32,
        fmax: f32,
        bin_frequencies: Vec<f32>,
        normalize: bool,
    ) -> Result<Self> {
        if num_bands == 0 {
            return Err(FeatureError::InvalidParameter(
                "number of bands must be positive".to_string(),
            ));
        }
        if fmin < 0.0 || fmin >= fmax {
            return Err(FeatureError::InvalidParameter(format!(
                "invalid frequency range [{}, {}]",
                fmin, fmax
            )));
        }
        if bin_frequencies.is_empty() {
            return Err(FeatureError::InvalidParameter(
                "no spectral bins".to_string(),
            ));
        }

        // num_bands + 2 edges, equally spaced in mel
        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f32> = (0..num_bands + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (num_bands + 1) as f32))
            .collect();

        let weights = (0..num_bands)
            .map(|m| {
                let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
                let mut row: Vec<f32> = bin_frequencies
                    .iter()
                    .map(|&f| {
                        if f <= left || f >= right {
                            0.0
                        } else if f <= center {
                            (f - left) / (center - left)
                        } else {
                            (right - f) / (right - center)
                        }
                    })
                    .collect();
                if normalize {
                    let sum: f32 = row.iter().sum();
                    if sum > 0.0 {
                        for w in &mut row {
                            *w /= sum;
                        }
                    }
                }
                row
            })
            .collect();

        Ok(Self {
            weights,
            bin_frequencies,
        })
    }

    /// Get the number of bands
    pub fn num_bands(&self) -> usize {
        self.weights.len()
    }

    /// Get the number of spectral bins
    pub fn num_bins(&self) -> usize {
        self.bin_frequencies.len()
    }

    /// Get the weight matrix, `[band][bin]`
    pub fn weights(&self) -> &[Vec<f32>] {
        &self.weights
    }

    /// Get the bin frequencies in Hz
    pub fn bin_frequencies(&self) -> &[f32] {
        &self.bin_frequencies
    }

    /// Project a magnitude spectrum onto the bands
    ///
    /// # Errors
    /// `ShapeMismatch` if the spectrum length differs from the
    /// filterbank's column count.
    pub fn apply(&self, spectrum: &[f32]) -> Result<Vec<f32>> {
        if spectrum.len() != self.num_bins() {
            return Err(FeatureError::ShapeMismatch {
                expected: (1, self.num_bins()),
                actual: (1, spectrum.len()),
            });
        }

        Ok(self
            .weights
            .iter()
            .map(|row| row.iter().zip(spectrum).map(|(&w, &s)| w * s).sum())
            .collect())
    }

    /// Project a sequence of magnitude spectra, one band-energy vector
    /// per frame
    pub fn apply_all(&self, spectra: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        spectra.iter().map(|s| self.apply(s)).collect()
    }
}
