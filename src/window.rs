//! Window functions for spectral analysis
//!
//! Window functions reduce spectral leakage in FFT-based analysis. The
//! symmetric forms here match the reference numeric library (numpy's
//! `hamming`/`hanning`/`bartlett`), which is what the conformance
//! fixtures were generated with.

use std::f32::consts::PI;

/// Window shapes available for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowShape {
    /// Rectangular window (no windowing)
    Rectangular,
    /// Triangular (Bartlett) window
    Triangular,
    /// Hanning window (raised cosine)
    Hanning,
    /// Hamming window
    #[default]
    Hamming,
}

impl WindowShape {
    /// Compute the window value at a normalized position
    ///
    /// # Arguments
    /// * `position` - Position in the window, normalized to [-0.5, 0.5]
    ///                where 0 is the center
    ///
    /// # Returns
    /// The window amplitude at the given position (0.0 to 1.0)
    pub fn value_at(self, position: f32) -> f32 {
        if position.abs() > 0.5 {
            return 0.0;
        }

        match self {
            WindowShape::Rectangular => 1.0,

            WindowShape::Triangular => 1.0 - 2.0 * position.abs(),

            WindowShape::Hanning => 0.5 + 0.5 * (2.0 * PI * position).cos(),

            WindowShape::Hamming => 0.54 + 0.46 * (2.0 * PI * position).cos(),
        }
    }

    /// Generate a periodic window of the given size
    ///
    /// Sample positions are offset by half a sample so the window never
    /// quite reaches its edges; suitable for streaming analysis.
    pub fn generate(self, size: usize) -> Vec<f32> {
        if size == 0 {
            return Vec::new();
        }

        (0..size)
            .map(|i| {
                let position = (i as f32 + 0.5) / size as f32 - 0.5;
                self.value_at(position)
            })
            .collect()
    }

    /// Generate a symmetric window of the given size
    ///
    /// The first and last values are equal; this is numpy's convention
    /// (`w[n] = f(n / (M - 1))`) and the one the reference spectrogram
    /// fixtures use.
    pub fn generate_symmetric(self, size: usize) -> Vec<f32> {
        if size == 0 {
            return Vec::new();
        }
        if size == 1 {
            return vec![1.0];
        }

        (0..size)
            .map(|i| {
                let position = i as f32 / (size - 1) as f32 - 0.5;
                self.value_at(position)
            })
            .collect()
    }
}
