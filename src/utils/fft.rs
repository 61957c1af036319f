//! FFT wrapper for spectral analysis
//!
//! A thin convenience wrapper around rustfft, operating in single
//! precision for parity with the reference fixtures.

use num_complex::Complex;
use rustfft::FftPlanner;

/// FFT processor with cached plans
pub struct Fft {
    planner: FftPlanner<f32>,
}

impl Fft {
    /// Create a new FFT processor
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Compute the FFT of real-valued input
    ///
    /// # Arguments
    /// * `input` - Real-valued input samples
    /// * `fft_size` - Size of the FFT (input is zero-padded if shorter)
    ///
    /// # Returns
    /// Complex-valued FFT result of length `fft_size`
    pub fn real_fft(&mut self, input: &[f32], fft_size: usize) -> Vec<Complex<f32>> {
        let fft_size = fft_size.max(input.len());
        let fft = self.planner.plan_fft_forward(fft_size);

        let mut buffer: Vec<Complex<f32>> = input
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(fft_size)
            .collect();

        fft.process(&mut buffer);
        buffer
    }

    /// Compute the inverse FFT, normalized by 1/N
    pub fn inverse_fft(&mut self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let fft_size = input.len();
        let fft = self.planner.plan_fft_inverse(fft_size);

        let mut buffer = input.to_vec();
        fft.process(&mut buffer);

        let scale = 1.0 / fft_size as f32;
        for c in &mut buffer {
            *c *= scale;
        }

        buffer
    }
}

impl Default for Fft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_fft_dc() {
        let mut fft = Fft::new();

        let input = vec![1.0; 8];
        let spectrum = fft.real_fft(&input, 8);

        // DC component is the sum of the input
        assert_relative_eq!(spectrum[0].re, 8.0, epsilon = 1e-4);
        assert_relative_eq!(spectrum[0].im, 0.0, epsilon = 1e-4);

        for i in 1..8 {
            assert_relative_eq!(spectrum[i].norm(), 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_fft_sine() {
        let mut fft = Fft::new();

        let n = 16;
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * i as f32 / n as f32).sin())
            .collect();

        let spectrum = fft.real_fft(&input, n);

        // energy at bin 1 (and its conjugate), none at DC or bin 2
        assert!(spectrum[1].norm() > 1.0);
        assert_relative_eq!(spectrum[0].norm(), 0.0, epsilon = 1e-4);
        assert_relative_eq!(spectrum[2].norm(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_fft_round_trip() {
        let mut fft = Fft::new();

        let input: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let spectrum = fft.real_fft(&input, 8);
        let recovered = fft.inverse_fft(&spectrum);

        for (orig, rec) in input.iter().zip(recovered.iter()) {
            assert_relative_eq!(*orig, rec.re, epsilon = 1e-4);
            assert_relative_eq!(rec.im, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_zero_padding() {
        let mut fft = Fft::new();

        let spectrum = fft.real_fft(&[1.0, 1.0], 8);
        assert_eq!(spectrum.len(), 8);
        assert_relative_eq!(spectrum[0].re, 2.0, epsilon = 1e-4);
    }
}
