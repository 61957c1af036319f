//! Short-time Fourier transform
//!
//! Computes a complex spectrogram from framed audio: each frame is
//! multiplied by a window function and transformed with an FFT of the
//! frame length. Only the non-redundant half of the spectrum is kept
//! (DC included, Nyquist dropped), matching the reference library's
//! orientation. The transform never discards frames on its own; any
//! frame trimming done to line up with a foreign framing convention is
//! the caller's (harness's) decision.

use num_complex::Complex;

use crate::framing::FramedSignal;
use crate::utils::Fft;
use crate::window::WindowShape;

/// Complex spectrogram, one row per frame
#[derive(Debug, Clone)]
pub struct ShortTimeFourierTransform {
    /// Spectral frames, `[frame][bin]`
    data: Vec<Vec<Complex<f32>>>,
    /// Frequency of each bin in Hz, identical for all frames
    bin_frequencies: Vec<f32>,
    frame_size: usize,
}

impl ShortTimeFourierTransform {
    /// Compute the STFT of a framed signal
    ///
    /// # Arguments
    /// * `framed` - Input frames (all of identical length L)
    /// * `window` - Window shape applied to each frame (symmetric form)
    ///
    /// Bin `k` corresponds to frequency `k * sample_rate / L`, for
    /// `k` in `0..L/2`.
    pub fn from_frames(framed: &FramedSignal, window: WindowShape) -> Self {
        let frame_size = framed.frame_size();
        let num_bins = frame_size / 2;
        let win = window.generate_symmetric(frame_size);

        let mut fft = Fft::new();
        let data: Vec<Vec<Complex<f32>>> = framed
            .frames()
            .iter()
            .map(|frame| {
                let windowed: Vec<f32> = frame
                    .iter()
                    .zip(win.iter())
                    .map(|(&s, &w)| s * w)
                    .collect();
                let spectrum = fft.real_fft(&windowed, frame_size);
                spectrum[..num_bins].to_vec()
            })
            .collect();

        let sample_rate = framed.sample_rate();
        let bin_frequencies = (0..num_bins)
            .map(|k| k as f32 * sample_rate / frame_size as f32)
            .collect();

        Self {
            data,
            bin_frequencies,
            frame_size,
        }
    }

    /// Get the number of frames
    pub fn num_frames(&self) -> usize {
        self.data.len()
    }

    /// Get the number of frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.bin_frequencies.len()
    }

    /// Get the frame length the transform was computed with
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Get the bin frequencies in Hz
    pub fn bin_frequencies(&self) -> &[f32] {
        &self.bin_frequencies
    }

    /// Get the complex spectral frames
    pub fn frames(&self) -> &[Vec<Complex<f32>>] {
        &self.data
    }

    /// Get the magnitude spectrogram, `[frame][bin]`
    pub fn magnitudes(&self) -> Vec<Vec<f32>> {
        self.data
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Return a copy keeping only the first `num_frames` frames
    ///
    /// Used by callers that must line up with a reference whose framing
    /// convention emits fewer frames; an explicit operation, never
    /// applied implicitly.
    pub fn trimmed(&self, num_frames: usize) -> Self {
        Self {
            data: self.data[..num_frames.min(self.data.len())].to_vec(),
            bin_frequencies: self.bin_frequencies.clone(),
            frame_size: self.frame_size,
        }
    }
}
