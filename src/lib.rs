//! mfcc-core: MFCC feature extraction with reference conformance checking
//!
//! This library implements the classic cepstral feature-extraction chain
//! (framing → windowed STFT → mel-filterbank projection → DCT → delta
//! dynamics) together with a harness that proves its numerics match
//! reference tables produced by an independent implementation.
//!
//! # Core Types
//!
//! - [`Signal`] - Decoded mono audio samples with sample rate
//! - [`FramedSignal`] - Overlapping fixed-length frames over a Signal
//! - [`ShortTimeFourierTransform`] - Complex spectrogram, one row per frame
//! - [`Filterbank`] - Band-weight matrix mapping spectral bins to band energies
//! - [`Mfcc`] - Cepstral coefficients plus delta/delta-delta dynamics
//! - [`ConformanceHarness`] - Runs the pipeline and compares every stage
//!   against reference arrays within a numeric tolerance

pub mod signal;
pub mod window;
pub mod framing;
pub mod stft;
pub mod filterbank;
pub mod cepstrogram;
pub mod reference;
pub mod conformance;

pub mod utils;

// Re-export main types at crate root
pub use signal::Signal;
pub use window::WindowShape;
pub use framing::{FramedSignal, Origin};
pub use stft::ShortTimeFourierTransform;
pub use filterbank::Filterbank;
pub use cepstrogram::Mfcc;
pub use conformance::{ConformanceHarness, ConformanceReport, PipelineConfig, ReferenceData};

use thiserror::Error;

/// Errors that can occur in feature extraction or conformance checking
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV decoding error: {0}")]
    WavDecode(#[from] hound::Error),

    #[error("audio decoding error: {0}")]
    Decode(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("reference data error: {0}")]
    Parse(String),

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(
        "conformance violation at stage `{stage}`: |{produced} - {expected}| = {diff} \
         at ({row}, {col}) exceeds tolerance {tolerance}\nproduced:\n{ours}\nreference:\n{theirs}"
    )]
    ConformanceViolation {
        stage: String,
        row: usize,
        col: usize,
        produced: String,
        expected: String,
        diff: f32,
        tolerance: f32,
        ours: String,
        theirs: String,
    },
}

pub type Result<T> = std::result::Result<T, FeatureError>;

// Frequency scale conversions (HTK/Voicebox formulas, matching the
// reference filterbank tables)

/// Convert Hz to the mel scale
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel to Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}
