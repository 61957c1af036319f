//! Utility modules for signal processing
//!
//! Low-level helpers used by the analysis stages.

pub mod fft;

pub use fft::Fft;
