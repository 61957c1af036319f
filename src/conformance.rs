//! Conformance harness
//!
//! Runs the feature-extraction pipeline stage by stage and compares
//! every intermediate and final array against reference tables produced
//! by an independent implementation. Comparison is an elementwise
//! absolute-difference check against a fixed tolerance, preceded by a
//! single orientation-canonicalization step: a reference whose shape is
//! the exact reverse of the produced array's is transposed once before
//! comparing; any other shape difference is a hard `ShapeMismatch`.
//! The first value exceeding tolerance halts the run.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use num_complex::Complex;

use crate::cepstrogram::{Mfcc, LOG_ADD, LOG_MUL};
use crate::filterbank::Filterbank;
use crate::framing::{FramedSignal, Origin};
use crate::reference;
use crate::signal::Signal;
use crate::stft::ShortTimeFourierTransform;
use crate::window::WindowShape;
use crate::{FeatureError, Result};

/// Configuration constants for the pipeline and the comparison
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Expected sample rate in Hz
    pub sample_rate: f32,
    /// Frame length in milliseconds
    pub frame_length_ms: f32,
    /// Hop size in milliseconds
    pub hop_size_ms: f32,
    /// Number of mel bands
    pub num_bands: usize,
    /// Lower edge of the filterbank frequency range in Hz
    pub fmin: f32,
    /// Upper edge of the filterbank frequency range in Hz
    pub fmax: f32,
    /// Window applied before the spectral transform
    pub window: WindowShape,
    /// Maximum tolerated absolute elementwise difference
    pub tolerance: f32,
    /// Trailing STFT frames dropped to line up with the reference's
    /// framing convention (applied by the harness, not the transform)
    pub trim_trailing_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            frame_length_ms: 100.0,
            hop_size_ms: 20.0,
            num_bands: 30,
            fmin: 0.0,
            fmax: 22050.0,
            window: WindowShape::Hamming,
            tolerance: 0.01,
            trim_trailing_frames: 5,
        }
    }
}

/// Reference arrays for every compared stage, loaded up front
#[derive(Debug, Clone)]
pub struct ReferenceData {
    /// Decoded sample table
    pub samples: Vec<Vec<f32>>,
    /// Complex spectrogram table
    pub spectrogram: Vec<Vec<Complex<f32>>>,
    /// Filterbank weight table (bands × bins, either orientation)
    pub filter_weights: Vec<Vec<f32>>,
    /// Cepstral coefficient table
    pub cepstra: Vec<Vec<f32>>,
    /// Stacked [coefficients | deltas | delta-deltas] table
    pub delta_stack: Vec<Vec<f32>>,
}

impl ReferenceData {
    /// Load all reference tables from a directory
    ///
    /// Expects `wav.csv`, `fft.csv`, `melbank-<rate>.csv`, `dct.csv`
    /// and `mfcc.csv`.
    pub fn load<P: AsRef<Path>>(dir: P, sample_rate: u32) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            samples: reference::load_matrix(dir.join("wav.csv"))?,
            spectrogram: reference::load_complex_matrix(dir.join("fft.csv"))?,
            filter_weights: reference::load_matrix(
                dir.join(format!("melbank-{}.csv", sample_rate)),
            )?,
            cepstra: reference::load_matrix(dir.join("dct.csv"))?,
            delta_stack: reference::load_matrix(dir.join("mfcc.csv"))?,
        })
    }
}

/// Outcome of one compared stage
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: &'static str,
    /// Largest absolute elementwise difference observed
    pub max_difference: f32,
}

/// Per-stage results of a completed conformance run
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub stages: Vec<StageResult>,
}

/// Drives the pipeline end-to-end against reference data
#[derive(Debug, Clone)]
pub struct ConformanceHarness {
    config: PipelineConfig,
}

impl ConformanceHarness {
    /// Create a harness with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and compare against the reference arrays
    ///
    /// Halts on the first violation; on success the report carries the
    /// maximum observed difference per stage.
    pub fn run(&self, signal: &Signal, reference: &ReferenceData) -> Result<ConformanceReport> {
        let cfg = &self.config;
        let mut report = ConformanceReport::default();

        if signal.sample_rate() != cfg.sample_rate {
            return Err(FeatureError::InvalidParameter(format!(
                "signal sample rate {} Hz does not match configured {} Hz",
                signal.sample_rate(),
                cfg.sample_rate
            )));
        }

        debug!(
            "conformance run: {} samples at {} Hz, tolerance {}",
            signal.num_samples(),
            signal.sample_rate(),
            cfg.tolerance
        );

        let produced_samples = vec![signal.samples().to_vec()];
        self.record(
            &mut report,
            "samples",
            compare_matrices("samples", &produced_samples, &reference.samples, cfg.tolerance)?,
        );

        let framed = FramedSignal::from_durations(
            signal,
            cfg.frame_length_ms,
            cfg.hop_size_ms,
            Origin::Right,
        )?;
        let stft = ShortTimeFourierTransform::from_frames(&framed, cfg.window);
        // the reference's enframe convention emits fewer frames; the
        // trim is the harness's compensation, not the transform's
        let stft = stft.trimmed(stft.num_frames().saturating_sub(cfg.trim_trailing_frames));
        self.record(
            &mut report,
            "spectrogram",
            compare_matrices(
                "spectrogram",
                stft.frames(),
                &reference.spectrogram,
                cfg.tolerance,
            )?,
        );

        let weights = orient_weights(reference.filter_weights.clone(), stft.num_bins());
        let filterbank = Filterbank::from_weights(weights, stft.bin_frequencies().to_vec())?;
        let mfcc = Mfcc::from_stft(&stft, &filterbank, LOG_MUL, LOG_ADD)?;
        self.record(
            &mut report,
            "cepstra",
            compare_matrices("cepstra", mfcc.coefficients(), &reference.cepstra, cfg.tolerance)?,
        );

        let stack = mfcc.delta_stack();
        self.record(
            &mut report,
            "delta stack",
            compare_matrices("delta stack", &stack, &reference.delta_stack, cfg.tolerance)?,
        );

        // consistency laws linking the stack's slices to the standalone
        // dynamics outputs
        let num_bands = mfcc.num_bands();
        let deltas = mfcc.deltas();
        let stack_deltas: Vec<Vec<f32>> = stack
            .iter()
            .map(|row| row[num_bands..2 * num_bands].to_vec())
            .collect();
        self.record(
            &mut report,
            "delta identity",
            compare_matrices("delta identity", &stack_deltas, &deltas, cfg.tolerance)?,
        );

        // the first and last frame of the stack's delta-deltas diverge
        // by construction; only interior frames are checked
        if stack.len() > 2 {
            let delta_deltas = mfcc.delta_deltas();
            let interior_stack: Vec<Vec<f32>> = stack[1..stack.len() - 1]
                .iter()
                .map(|row| row[2 * num_bands..].to_vec())
                .collect();
            let interior = delta_deltas[1..delta_deltas.len() - 1].to_vec();
            self.record(
                &mut report,
                "delta-delta identity",
                compare_matrices(
                    "delta-delta identity",
                    &interior_stack,
                    &interior,
                    cfg.tolerance,
                )?,
            );
        }

        Ok(report)
    }

    fn record(&self, report: &mut ConformanceReport, stage: &'static str, max_difference: f32) {
        info!(
            "stage `{}` passed (max |difference| = {:e})",
            stage, max_difference
        );
        report.stages.push(StageResult {
            stage,
            max_difference,
        });
    }
}

/// Elementwise absolute difference, the comparison metric
pub trait AbsDiff: Copy + fmt::Display {
    fn abs_diff(self, other: Self) -> f32;
}

impl AbsDiff for f32 {
    fn abs_diff(self, other: Self) -> f32 {
        (self - other).abs()
    }
}

impl AbsDiff for Complex<f32> {
    fn abs_diff(self, other: Self) -> f32 {
        (self - other).norm()
    }
}

/// Compare two arrays after canonicalizing orientation
///
/// If the reference's shape is the exact reverse of the produced
/// array's, the reference is transposed once before comparing. Returns
/// the maximum absolute difference on success; a difference strictly
/// greater than `tolerance` is a `ConformanceViolation`, any other
/// shape disagreement a `ShapeMismatch`.
pub fn compare_matrices<T: AbsDiff>(
    stage: &str,
    produced: &[Vec<T>],
    reference: &[Vec<T>],
    tolerance: f32,
) -> Result<f32> {
    let produced_shape = shape(produced);
    let reference_shape = shape(reference);

    let transposed;
    let reference = if reference_shape == produced_shape {
        reference
    } else if (reference_shape.1, reference_shape.0) == produced_shape {
        transposed = transpose(reference);
        &transposed
    } else {
        return Err(FeatureError::ShapeMismatch {
            expected: produced_shape,
            actual: reference_shape,
        });
    };

    let mut max_diff = 0.0_f32;
    for (row, (ours, theirs)) in produced.iter().zip(reference).enumerate() {
        for (col, (&p, &r)) in ours.iter().zip(theirs).enumerate() {
            let diff = p.abs_diff(r);
            if diff > tolerance {
                return Err(FeatureError::ConformanceViolation {
                    stage: stage.to_string(),
                    row,
                    col,
                    produced: format!("{}", p),
                    expected: format!("{}", r),
                    diff,
                    tolerance,
                    ours: render(produced),
                    theirs: render(reference),
                });
            }
            if diff > max_diff {
                max_diff = diff;
            }
        }
    }

    Ok(max_diff)
}

/// Shape of a row-major array as (rows, columns)
fn shape<T>(matrix: &[Vec<T>]) -> (usize, usize) {
    (matrix.len(), matrix.first().map(|r| r.len()).unwrap_or(0))
}

fn transpose<T: Copy>(matrix: &[Vec<T>]) -> Vec<Vec<T>> {
    let (rows, cols) = shape(matrix);
    (0..cols)
        .map(|c| (0..rows).map(|r| matrix[r][c]).collect())
        .collect()
}

/// Orient an external weight table so its columns line up with the
/// spectral bin count
fn orient_weights(weights: Vec<Vec<f32>>, num_bins: usize) -> Vec<Vec<f32>> {
    let (rows, cols) = shape(&weights);
    if cols != num_bins && rows == num_bins {
        transpose(&weights)
    } else {
        weights
    }
}

/// Truncated numpy-style rendering for violation reports
fn render<T: fmt::Display>(matrix: &[Vec<T>]) -> String {
    const MAX: usize = 6;

    let mut out = String::from("[");
    for (i, row) in matrix.iter().take(MAX).enumerate() {
        if i > 0 {
            out.push_str(",\n ");
        }
        out.push('[');
        for (j, value) in row.iter().take(MAX).enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("{:.6}", value));
        }
        if row.len() > MAX {
            out.push_str(", ...");
        }
        out.push(']');
    }
    if matrix.len() > MAX {
        out.push_str(",\n ...");
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_tolerance_is_not_a_violation() {
        let produced = vec![vec![0.0_f32]];
        let reference = vec![vec![0.01_f32]];
        let max = compare_matrices("t", &produced, &reference, 0.01).unwrap();
        assert_relative_eq!(max, 0.01, epsilon = 1e-7);
    }

    #[test]
    fn test_just_over_tolerance_violates() {
        let produced = vec![vec![0.0_f32]];
        let reference = vec![vec![0.011_f32]];
        let err = compare_matrices("t", &produced, &reference, 0.01).unwrap_err();
        match err {
            FeatureError::ConformanceViolation {
                stage, row, col, ..
            } => {
                assert_eq!(stage, "t");
                assert_eq!((row, col), (0, 0));
            }
            other => panic!("expected ConformanceViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_transposed_reference_is_canonicalized() {
        let produced = vec![vec![1.0_f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let reference = vec![vec![1.0_f32, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]];
        let max = compare_matrices("t", &produced, &reference, 0.01).unwrap();
        assert_relative_eq!(max, 0.0, epsilon = 1e-7);
    }

    #[test]
    fn test_other_shapes_are_shape_mismatch() {
        let produced = vec![vec![1.0_f32, 2.0], vec![3.0, 4.0]];
        let reference = vec![vec![1.0_f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let err = compare_matrices("t", &produced, &reference, 0.01).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::ShapeMismatch {
                expected: (2, 2),
                actual: (2, 3),
            }
        ));
    }

    #[test]
    fn test_complex_difference_uses_magnitude() {
        let produced = vec![vec![Complex::new(1.0_f32, 1.0)]];
        // difference of 0.01 in each component: magnitude ~0.0141 > 0.01
        let reference = vec![vec![Complex::new(1.01_f32, 1.01)]];
        assert!(compare_matrices("t", &produced, &reference, 0.01).is_err());
        assert!(compare_matrices("t", &produced, &reference, 0.015).is_ok());
    }

    #[test]
    fn test_orient_weights_transposes_when_needed() {
        // 3 bins, 2 bands, supplied bins × bands
        let weights = vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]];
        let oriented = orient_weights(weights, 3);
        assert_eq!(shape(&oriented), (2, 3));
        assert_eq!(oriented[0], vec![1.0, 2.0, 3.0]);

        // already bands × bins: untouched
        let weights = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        assert_eq!(shape(&orient_weights(weights, 3)), (2, 3));
    }

    #[test]
    fn test_render_truncates() {
        let matrix = vec![vec![0.0_f32; 10]; 10];
        let rendered = render(&matrix);
        assert!(rendered.contains("..."));
        assert!(rendered.len() < 1000);
    }

    #[test]
    fn test_default_config_matches_reference_scenario() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.sample_rate, 44100.0);
        assert_eq!(
            (cfg.sample_rate * cfg.frame_length_ms / 1000.0) as usize,
            4410
        );
        assert_eq!((cfg.sample_rate * cfg.hop_size_ms / 1000.0) as usize, 882);
        assert_eq!(cfg.num_bands, 30);
        assert_eq!(cfg.tolerance, 0.01);
        assert_eq!(cfg.trim_trailing_frames, 5);
    }
}
