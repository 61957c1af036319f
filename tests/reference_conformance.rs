//! Integration tests for the conformance harness
//!
//! The externally generated fixtures (a test recording plus one
//! reference table per stage) are large and not committed; the fixture
//! test skips when they are absent. The remaining tests build reference
//! data from the pipeline's own outputs, which exercises the harness
//! end-to-end without external data: a pipeline must conform to itself,
//! and must stop conforming the moment a reference value is disturbed.

use std::path::Path;

use mfcc_core::cepstrogram::{LOG_ADD, LOG_MUL};
use mfcc_core::framing::Origin;
use mfcc_core::{
    ConformanceHarness, FeatureError, Filterbank, FramedSignal, Mfcc, PipelineConfig,
    ReferenceData, ShortTimeFourierTransform, Signal,
};

/// A configuration small enough for fast tests
fn small_config() -> PipelineConfig {
    PipelineConfig {
        sample_rate: 8000.0,
        frame_length_ms: 16.0,
        hop_size_ms: 4.0,
        num_bands: 8,
        fmin: 0.0,
        fmax: 4000.0,
        tolerance: 0.01,
        trim_trailing_frames: 2,
        ..PipelineConfig::default()
    }
}

fn test_signal(config: &PipelineConfig) -> Signal {
    Signal::create_tone(440.0, 0.5, config.sample_rate, 0.8)
}

/// Build reference tables by running the pipeline itself
fn reference_from_pipeline(signal: &Signal, config: &PipelineConfig) -> ReferenceData {
    let framed = FramedSignal::from_durations(
        signal,
        config.frame_length_ms,
        config.hop_size_ms,
        Origin::Right,
    )
    .unwrap();
    let stft = ShortTimeFourierTransform::from_frames(&framed, config.window);
    let stft = stft.trimmed(stft.num_frames() - config.trim_trailing_frames);

    let filterbank = Filterbank::mel(
        config.num_bands,
        config.fmin,
        config.fmax,
        stft.bin_frequencies().to_vec(),
        true,
    )
    .unwrap();
    let mfcc = Mfcc::from_stft(&stft, &filterbank, LOG_MUL, LOG_ADD).unwrap();

    ReferenceData {
        // stored as a column vector: the harness must canonicalize
        // orientation before comparing
        samples: signal.samples().iter().map(|&s| vec![s]).collect(),
        spectrogram: stft.frames().to_vec(),
        filter_weights: filterbank.weights().to_vec(),
        cepstra: mfcc.coefficients().to_vec(),
        delta_stack: mfcc.delta_stack(),
    }
}

#[test]
fn test_self_conformance_passes() {
    let config = small_config();
    let signal = test_signal(&config);
    let reference = reference_from_pipeline(&signal, &config);

    let harness = ConformanceHarness::new(config);
    let report = harness.run(&signal, &reference).expect("self-conformance failed");

    assert_eq!(report.stages.len(), 6);
    for stage in &report.stages {
        assert!(
            stage.max_difference <= 1e-6,
            "stage `{}`: unexpected difference {}",
            stage.stage,
            stage.max_difference
        );
    }
}

#[test]
fn test_default_scenario_self_conformance() {
    // the reference scenario's parameters: 44100 Hz, 100 ms frames,
    // 20 ms hop, 30 bands over [0, 22050] Hz
    let config = PipelineConfig::default();
    let signal = Signal::create_tone(440.0, 0.5, config.sample_rate, 0.8);
    let reference = reference_from_pipeline(&signal, &config);

    let harness = ConformanceHarness::new(config);
    let report = harness.run(&signal, &reference).expect("self-conformance failed");
    assert_eq!(report.stages.len(), 6);
}

#[test]
fn test_perturbed_reference_violates() {
    let config = small_config();
    let signal = test_signal(&config);
    let mut reference = reference_from_pipeline(&signal, &config);

    // one corrupted value must fail the run at the cepstral stage
    reference.cepstra[3][2] += 1.0;

    let harness = ConformanceHarness::new(config);
    match harness.run(&signal, &reference) {
        Err(FeatureError::ConformanceViolation { stage, row, col, .. }) => {
            assert_eq!(stage, "cepstra");
            assert_eq!((row, col), (3, 2));
        }
        other => panic!("expected ConformanceViolation, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_perturbed_spectrogram_halts_before_later_stages() {
    let config = small_config();
    let signal = test_signal(&config);
    let mut reference = reference_from_pipeline(&signal, &config);

    reference.spectrogram[0][4] += 1.0;
    // also corrupt a later stage; the earlier violation must win
    reference.delta_stack[0][0] += 1.0;

    let harness = ConformanceHarness::new(config);
    match harness.run(&signal, &reference) {
        Err(FeatureError::ConformanceViolation { stage, .. }) => {
            assert_eq!(stage, "spectrogram");
        }
        other => panic!("expected ConformanceViolation, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_truncated_reference_is_shape_mismatch() {
    let config = small_config();
    let signal = test_signal(&config);
    let mut reference = reference_from_pipeline(&signal, &config);

    // dropping a row is not a transpose; it must not silently pass
    reference.delta_stack.pop();

    let harness = ConformanceHarness::new(config);
    match harness.run(&signal, &reference) {
        Err(FeatureError::ShapeMismatch { .. }) => {}
        other => panic!("expected ShapeMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_transposed_reference_tables_still_conform() {
    let config = small_config();
    let signal = test_signal(&config);
    let mut reference = reference_from_pipeline(&signal, &config);

    // store the cepstra in the other orientation, as a foreign
    // implementation might
    let rows = reference.cepstra.len();
    let cols = reference.cepstra[0].len();
    let transposed: Vec<Vec<f32>> = (0..cols)
        .map(|c| (0..rows).map(|r| reference.cepstra[r][c]).collect())
        .collect();
    reference.cepstra = transposed;

    let harness = ConformanceHarness::new(config);
    harness
        .run(&signal, &reference)
        .expect("transposed reference should conform after canonicalization");
}

#[test]
fn test_reference_fixtures_conform() {
    let fixture_dir = Path::new("tests/fixtures");
    let audio = fixture_dir.join("tuba_ff.wav");
    if !audio.exists() {
        println!("skipping: no reference fixtures in tests/fixtures");
        return;
    }

    let config = PipelineConfig::default();
    let signal = Signal::from_file(&audio).expect("failed to load fixture recording");
    let reference = ReferenceData::load(fixture_dir, config.sample_rate as u32)
        .expect("failed to load reference tables");

    let harness = ConformanceHarness::new(config);
    let report = harness.run(&signal, &reference).expect("conformance run failed");

    for stage in &report.stages {
        println!(
            "{}: max |difference| = {:e}",
            stage.stage, stage.max_difference
        );
    }
}
