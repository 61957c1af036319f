//! Signal type for decoded audio data
//!
//! A Signal holds a mono sequence of single-precision samples plus the
//! sample rate. Decoding supports WAV, MP3, FLAC and OGG; multi-channel
//! files are downmixed to mono by averaging and integer formats are
//! normalized to [-1, 1]. A Signal is immutable once constructed.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{FeatureError, Result};

/// Mono audio samples with associated sample rate
#[derive(Debug, Clone)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl Signal {
    /// Create a Signal from raw samples
    ///
    /// # Example
    /// ```
    /// use mfcc_core::Signal;
    ///
    /// let signal = Signal::from_samples(vec![0.0, 0.5, 1.0, 0.5], 44100.0);
    /// assert_eq!(signal.sample_rate(), 44100.0);
    /// ```
    pub fn from_samples(samples: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Load a Signal from an audio file (WAV, MP3, FLAC, OGG)
    ///
    /// Multi-channel files are downmixed to mono by averaging channels.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        match Self::from_file_symphonia(path) {
            Ok(signal) => return Ok(signal),
            Err(_) => {
                // Fall back to hound for WAV files
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().to_lowercase() == "wav" {
                        return Self::from_file_wav(path);
                    }
                }
            }
        }

        // Not a WAV: surface the symphonia error
        Self::from_file_symphonia(path)
    }

    /// Load any supported format using symphonia
    fn from_file_symphonia<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(FeatureError::Io)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension() {
            hint.with_extension(&ext.to_string_lossy());
        }

        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| FeatureError::Decode(format!("failed to probe audio format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| FeatureError::Decode("no audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| FeatureError::Decode("unknown sample rate".to_string()))?
            as f32;
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

        let decoder_opts = DecoderOptions::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &decoder_opts)
            .map_err(|e| FeatureError::Decode(format!("failed to create decoder: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(FeatureError::Decode(format!("error reading packet: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
                Err(e) => {
                    return Err(FeatureError::Decode(format!("decode error: {}", e)));
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();

            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            downmix_into(&mut samples, sample_buf.samples(), channels);
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Load a WAV file using hound
    fn from_file_wav<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let sample_rate = spec.sample_rate as f32;
        let channels = spec.channels as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let max_value = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_value))
                    .collect::<std::result::Result<_, _>>()?
            }
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
        };

        let mut samples = Vec::with_capacity(interleaved.len() / channels);
        downmix_into(&mut samples, &interleaved, channels);

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Get the sample rate in Hz
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get the number of samples
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Get the total duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate
    }

    /// Create a pure tone (sine wave)
    ///
    /// # Arguments
    /// * `frequency` - Frequency in Hz
    /// * `duration` - Duration in seconds
    /// * `sample_rate` - Sample rate in Hz
    /// * `amplitude` - Peak amplitude
    pub fn create_tone(frequency: f32, duration: f32, sample_rate: f32, amplitude: f32) -> Self {
        let n_samples = (duration * sample_rate).round() as usize;
        let omega = 2.0 * std::f32::consts::PI * frequency / sample_rate;

        let samples: Vec<f32> = (0..n_samples)
            .map(|i| amplitude * (omega * i as f32).sin())
            .collect();

        Self {
            samples,
            sample_rate,
        }
    }
}

/// Append interleaved samples to `out`, averaging channels to mono
fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
    } else {
        for chunk in interleaved.chunks(channels) {
            let sum: f32 = chunk.iter().sum();
            out.push(sum / channels as f32);
        }
    }
}
