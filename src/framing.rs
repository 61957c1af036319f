//! Signal framing
//!
//! Slices a Signal into overlapping fixed-length frames. The `Right`
//! alignment reproduces the reference library's rounding rule exactly:
//! `floor((N - L) / H) + 1` frames, trailing samples that do not complete
//! a frame are discarded, and no zero padding is applied.

use crate::{FeatureError, Result, Signal};

/// Alignment of a frame relative to its reference sample index
///
/// With hop size H, frame `i` has reference sample `i * H`:
/// - `Right`: the frame starts at the reference sample and extends
///   forward; only complete frames are emitted (reference default).
/// - `Center`: the frame is centered on the reference sample;
///   out-of-range samples are zero.
/// - `Left`: the frame ends at (and includes) the reference sample;
///   out-of-range samples are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    Left,
    Center,
    #[default]
    Right,
}

/// Overlapping fixed-length frames over one Signal
#[derive(Debug, Clone)]
pub struct FramedSignal {
    frames: Vec<Vec<f32>>,
    frame_size: usize,
    hop_size: usize,
    origin: Origin,
    sample_rate: f32,
}

impl FramedSignal {
    /// Frame a signal with explicit sample counts
    ///
    /// # Arguments
    /// * `signal` - Input signal
    /// * `frame_size` - Frame length in samples
    /// * `hop_size` - Hop between consecutive frames in samples
    /// * `origin` - Alignment policy
    ///
    /// # Errors
    /// `InvalidParameter` if `frame_size` or `hop_size` is zero, or the
    /// frame is longer than the signal.
    pub fn new(
        signal: &Signal,
        frame_size: usize,
        hop_size: usize,
        origin: Origin,
    ) -> Result<Self> {
        if frame_size == 0 {
            return Err(FeatureError::InvalidParameter(
                "frame size must be positive".to_string(),
            ));
        }
        if hop_size == 0 {
            return Err(FeatureError::InvalidParameter(
                "hop size must be positive".to_string(),
            ));
        }

        let samples = signal.samples();
        let n = samples.len();
        if frame_size > n {
            return Err(FeatureError::InvalidParameter(format!(
                "frame size {} exceeds signal length {}",
                frame_size, n
            )));
        }

        // the alignment only shifts the window; the frame count is
        // floor((N - L) / H) + 1 in every case
        let num_frames = (n - frame_size) / hop_size + 1;
        let offset = match origin {
            Origin::Right => 0,
            Origin::Center => (frame_size / 2) as isize,
            Origin::Left => frame_size as isize - 1,
        };

        let frames = (0..num_frames)
            .map(|i| {
                let start = (i * hop_size) as isize - offset;
                if start >= 0 {
                    samples[start as usize..start as usize + frame_size].to_vec()
                } else {
                    (start..start + frame_size as isize)
                        .map(|idx| if idx < 0 { 0.0 } else { samples[idx as usize] })
                        .collect()
                }
            })
            .collect();

        Ok(Self {
            frames,
            frame_size,
            hop_size,
            origin,
            sample_rate: signal.sample_rate(),
        })
    }

    /// Frame a signal using millisecond durations
    ///
    /// Frame and hop sizes are derived as `floor(sample_rate * ms / 1000)`
    /// and must come out positive.
    pub fn from_durations(
        signal: &Signal,
        frame_length_ms: f32,
        hop_size_ms: f32,
        origin: Origin,
    ) -> Result<Self> {
        let frame_size = (signal.sample_rate() * frame_length_ms / 1000.0) as usize;
        let hop_size = (signal.sample_rate() * hop_size_ms / 1000.0) as usize;

        if frame_size == 0 || hop_size == 0 {
            return Err(FeatureError::InvalidParameter(format!(
                "frame length {} ms / hop {} ms yield no samples at {} Hz",
                frame_length_ms,
                hop_size_ms,
                signal.sample_rate()
            )));
        }

        Self::new(signal, frame_size, hop_size, origin)
    }

    /// Get the number of frames
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Get the frame length in samples
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Get the hop size in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Get the alignment policy used
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Get the sample rate of the underlying signal
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Get all frames
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    /// Get a single frame
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        self.frames.get(index).map(|f| f.as_slice())
    }
}
