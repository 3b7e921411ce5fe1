//! PCM Buffer Model
//!
//! In-memory decoded audio: one `Vec<f32>` per channel plus the source
//! sample rate. Samples are nominally in [-1, 1] but may exceed that range
//! until they are clamped by the 16-bit WAV path.

use crate::error::{MirrorError, Result};

/// Decoded multi-channel audio
///
/// Every channel holds the same number of frames. The sample rate is fixed
/// at construction; buffers derived from a source (reversed copies,
/// extracted windows) inherit it.
///
/// # Example
/// ```
/// use mirrorwave::engine::PcmBuffer;
///
/// let buffer = PcmBuffer::silence(2, 44100, 44100).unwrap();
/// assert_eq!(buffer.channel_count(), 2);
/// assert_eq!(buffer.frame_count(), 44100);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from per-channel sample data
    ///
    /// # Errors
    /// * `InvalidBuffer` - no channels, zero sample rate, or channels of
    ///   differing length
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(MirrorError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        if sample_rate == 0 {
            return Err(MirrorError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let frames = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frames)
        {
            return Err(MirrorError::InvalidBuffer {
                reason: format!(
                    "channel {} has {} frames, expected {}",
                    index,
                    channel.len(),
                    frames
                ),
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a zeroed buffer
    pub fn silence(channel_count: usize, frame_count: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![vec![0.0; frame_count]; channel_count], sample_rate)
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ...)
    pub fn from_interleaved(
        interleaved: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(MirrorError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        if interleaved.len() % channel_count != 0 {
            return Err(MirrorError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channel_count
                ),
            });
        }

        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];

        for frame in interleaved.chunks_exact(channel_count) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channel_count() * self.frame_count());

        for frame in 0..self.frame_count() {
            for channel in &self.channels {
                interleaved.push(channel[frame]);
            }
        }

        interleaved
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Get a channel's samples
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Build a buffer at this buffer's sample rate from already-validated
    /// channel data
    pub(crate) fn derive(&self, channels: Vec<Vec<f32>>) -> Self {
        debug_assert_eq!(channels.len(), self.channel_count());
        Self {
            channels,
            sample_rate: self.sample_rate,
        }
    }
}
