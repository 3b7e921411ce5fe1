//! Buffer transforms
//!
//! Time-axis reversal and windowed extraction. Both produce new buffers and
//! leave the input untouched.

use log::debug;

use crate::engine::buffer::PcmBuffer;
use crate::error::{MirrorError, Result};

/// Reverse a buffer along the time axis
///
/// Output sample `i` of every channel is input sample `n - 1 - i`.
///
/// # Example
/// ```
/// use mirrorwave::engine::{reverse, PcmBuffer};
///
/// let buffer = PcmBuffer::new(vec![vec![0.1, 0.2, 0.3]], 8000).unwrap();
/// assert_eq!(reverse(&buffer).channel(0), &[0.3, 0.2, 0.1]);
/// ```
pub fn reverse(buffer: &PcmBuffer) -> PcmBuffer {
    let channels = buffer
        .channels()
        .iter()
        .map(|channel| channel.iter().rev().copied().collect())
        .collect();

    buffer.derive(channels)
}

/// Extract the frames between `start` and `end` seconds
///
/// `start_sample = floor(start * rate)` and `end_sample = floor(end * rate)`.
/// The window is not clamped here; bounds are the caller's responsibility.
///
/// # Errors
/// * `Range` - if `start_sample < 0`, `end_sample > frame_count`, the window
///   is empty or inverted, or a bound is not finite
pub fn extract(buffer: &PcmBuffer, start: f64, end: f64) -> Result<PcmBuffer> {
    if !start.is_finite() || !end.is_finite() {
        return Err(MirrorError::range(format!(
            "window bounds must be finite (start {}, end {})",
            start, end
        )));
    }

    let rate = buffer.sample_rate() as f64;
    let start_sample = (start * rate).floor() as i64;
    let end_sample = (end * rate).floor() as i64;
    let frame_count = buffer.frame_count() as i64;

    if start_sample < 0 {
        return Err(MirrorError::range(format!(
            "start sample {} is before the buffer start",
            start_sample
        )));
    }

    if end_sample > frame_count {
        return Err(MirrorError::range(format!(
            "end sample {} is past the buffer end ({} frames)",
            end_sample, frame_count
        )));
    }

    if end_sample - start_sample <= 0 {
        return Err(MirrorError::range(format!(
            "window [{:.3}s, {:.3}s] has no frames",
            start, end
        )));
    }

    let (from, to) = (start_sample as usize, end_sample as usize);
    debug!(
        "Extracting frames {}..{} ({} channels @ {} Hz)",
        from,
        to,
        buffer.channel_count(),
        buffer.sample_rate()
    );

    let channels = buffer
        .channels()
        .iter()
        .map(|channel| channel[from..to].to_vec())
        .collect();

    Ok(buffer.derive(channels))
}

/// Linear interpolation resampling of one channel
///
/// Only used to bring a buffer to a rate an encoder accepts; linear
/// interpolation aliases when downsampling.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() || source_rate == target_rate {
        return samples.to_vec();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;

    (0..target_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let src_idx = src_pos.floor() as usize;
            let frac = (src_pos - src_idx as f64) as f32;

            if src_idx + 1 < source_len {
                samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
            } else {
                samples[source_len - 1]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ramp(frames: usize, sample_rate: u32) -> PcmBuffer {
        let left: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        PcmBuffer::new(vec![left, right], sample_rate).unwrap()
    }

    #[test]
    fn test_reverse_maps_indices() {
        let buffer = ramp(5, 10);
        let reversed = reverse(&buffer);

        for ch in 0..2 {
            for i in 0..5 {
                assert_eq!(reversed.channel(ch)[i], buffer.channel(ch)[4 - i]);
            }
        }
        assert_eq!(reversed.sample_rate(), 10);
    }

    #[test_case(0 ; "empty")]
    #[test_case(1 ; "single frame")]
    #[test_case(6 ; "even length")]
    #[test_case(7 ; "odd length")]
    fn test_reverse_involution(frames: usize) {
        let buffer = ramp(frames, 100);
        assert_eq!(reverse(&reverse(&buffer)), buffer);
    }

    #[test]
    fn test_extract_frame_count() {
        let buffer = ramp(1000, 100);
        let window = extract(&buffer, 1.255, 3.5).unwrap();

        // floor(350) - floor(125.5)
        assert_eq!(window.frame_count(), 350 - 125);
        assert_eq!(window.channel(0)[0], buffer.channel(0)[125]);
        assert_eq!(window.channel(1)[0], buffer.channel(1)[125]);
    }

    #[test]
    fn test_extract_whole_buffer() {
        let buffer = ramp(400, 100);
        assert_eq!(extract(&buffer, 0.0, 4.0).unwrap(), buffer);
    }

    #[test_case(2.0, 2.0 ; "empty window")]
    #[test_case(3.0, 2.0 ; "inverted window")]
    #[test_case(-0.5, 2.0 ; "negative start")]
    #[test_case(1.0, 4.01 ; "past the end")]
    #[test_case(f64::NAN, 2.0 ; "nan start")]
    fn test_extract_rejects(start: f64, end: f64) {
        let buffer = ramp(400, 100);
        match extract(&buffer, start, end) {
            Err(MirrorError::Range { .. }) => {}
            other => panic!("Expected Range error, got: {:?}", other),
        }
    }

    #[test]
    fn test_resample_linear_upsample() {
        let resampled = resample_linear(&[0.0, 1.0, 0.0], 100, 200);
        assert_eq!(resampled.len(), 6);
        assert!((resampled[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_linear_same_rate() {
        assert_eq!(resample_linear(&[0.1, 0.2], 44100, 44100), vec![0.1, 0.2]);
    }

    #[test]
    fn test_extract_sub_sample_window_is_empty() {
        // Both bounds floor to the same sample.
        let buffer = ramp(400, 100);
        assert!(extract(&buffer, 1.001, 1.009).is_err());
    }
}
