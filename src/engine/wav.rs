//! WAV encoding and decoding
//!
//! The encoder frames the canonical 44-byte RIFF/WAVE layout by hand so the
//! output is bit-exact for downstream encoders that parse it as an input
//! container. Decoding goes through `hound`.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::engine::buffer::PcmBuffer;
use crate::error::{MirrorError, Result};

/// Size of the canonical RIFF/WAVE header in bytes
pub const WAV_HEADER_LEN: usize = 44;

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;

/// Sample encoding of a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// Signed 16-bit integer PCM, clamped to [-1, 1]
    Int16,
    /// IEEE-754 32-bit float, written unclamped
    Float32,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        self.bits() as usize / 8
    }

    fn format_tag(self) -> u16 {
        match self {
            BitDepth::Int16 => FORMAT_PCM,
            BitDepth::Float32 => FORMAT_IEEE_FLOAT,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = MirrorError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            16 => Ok(BitDepth::Int16),
            32 => Ok(BitDepth::Float32),
            _ => Err(MirrorError::UnsupportedFormat {
                format: format!("{}-bit WAV (only 16 and 32 supported)", bits),
            }),
        }
    }
}

/// Quantize a float sample to 16 bits
///
/// Negative samples scale by 32768 and non-negative by 32767, and the
/// result truncates toward zero. NaN maps to 0.
#[inline]
pub fn quantize_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Inverse of [`quantize_i16`] up to quantization error
#[inline]
pub fn dequantize_i16(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

/// Encode a buffer as a RIFF/WAVE byte sequence
///
/// Frames are channel-interleaved. The data chunk holds
/// `frame_count * channel_count * bytes_per_sample` bytes.
///
/// # Example
/// ```
/// use mirrorwave::engine::{encode_wav, BitDepth, PcmBuffer};
///
/// let buffer = PcmBuffer::new(vec![vec![0.0; 10], vec![0.0; 10]], 44100).unwrap();
/// let bytes = encode_wav(&buffer, BitDepth::Int16);
/// assert_eq!(bytes.len(), 44 + 10 * 2 * 2);
/// assert_eq!(&bytes[0..4], b"RIFF");
/// ```
pub fn encode_wav(buffer: &PcmBuffer, depth: BitDepth) -> Vec<u8> {
    let channels = buffer.channel_count();
    let block_align = channels * depth.bytes_per_sample();
    let data_len = buffer.frame_count() * block_align;
    let byte_rate = buffer.sample_rate() as usize * block_align;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&depth.format_tag().to_le_bytes());
    out.extend_from_slice(&(channels as u16).to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    out.extend_from_slice(&(byte_rate as u32).to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&depth.bits().to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());

    for sample in buffer.to_interleaved() {
        match depth {
            BitDepth::Int16 => out.extend_from_slice(&quantize_i16(sample).to_le_bytes()),
            BitDepth::Float32 => out.extend_from_slice(&sample.to_le_bytes()),
        }
    }

    out
}

/// Decode WAV bytes into a buffer
///
/// # Errors
/// * `Decode` - if the bytes are not a readable WAV stream
/// * `UnsupportedFormat` - for integer bit depths other than 8/16/24/32
pub fn decode_wav(bytes: &[u8]) -> Result<PcmBuffer> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| MirrorError::Decode {
        reason: format!("Failed to parse WAV data: {}", e),
        source: Some(Box::new(e)),
    })?;

    decode_reader(reader)
}

/// Read and decode a WAV file from disk
pub fn decode_wav_file(path: &Path) -> Result<PcmBuffer> {
    if !path.exists() {
        return Err(MirrorError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let bytes = std::fs::read(path)?;
    decode_wav(&bytes)
}

fn decode_reader<R: std::io::Read>(reader: WavReader<R>) -> Result<PcmBuffer> {
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 {
        return Err(MirrorError::Decode {
            reason: "WAV header declares zero channels".to_string(),
            source: None,
        });
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    PcmBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)
}

fn decode_failed(e: hound::Error) -> MirrorError {
    MirrorError::Decode {
        reason: format!("Failed to read samples: {}", e),
        source: Some(Box::new(e)),
    }
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(dequantize_i16))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed),
        (SampleFormat::Int, bits) => Err(MirrorError::UnsupportedFormat {
            format: format!("{}-bit integer audio", bits),
        }),
    }
}
