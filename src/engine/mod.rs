//! Audio Engine Module
//!
//! Core audio plumbing:
//! - PCM buffer model
//! - Reverse and extract transforms
//! - WAV encoding/decoding
//! - Processing context cache
//! - Playback transport

pub mod buffer;
pub mod context;
pub mod transform;
pub mod transport;
pub mod wav;

pub use buffer::PcmBuffer;
pub use context::{ContextCache, ContextFactory, PlaybackContext, PlaybackContextFactory};
pub use transform::{extract, resample_linear, reverse};
pub use transport::{PlaybackAction, PlaybackPlan, Transport, TransportState};
pub use wav::{decode_wav, decode_wav_file, encode_wav, BitDepth};
