//! Mirrorwave - Mirrored Track Editor
//!
//! Loads one audio track, derives its time-reversed twin, and keeps a
//! selected window on both in sync:
//! 1. Engine - PCM buffers, reversal, extraction, WAV framing, transport
//! 2. Window - the selected window and its mirror on the reversed track
//! 3. Sync - the session that turns user events into display effects
//! 4. Export - windowed WAV/MP3 files for either track
//!
//! # Mirror rule
//!
//! For a track of duration `D`, the window `[s, e]` on the original track
//! corresponds to `[D - e, D - s]` on the reversed track.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod sync;
pub mod window;

pub use error::{MirrorError, Result};
