//! Session configuration
//!
//! JSON file, every field optional:
//!
//! ```json
//! { "min_window_secs": 1.0, "initial_window_secs": 10.0, "default_bitrate_kbps": 320 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};
use crate::export::DEFAULT_BITRATE_KBPS;

/// Largest accepted source file (50 MiB)
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 50 * 1024 * 1024;

/// Editor and export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Smallest window a resize may produce, in seconds
    pub min_window_secs: f64,
    /// Width of the selection created when a track finishes decoding
    pub initial_window_secs: f64,
    /// Lossy encoder bitrate used when an export does not set one
    pub default_bitrate_kbps: u32,
    pub max_source_bytes: u64,
    /// Lowercase file extensions accepted as sources
    pub allowed_extensions: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_window_secs: 1.0,
            initial_window_secs: 10.0,
            default_bitrate_kbps: DEFAULT_BITRATE_KBPS,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            allowed_extensions: ["wav", "mp3", "flac", "mp4", "m4a"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl SessionConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MirrorError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }

        let content = fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_window_secs.is_finite() && self.min_window_secs > 0.0) {
            return Err(MirrorError::InvalidConfig {
                reason: format!("min_window_secs must be positive, got {}", self.min_window_secs),
            });
        }
        if !(self.initial_window_secs.is_finite() && self.initial_window_secs > 0.0) {
            return Err(MirrorError::InvalidConfig {
                reason: format!(
                    "initial_window_secs must be positive, got {}",
                    self.initial_window_secs
                ),
            });
        }
        if self.default_bitrate_kbps == 0 {
            return Err(MirrorError::InvalidConfig {
                reason: "default_bitrate_kbps must be positive".to_string(),
            });
        }
        if self.max_source_bytes == 0 {
            return Err(MirrorError::InvalidConfig {
                reason: "max_source_bytes must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Check a source file's name and size against the accepted types
    ///
    /// # Errors
    /// * `UnsupportedFormat` - extension missing or not allowed
    /// * `SourceTooLarge` - `size` exceeds `max_source_bytes`
    pub fn validate_source(&self, file_name: &str, size: u64) -> Result<()> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if self.allowed_extensions.iter().any(|allowed| *allowed == ext) => {}
            _ => {
                return Err(MirrorError::UnsupportedFormat {
                    format: file_name.to_string(),
                })
            }
        }

        if size > self.max_source_bytes {
            return Err(MirrorError::SourceTooLarge {
                size,
                max: self.max_source_bytes,
            });
        }

        Ok(())
    }
}
