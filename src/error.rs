//! Error handling for Mirrorwave
//!
//! Every fallible operation in the crate returns [`MirrorError`]. Errors are
//! reported once and never retried.

use thiserror::Error;

/// Result type alias for Mirrorwave operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Main error type for Mirrorwave operations
#[derive(Error, Debug)]
pub enum MirrorError {
    // Source Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Could not decode audio: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Source too large: {size} bytes (maximum {max} bytes)")]
    SourceTooLarge { size: u64, max: u64 },

    #[error("Invalid buffer: {reason}")]
    InvalidBuffer { reason: String },

    // Window Errors
    #[error("Range error: {reason}")]
    Range { reason: String },

    #[error("No audio loaded")]
    NotLoaded,

    // Export Errors
    #[error("Encoding failed: {reason}")]
    Encode { reason: String },

    #[error("Could not create processing context at {sample_rate} Hz: {reason}")]
    ContextCreation { sample_rate: u32, reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MirrorError {
    /// Shorthand for a [`MirrorError::Range`] error
    pub fn range(reason: impl Into<String>) -> Self {
        MirrorError::Range {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`MirrorError::Encode`] error
    pub fn encode(reason: impl Into<String>) -> Self {
        MirrorError::Encode {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MirrorError::FileNotFound { .. } => "FILE_NOT_FOUND",
            MirrorError::Decode { .. } => "DECODE_ERROR",
            MirrorError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            MirrorError::SourceTooLarge { .. } => "SOURCE_TOO_LARGE",
            MirrorError::InvalidBuffer { .. } => "INVALID_BUFFER",
            MirrorError::Range { .. } => "RANGE_ERROR",
            MirrorError::NotLoaded => "NOT_LOADED",
            MirrorError::Encode { .. } => "ENCODE_ERROR",
            MirrorError::ContextCreation { .. } => "CONTEXT_CREATION_ERROR",
            MirrorError::InvalidConfig { .. } => "INVALID_CONFIG",
            MirrorError::Io(_) => "IO_ERROR",
            MirrorError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can recover by picking another file or setting
    ///
    /// A range error past the sync engine is an internal invariant
    /// violation, so it is not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MirrorError::FileNotFound { .. }
                | MirrorError::Decode { .. }
                | MirrorError::UnsupportedFormat { .. }
                | MirrorError::SourceTooLarge { .. }
                | MirrorError::NotLoaded
                | MirrorError::Encode { .. }
                | MirrorError::InvalidConfig { .. }
        )
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            MirrorError::Decode { .. } => {
                "This file couldn't be read as audio. Try converting it to WAV first.".to_string()
            }
            MirrorError::UnsupportedFormat { format } => {
                format!("'{}' isn't supported. Please select an audio file.", format)
            }
            MirrorError::SourceTooLarge { max, .. } => {
                format!("File too large. Maximum size is {}MB.", max / (1024 * 1024))
            }
            MirrorError::Encode { reason } => {
                format!("Export failed while encoding: {}", reason)
            }
            MirrorError::NotLoaded => "Load an audio file first.".to_string(),
            _ => self.to_string(),
        }
    }
}
