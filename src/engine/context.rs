//! Processing context cache
//!
//! Tracks that share a sample rate share one processing context. Contexts
//! are created lazily through an injected [`ContextFactory`] and cached by
//! sample rate. When creation at a specific rate fails, the cache falls back
//! to the factory's default context.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{MirrorError, Result};

/// Creates processing contexts for the cache
pub trait ContextFactory {
    type Context;

    /// Create a context running at `sample_rate`
    fn create(&self, sample_rate: u32) -> Result<Self::Context>;

    /// Create the fallback context used when rate-specific creation fails
    fn create_default(&self) -> Result<Self::Context>;
}

/// Cache of processing contexts keyed by sample rate
pub struct ContextCache<F: ContextFactory> {
    factory: F,
    contexts: HashMap<u32, Arc<F::Context>>,
    fallback: Option<Arc<F::Context>>,
}

impl<F: ContextFactory> ContextCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            contexts: HashMap::new(),
            fallback: None,
        }
    }

    /// Get the context for `sample_rate`, creating it on first use
    ///
    /// # Errors
    /// * `ContextCreation` - only when both the rate-specific and the
    ///   default context fail to be created
    pub fn acquire(&mut self, sample_rate: u32) -> Result<Arc<F::Context>> {
        if let Some(context) = self.contexts.get(&sample_rate) {
            return Ok(Arc::clone(context));
        }

        match self.factory.create(sample_rate) {
            Ok(context) => {
                debug!("Created processing context at {} Hz", sample_rate);
                let context = Arc::new(context);
                self.contexts.insert(sample_rate, Arc::clone(&context));
                Ok(context)
            }
            Err(err) => {
                warn!(
                    "Context creation at {} Hz failed ({}), using default context",
                    sample_rate, err
                );
                self.default_context()
            }
        }
    }

    fn default_context(&mut self) -> Result<Arc<F::Context>> {
        if let Some(context) = &self.fallback {
            return Ok(Arc::clone(context));
        }

        let context = Arc::new(self.factory.create_default()?);
        self.fallback = Some(Arc::clone(&context));
        Ok(context)
    }

    /// Number of rate-specific contexts held
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Playback context description handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackContext {
    pub sample_rate: u32,
    /// True when this is the fallback context rather than one created at
    /// the requested rate
    pub is_default: bool,
}

/// Factory producing [`PlaybackContext`]s for a fixed set of supported rates
#[derive(Debug, Clone)]
pub struct PlaybackContextFactory {
    supported_rates: Vec<u32>,
    default_rate: u32,
}

impl PlaybackContextFactory {
    pub fn new(supported_rates: Vec<u32>, default_rate: u32) -> Self {
        Self {
            supported_rates,
            default_rate,
        }
    }
}

impl Default for PlaybackContextFactory {
    fn default() -> Self {
        Self::new(
            vec![8000, 11025, 16000, 22050, 24000, 32000, 44100, 48000, 88200, 96000, 192000],
            48000,
        )
    }
}

impl ContextFactory for PlaybackContextFactory {
    type Context = PlaybackContext;

    fn create(&self, sample_rate: u32) -> Result<PlaybackContext> {
        if self.supported_rates.contains(&sample_rate) {
            Ok(PlaybackContext {
                sample_rate,
                is_default: false,
            })
        } else {
            Err(MirrorError::ContextCreation {
                sample_rate,
                reason: "unsupported sample rate".to_string(),
            })
        }
    }

    fn create_default(&self) -> Result<PlaybackContext> {
        Ok(PlaybackContext {
            sample_rate: self.default_rate,
            is_default: true,
        })
    }
}
