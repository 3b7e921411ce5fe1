//! Time windows and the mirror rule

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};

/// A selected time range in seconds, `0 <= start < end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    /// Create a window
    ///
    /// # Errors
    /// * `Range` - if a bound is not finite, `start < 0`, or `end <= start`
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(MirrorError::range(format!(
                "window bounds must be finite (start {}, end {})",
                start, end
            )));
        }
        if start < 0.0 {
            return Err(MirrorError::range(format!("window start {} is negative", start)));
        }
        if end <= start {
            return Err(MirrorError::range(format!(
                "window end {} is not after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a window from bounds the caller has already clamped
    pub(crate) fn from_clamped(start: f64, end: f64) -> Self {
        debug_assert!(start >= 0.0 && end >= start, "bad window [{}, {}]", start, end);
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The same window seen on a track of `total_duration` played backwards
    #[inline]
    pub fn mirrored(self, total_duration: f64) -> TimeWindow {
        mirror(self, total_duration)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s]", self.start, self.end)
    }
}

/// Map a window between original and reversed time bases
///
/// `[s, e]` on a track of duration `D` becomes `[D - e, D - s]`. Applying it
/// twice returns the input window.
///
/// # Example
/// ```
/// use mirrorwave::window::{mirror, TimeWindow};
///
/// let window = TimeWindow::new(0.0, 10.0).unwrap();
/// let reversed = mirror(window, 90.0);
/// assert_eq!((reversed.start(), reversed.end()), (80.0, 90.0));
/// assert_eq!(mirror(reversed, 90.0), window);
/// ```
pub fn mirror(window: TimeWindow, total_duration: f64) -> TimeWindow {
    TimeWindow {
        start: total_duration - window.end,
        end: total_duration - window.start,
    }
}
