//! Window Coordinate Model
//!
//! Holds the selected window in the original track's time base. The
//! reversed track's window is always derived with [`mirror`], never stored,
//! so the two can not drift apart.
//!
//! Every setter clamps into `[0, D]` and keeps the window at least
//! `min_window` wide (or the whole track, if the track is shorter than
//! that). Setters return the committed original-space window.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};
use crate::window::time_window::{mirror, TimeWindow};
use crate::window::track::TrackId;

/// Which bound of a window a numeric edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// Selected window plus the track duration it lives in
#[derive(Debug, Clone, PartialEq)]
pub struct WindowModel {
    original: TimeWindow,
    total_duration: f64,
    min_window: f64,
}

impl WindowModel {
    /// Create a model with the default initial selection
    ///
    /// The original window starts at 0 and spans `initial_window` seconds
    /// (or the whole track if it is shorter). The reversed window is then
    /// `[max(0, D - w), D]`.
    ///
    /// # Errors
    /// * `Range` - if `total_duration` is not a positive finite number
    pub fn initial(total_duration: f64, initial_window: f64, min_window: f64) -> Result<Self> {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return Err(MirrorError::range(format!(
                "track duration must be positive, got {}",
                total_duration
            )));
        }

        let mut model = Self {
            original: TimeWindow::from_clamped(0.0, total_duration),
            total_duration,
            min_window,
        };
        model.set_by_slider(0.0, initial_window.min(total_duration))?;
        Ok(model)
    }

    #[inline]
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    #[inline]
    pub fn original_window(&self) -> TimeWindow {
        self.original
    }

    #[inline]
    pub fn reversed_window(&self) -> TimeWindow {
        mirror(self.original, self.total_duration)
    }

    /// The window in `track`'s own time base
    pub fn window(&self, track: TrackId) -> TimeWindow {
        match track {
            TrackId::Original => self.original_window(),
            TrackId::Reversed => self.reversed_window(),
        }
    }

    /// Window width rounded to whole seconds, as shown in the duration field
    pub fn rounded_duration(&self) -> f64 {
        self.original.duration().round()
    }

    /// Commit a drag-move on `track`
    ///
    /// The width is kept; a window pushed past either end of the track is
    /// translated back inside.
    pub fn set_by_move(&mut self, track: TrackId, start: f64, end: f64) -> Result<TimeWindow> {
        let (start, end) = self.to_original_space(track, start, end)?;
        let (lo, hi) = ordered(start, end);
        let width = hi - lo;
        let total = self.total_duration;

        let (lo, hi) = if width >= total {
            (0.0, total)
        } else if lo < 0.0 {
            (0.0, width)
        } else if hi > total {
            (total - width, total)
        } else {
            (lo, hi)
        };

        Ok(self.commit(lo, hi, Edge::End))
    }

    /// Commit a drag-resize on `track`
    ///
    /// The width may change, but never below the minimum window. When the
    /// minimum has to be enforced the dragged edge gives way.
    pub fn set_by_resize(&mut self, track: TrackId, start: f64, end: f64) -> Result<TimeWindow> {
        let (start, end) = self.to_original_space(track, start, end)?;
        let (start, end) = ordered(start, end);

        let dragged = if (start - self.original.start()).abs() > (end - self.original.end()).abs() {
            Edge::Start
        } else {
            Edge::End
        };

        let (lo, hi) = self.clamp_bounds(start, end);
        Ok(self.commit(lo, hi, dragged))
    }

    /// Keep the start and set the window width to `seconds`
    pub fn set_duration(&mut self, seconds: f64) -> Result<TimeWindow> {
        if !seconds.is_finite() {
            return Err(MirrorError::range(format!("window duration {} is not finite", seconds)));
        }

        let start = self.original.start();
        let end = (start + seconds.max(0.0)).min(self.total_duration);
        Ok(self.commit(start, end, Edge::End))
    }

    /// Absolute set in original space
    pub fn set_by_slider(&mut self, start: f64, end: f64) -> Result<TimeWindow> {
        check_finite(start, end)?;
        let (start, end) = ordered(start, end);
        let (lo, hi) = self.clamp_bounds(start, end);
        let grow = if hi >= self.total_duration {
            Edge::Start
        } else {
            Edge::End
        };
        Ok(self.commit(lo, hi, grow))
    }

    /// Numeric edit of one bound in original space
    pub fn update_time(&mut self, edge: Edge, value: f64) -> Result<TimeWindow> {
        let (start, end) = match edge {
            Edge::Start => (value, self.original.end()),
            Edge::End => (self.original.start(), value),
        };
        self.set_by_slider(start, end)
    }

    fn to_original_space(&self, track: TrackId, start: f64, end: f64) -> Result<(f64, f64)> {
        check_finite(start, end)?;
        Ok(match track {
            TrackId::Original => (start, end),
            TrackId::Reversed => (self.total_duration - end, self.total_duration - start),
        })
    }

    fn clamp_bounds(&self, start: f64, end: f64) -> (f64, f64) {
        (
            start.clamp(0.0, self.total_duration),
            end.clamp(0.0, self.total_duration),
        )
    }

    /// Enforce the minimum width by moving `grow`, then store
    fn commit(&mut self, start: f64, end: f64, grow: Edge) -> TimeWindow {
        let total = self.total_duration;
        let min = self.min_window;

        let (start, end) = if total <= min {
            (0.0, total)
        } else if end - start >= min {
            (start, end)
        } else {
            match grow {
                Edge::End if start + min <= total => (start, start + min),
                Edge::End => (total - min, total),
                Edge::Start if end - min >= 0.0 => (end - min, end),
                Edge::Start => (0.0, min),
            }
        };

        self.original = TimeWindow::from_clamped(start, end);
        debug!(
            "Window committed: original {} reversed {}",
            self.original,
            self.reversed_window()
        );
        self.original
    }
}

fn check_finite(start: f64, end: f64) -> Result<()> {
    if start.is_finite() && end.is_finite() {
        Ok(())
    } else {
        Err(MirrorError::range(format!(
            "window bounds must be finite (start {}, end {})",
            start, end
        )))
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
