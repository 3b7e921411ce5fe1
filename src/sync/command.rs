//! Commands the session accepts and effects it produces

use std::sync::Arc;

use crate::engine::PcmBuffer;
use crate::export::{ExportOptions, ExportRequest};
use crate::window::{Edge, TimeWindow, TrackId};

/// Input event for [`Session::dispatch`](crate::sync::Session::dispatch)
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A track's display finished decoding and knows its duration
    Decoded { track: TrackId, duration: f64 },
    /// Region on `track` was dragged; bounds are in `track`'s time base
    MoveWindow { track: TrackId, start: f64, end: f64 },
    /// Region on `track` was resized; bounds are in `track`'s time base
    ResizeWindow { track: TrackId, start: f64, end: f64 },
    /// Window width typed into the duration field
    SetDuration(f64),
    /// Range slider moved, original time base
    SetSlider { start: f64, end: f64 },
    /// One bound typed into a time field, original time base
    UpdateTime { edge: Edge, value: f64 },
    Play(TrackId),
    Pause,
    Restart(TrackId),
    /// Playback of a track reached the end of its region
    Finished(TrackId),
    ExportRequested(ExportOptions),
    AudioRemoved,
    ErrorDismissed,
}

/// Host instruction, delivered in the order the session emits them
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Show `buffer` in `track`'s display
    LoadTrack { track: TrackId, buffer: Arc<PcmBuffer> },
    SetRegion { track: TrackId, window: TimeWindow },
    Pause { track: TrackId },
    /// Play `track` from the start of `window`
    Play { track: TrackId, window: TimeWindow },
    /// Window width, rounded to whole seconds
    DurationChanged(f64),
    StartExport(ExportRequest),
    ShowError { code: &'static str, message: String },
    ClearError,
    /// Drop both displays and return to the empty state
    Reset,
}

impl Effect {
    /// True for effects that start or stop playback
    pub fn is_playback(&self) -> bool {
        matches!(self, Effect::Pause { .. } | Effect::Play { .. })
    }
}
