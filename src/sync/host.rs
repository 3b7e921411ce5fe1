//! Delivery of session effects to the waveform displays

use std::sync::Arc;

use crate::engine::PcmBuffer;
use crate::export::ExportRequest;
use crate::sync::command::Effect;
use crate::window::{TimeWindow, TrackId};

/// The two waveform displays and their surrounding controls
pub trait WaveformHost {
    fn set_region(&mut self, track: TrackId, window: TimeWindow);

    /// Start `track` from the start of `window`
    fn play(&mut self, track: TrackId, window: TimeWindow);

    fn pause(&mut self, track: TrackId);

    fn start_export(&mut self, request: ExportRequest);

    fn load_track(&mut self, _track: TrackId, _buffer: Arc<PcmBuffer>) {}

    fn duration_changed(&mut self, _seconds: f64) {}

    fn show_error(&mut self, _code: &str, _message: &str) {}

    fn clear_error(&mut self) {}

    fn reset(&mut self) {}
}

/// Hand `effects` to `host` in order
pub fn apply_effects<H: WaveformHost + ?Sized>(host: &mut H, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::LoadTrack { track, buffer } => host.load_track(track, buffer),
            Effect::SetRegion { track, window } => host.set_region(track, window),
            Effect::Pause { track } => host.pause(track),
            Effect::Play { track, window } => host.play(track, window),
            Effect::DurationChanged(seconds) => host.duration_changed(seconds),
            Effect::StartExport(request) => host.start_export(request),
            Effect::ShowError { code, message } => host.show_error(code, &message),
            Effect::ClearError => host.clear_error(),
            Effect::Reset => host.reset(),
        }
    }
}
