//! Editing session
//!
//! The single owner of everything the two displays show: both buffers, the
//! selected window, transport state and the latest error. Every user or
//! display event goes through [`Session::dispatch`], which updates state
//! and returns the host effects to carry out, in order.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::engine::{
    reverse, ContextCache, ContextFactory, PcmBuffer, PlaybackAction, PlaybackContextFactory,
    PlaybackPlan, Transport,
};
use crate::error::{MirrorError, Result};
use crate::export::{track_name_from_file, ExportOptions, ExportRequest, DEFAULT_TRACK_NAME};
use crate::sync::command::{Command, Effect};
use crate::window::{TimeWindow, TrackId, TrackPair, WindowModel};

/// Bounds closer than this are treated as the same edge position
const EDGE_EPSILON: f64 = 1e-9;

/// One loaded track
#[derive(Debug, Clone)]
pub struct TrackState {
    pub buffer: Arc<PcmBuffer>,
    /// Whether the track's display has reported its decoded duration
    pub loaded: bool,
}

/// Handle for one in-flight load
///
/// Loads complete asynchronously; a ticket issued before the most recent
/// [`Session::begin_load`] or removal is stale and its result is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    file_name: String,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Editing session state
pub struct Session<F: ContextFactory = PlaybackContextFactory> {
    config: SessionConfig,
    contexts: ContextCache<F>,
    context: Option<Arc<F::Context>>,
    tracks: Option<TrackPair<TrackState>>,
    windows: Option<WindowModel>,
    transport: Transport,
    track_name: String,
    generation: u64,
    error: Option<MirrorError>,
}

impl Session<PlaybackContextFactory> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_factory(config, PlaybackContextFactory::default())
    }
}

impl<F: ContextFactory> Session<F> {
    /// Create a session whose processing contexts come from `factory`
    pub fn with_factory(config: SessionConfig, factory: F) -> Self {
        Self {
            config,
            contexts: ContextCache::new(factory),
            context: None,
            tracks: None,
            windows: None,
            transport: Transport::new(),
            track_name: DEFAULT_TRACK_NAME.to_string(),
            generation: 0,
            error: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn track_name(&self) -> &str {
        &self.track_name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Window model, once a track has been installed
    pub fn windows(&self) -> Option<&WindowModel> {
        self.windows.as_ref()
    }

    /// Current window in `track`'s time base
    pub fn window(&self, track: TrackId) -> Option<TimeWindow> {
        self.windows.as_ref().map(|model| model.window(track))
    }

    pub fn track(&self, track: TrackId) -> Option<&TrackState> {
        self.tracks.as_ref().map(|tracks| &tracks[track])
    }

    pub fn is_loaded(&self, track: TrackId) -> bool {
        self.track(track).is_some_and(|state| state.loaded)
    }

    pub fn is_playing(&self, track: TrackId) -> bool {
        self.transport.is_playing(track)
    }

    /// Processing context the installed tracks run in
    pub fn context(&self) -> Option<&Arc<F::Context>> {
        self.context.as_ref()
    }

    pub fn last_error(&self) -> Option<&MirrorError> {
        self.error.as_ref()
    }

    /// Start loading `file_name`, superseding any load in flight
    pub fn begin_load(&mut self, file_name: &str) -> LoadTicket {
        self.generation += 1;
        info!("Loading '{}' (generation {})", file_name, self.generation);
        LoadTicket {
            generation: self.generation,
            file_name: file_name.to_string(),
        }
    }

    /// Install a decoded source
    ///
    /// Reverses the buffer, acquires a processing context for its sample
    /// rate and creates the initial window. Returns the effects that load
    /// both displays, or nothing when `ticket` is stale.
    pub fn finish_load(&mut self, ticket: LoadTicket, decoded: Result<PcmBuffer>) -> Vec<Effect> {
        if ticket.generation != self.generation {
            warn!(
                "Dropping stale load of '{}' (generation {}, current {})",
                ticket.file_name, ticket.generation, self.generation
            );
            return Vec::new();
        }

        match self.install(&ticket.file_name, decoded) {
            Ok(effects) => effects,
            Err(err) => vec![self.report(err)],
        }
    }

    fn install(&mut self, file_name: &str, decoded: Result<PcmBuffer>) -> Result<Vec<Effect>> {
        let original = decoded?;
        if original.is_empty() {
            return Err(MirrorError::Decode {
                reason: format!("'{}' contains no audio frames", file_name),
                source: None,
            });
        }

        let context = self.contexts.acquire(original.sample_rate())?;
        let windows = WindowModel::initial(
            original.duration_secs(),
            self.config.initial_window_secs,
            self.config.min_window_secs,
        )?;

        let reversed = reverse(&original);
        let tracks = TrackPair::new(Arc::new(original), Arc::new(reversed)).map(|_, buffer| {
            TrackState {
                buffer,
                loaded: false,
            }
        });

        info!(
            "Installed '{}': {:.3}s, {} channel(s) at {} Hz",
            file_name,
            windows.total_duration(),
            tracks.original.buffer.channel_count(),
            tracks.original.buffer.sample_rate()
        );

        let effects = tracks
            .iter()
            .map(|(track, state)| Effect::LoadTrack {
                track,
                buffer: Arc::clone(&state.buffer),
            })
            .collect();

        self.track_name = track_name_from_file(file_name);
        self.context = Some(context);
        self.tracks = Some(tracks);
        self.windows = Some(windows);
        self.transport.reset();
        Ok(effects)
    }

    /// Store `err` as the current error and log it
    ///
    /// The latest report replaces any earlier one.
    pub fn report(&mut self, err: MirrorError) -> Effect {
        error!("[{}] {}", err.error_code(), err);
        let effect = Effect::ShowError {
            code: err.error_code(),
            message: err.friendly_message(),
        };
        self.error = Some(err);
        effect
    }

    /// Apply one command and return the resulting host effects
    ///
    /// Failures go to the error surface and come back as a single
    /// [`Effect::ShowError`].
    pub fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        debug!("[SESSION] {:?}", command);
        match self.handle(command) {
            Ok(effects) => {
                debug!("[SESSION] -> {} effect(s)", effects.len());
                effects
            }
            Err(err) => vec![self.report(err)],
        }
    }

    fn handle(&mut self, command: Command) -> Result<Vec<Effect>> {
        match command {
            Command::Decoded { track, duration } => self.on_decoded(track, duration),
            Command::MoveWindow { track, start, end } => {
                let committed = self.model_mut()?.set_by_move(track, start, end)?;
                Ok(self.after_drag(track, start, end, committed))
            }
            Command::ResizeWindow { track, start, end } => {
                let committed = self.model_mut()?.set_by_resize(track, start, end)?;
                Ok(self.after_drag(track, start, end, committed))
            }
            Command::SetDuration(seconds) => {
                self.model_mut()?.set_duration(seconds)?;
                Ok(self.after_field_edit())
            }
            Command::SetSlider { start, end } => {
                self.model_mut()?.set_by_slider(start, end)?;
                Ok(self.after_field_edit())
            }
            Command::UpdateTime { edge, value } => {
                self.model_mut()?.update_time(edge, value)?;
                Ok(self.after_field_edit())
            }
            Command::Play(track) => self.playback(PlaybackAction::Play, track),
            Command::Pause => self.playback(PlaybackAction::Pause, TrackId::Original),
            Command::Restart(track) => self.playback(PlaybackAction::Restart, track),
            Command::Finished(track) => {
                self.transport.on_finished(track);
                Ok(Vec::new())
            }
            Command::ExportRequested(options) => {
                Ok(vec![Effect::StartExport(self.export_request(&options)?)])
            }
            Command::AudioRemoved => Ok(self.remove()),
            Command::ErrorDismissed => {
                self.error = None;
                Ok(vec![Effect::ClearError])
            }
        }
    }

    fn model(&self) -> Result<&WindowModel> {
        self.windows.as_ref().ok_or(MirrorError::NotLoaded)
    }

    fn model_mut(&mut self) -> Result<&mut WindowModel> {
        self.windows.as_mut().ok_or(MirrorError::NotLoaded)
    }

    fn on_decoded(&mut self, track: TrackId, duration: f64) -> Result<Vec<Effect>> {
        let tracks = self.tracks.as_mut().ok_or(MirrorError::NotLoaded)?;
        let state = &mut tracks[track];
        state.loaded = true;

        let frame = 1.0 / f64::from(state.buffer.sample_rate());
        let model = self.windows.as_ref().ok_or(MirrorError::NotLoaded)?;
        if (duration - model.total_duration()).abs() > frame {
            warn!(
                "{} display reports {:.3}s, buffer holds {:.3}s",
                track,
                duration,
                model.total_duration()
            );
        }

        Ok(vec![
            Effect::SetRegion {
                track,
                window: model.window(track),
            },
            Effect::DurationChanged(model.rounded_duration()),
        ])
    }

    /// Effects after a drag on `track` committed `committed` (original space)
    fn after_drag(
        &mut self,
        track: TrackId,
        start: f64,
        end: f64,
        committed: TimeWindow,
    ) -> Vec<Effect> {
        let total = self.windows.as_ref().map_or(0.0, |m| m.total_duration());
        let in_space = |t: TrackId| match t {
            TrackId::Original => committed,
            TrackId::Reversed => committed.mirrored(total),
        };
        let own = in_space(track);
        let other = track.other();
        let other_window = in_space(other);

        debug!("[SYNC] {} {} -> {} {}", track, own, other, other_window);

        let mut effects = vec![Effect::SetRegion {
            track: other,
            window: other_window,
        }];

        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        if (own.start() - lo).abs() > EDGE_EPSILON || (own.end() - hi).abs() > EDGE_EPSILON {
            effects.push(Effect::SetRegion { track, window: own });
        }

        effects.push(Effect::DurationChanged(committed.duration().round()));

        if self.transport.is_playing(track) {
            let plan = self.transport.apply(PlaybackAction::Restart, track);
            self.push_plan(&mut effects, plan);
        }
        effects
    }

    /// Effects after an original-space edit from the window controls
    fn after_field_edit(&mut self) -> Vec<Effect> {
        let Some(model) = &self.windows else {
            return Vec::new();
        };

        let mut effects: Vec<Effect> = TrackId::ALL
            .iter()
            .map(|&track| Effect::SetRegion {
                track,
                window: model.window(track),
            })
            .collect();
        effects.push(Effect::DurationChanged(model.rounded_duration()));

        if let Some(track) = self.transport.playing_track() {
            let plan = self.transport.apply(PlaybackAction::Restart, track);
            self.push_plan(&mut effects, plan);
        }
        effects
    }

    fn playback(&mut self, action: PlaybackAction, track: TrackId) -> Result<Vec<Effect>> {
        if action != PlaybackAction::Pause && !self.is_loaded(track) {
            return Err(MirrorError::NotLoaded);
        }

        let plan = self.transport.apply(action, track);
        let mut effects = Vec::with_capacity(3);
        self.push_plan(&mut effects, plan);
        Ok(effects)
    }

    fn push_plan(&self, effects: &mut Vec<Effect>, plan: PlaybackPlan) {
        effects.extend(plan.pause.into_iter().map(|track| Effect::Pause { track }));
        if let Some(track) = plan.play {
            if let Some(window) = self.window(track) {
                effects.push(Effect::Play { track, window });
            }
        }
    }

    /// Build an export request from the current tracks and windows
    ///
    /// # Errors
    /// * `NotLoaded` - no source installed
    /// * `InvalidConfig` - the options select nothing or a zero bitrate
    pub fn export_request(&self, options: &ExportOptions) -> Result<ExportRequest> {
        let model = self.model()?;
        let tracks = self.tracks.as_ref().ok_or(MirrorError::NotLoaded)?;

        let buffers = tracks.as_refs().map(|_, state| Arc::clone(&state.buffer));
        let windows = TrackPair::from_fn(|track| model.window(track));

        ExportRequest::build(
            &self.track_name,
            &buffers,
            &windows,
            options,
            self.config.default_bitrate_kbps,
        )
    }

    fn remove(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.context = None;
        self.tracks = None;
        self.windows = None;
        self.transport.reset();
        self.track_name = DEFAULT_TRACK_NAME.to_string();
        self.error = None;
        info!("Audio removed (generation {})", self.generation);
        vec![Effect::Reset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlaybackContext;
    use crate::window::Edge;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    const RATE: u32 = 100;

    fn source(seconds: usize) -> PcmBuffer {
        let samples: Vec<f32> = (0..seconds * RATE as usize)
            .map(|i| (i as f32 * 0.01).sin())
            .collect();
        PcmBuffer::new(vec![samples], RATE).unwrap()
    }

    /// Session with a `seconds`-long source installed and both displays decoded
    fn loaded(seconds: usize) -> Session {
        let mut session = Session::new(SessionConfig::default());
        let ticket = session.begin_load("track.wav");
        let effects = session.finish_load(ticket, Ok(source(seconds)));
        assert_eq!(effects.len(), 2);
        for track in TrackId::ALL {
            session.dispatch(Command::Decoded {
                track,
                duration: seconds as f64,
            });
        }
        session
    }

    fn window(start: f64, end: f64) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    fn assert_window(actual: Option<TimeWindow>, start: f64, end: f64) {
        let actual = actual.unwrap();
        assert_relative_eq!(actual.start(), start, epsilon = 1e-9);
        assert_relative_eq!(actual.end(), end, epsilon = 1e-9);
    }

    #[test]
    fn test_load_installs_reversed_track() {
        let session = loaded(90);

        let original = &session.track(TrackId::Original).unwrap().buffer;
        let reversed = &session.track(TrackId::Reversed).unwrap().buffer;
        assert_eq!(reverse(original), **reversed);
        assert_eq!(session.track_name(), "track");
        assert_window(session.window(TrackId::Original), 0.0, 10.0);
        assert_window(session.window(TrackId::Reversed), 80.0, 90.0);
        assert_eq!(
            session.context().map(|c| c.as_ref()),
            Some(&PlaybackContext {
                sample_rate: 48000,
                is_default: true
            })
        );
    }

    #[test]
    fn test_decoded_creates_region() {
        let mut session = Session::new(SessionConfig::default());
        let ticket = session.begin_load("track.wav");
        session.finish_load(ticket, Ok(source(90)));

        let effects = session.dispatch(Command::Decoded {
            track: TrackId::Reversed,
            duration: 90.0,
        });
        assert_eq!(
            effects,
            vec![
                Effect::SetRegion {
                    track: TrackId::Reversed,
                    window: window(80.0, 90.0)
                },
                Effect::DurationChanged(10.0),
            ]
        );
        assert!(session.is_loaded(TrackId::Reversed));
        assert!(!session.is_loaded(TrackId::Original));
    }

    #[test]
    fn test_drag_reversed_updates_original() {
        let mut session = loaded(90);

        let effects = session.dispatch(Command::MoveWindow {
            track: TrackId::Reversed,
            start: 70.0,
            end: 85.0,
        });

        assert_eq!(
            effects,
            vec![
                Effect::SetRegion {
                    track: TrackId::Original,
                    window: window(5.0, 20.0)
                },
                Effect::DurationChanged(15.0),
            ]
        );
        assert_window(session.window(TrackId::Reversed), 70.0, 85.0);
    }

    #[test]
    fn test_clamped_drag_corrects_edited_region() {
        let mut session = loaded(90);

        let effects = session.dispatch(Command::MoveWindow {
            track: TrackId::Original,
            start: 85.0,
            end: 95.0,
        });

        assert_eq!(
            effects[..2],
            [
                Effect::SetRegion {
                    track: TrackId::Reversed,
                    window: window(0.0, 10.0)
                },
                Effect::SetRegion {
                    track: TrackId::Original,
                    window: window(80.0, 90.0)
                },
            ]
        );
    }

    #[test]
    fn test_resize_playing_track_restarts_after_regions() {
        let mut session = loaded(120);
        session.dispatch(Command::Play(TrackId::Original));

        let effects = session.dispatch(Command::ResizeWindow {
            track: TrackId::Original,
            start: 10.0,
            end: 40.0,
        });

        assert_eq!(
            effects,
            vec![
                Effect::SetRegion {
                    track: TrackId::Reversed,
                    window: window(80.0, 110.0)
                },
                Effect::DurationChanged(30.0),
                Effect::Pause {
                    track: TrackId::Original
                },
                Effect::Pause {
                    track: TrackId::Reversed
                },
                Effect::Play {
                    track: TrackId::Original,
                    window: window(10.0, 40.0)
                },
            ]
        );
        assert!(session.is_playing(TrackId::Original));
    }

    #[test]
    fn test_drag_on_paused_track_does_not_touch_playback() {
        let mut session = loaded(120);
        session.dispatch(Command::Play(TrackId::Reversed));

        let effects = session.dispatch(Command::MoveWindow {
            track: TrackId::Original,
            start: 20.0,
            end: 30.0,
        });

        assert!(effects.iter().all(|e| !e.is_playback()));
        assert!(session.is_playing(TrackId::Reversed));
    }

    #[test]
    fn test_windows_stay_mirrored() {
        let mut session = loaded(120);
        let edits = vec![
            Command::MoveWindow {
                track: TrackId::Original,
                start: 20.0,
                end: 50.0,
            },
            Command::ResizeWindow {
                track: TrackId::Reversed,
                start: 60.0,
                end: 119.0,
            },
            Command::SetDuration(7.0),
            Command::SetSlider {
                start: 33.0,
                end: 44.0,
            },
            Command::UpdateTime {
                edge: Edge::End,
                value: 100.0,
            },
        ];

        for edit in edits {
            session.dispatch(edit);
            let original = session.window(TrackId::Original).unwrap();
            let reversed = session.window(TrackId::Reversed).unwrap();
            assert_relative_eq!(reversed.start(), 120.0 - original.end(), epsilon = 1e-9);
            assert_relative_eq!(reversed.end(), 120.0 - original.start(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_slider_clamping_is_idempotent() {
        let mut session = loaded(120);

        for _ in 0..2 {
            let effects = session.dispatch(Command::SetSlider {
                start: -5.0,
                end: 200.0,
            });
            assert_eq!(
                effects[..2],
                [
                    Effect::SetRegion {
                        track: TrackId::Original,
                        window: window(0.0, 120.0)
                    },
                    Effect::SetRegion {
                        track: TrackId::Reversed,
                        window: window(0.0, 120.0)
                    },
                ]
            );
        }
    }

    #[test]
    fn test_play_pauses_other_track() {
        let mut session = loaded(30);

        session.dispatch(Command::Play(TrackId::Original));
        let effects = session.dispatch(Command::Play(TrackId::Reversed));

        assert_eq!(
            effects,
            vec![
                Effect::Pause {
                    track: TrackId::Original
                },
                Effect::Play {
                    track: TrackId::Reversed,
                    window: window(20.0, 30.0)
                },
            ]
        );
        assert!(!session.is_playing(TrackId::Original));
    }

    #[test]
    fn test_pause_and_finish() {
        let mut session = loaded(30);
        session.dispatch(Command::Play(TrackId::Original));

        session.dispatch(Command::Finished(TrackId::Original));
        assert!(!session.is_playing(TrackId::Original));

        let effects = session.dispatch(Command::Pause);
        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(|e| matches!(e, Effect::Pause { .. })));
    }

    #[test]
    fn test_edits_before_load_report_error() {
        let mut session = Session::new(SessionConfig::default());

        let effects = session.dispatch(Command::SetDuration(5.0));

        assert!(matches!(
            effects.as_slice(),
            [Effect::ShowError {
                code: "NOT_LOADED",
                ..
            }]
        ));
        assert!(matches!(session.last_error(), Some(MirrorError::NotLoaded)));
    }

    #[test]
    fn test_non_finite_edit_is_rejected() {
        let mut session = loaded(30);
        let before = session.window(TrackId::Original);

        session.dispatch(Command::MoveWindow {
            track: TrackId::Original,
            start: f64::NAN,
            end: 3.0,
        });

        assert_eq!(session.window(TrackId::Original), before);
        assert!(matches!(session.last_error(), Some(MirrorError::Range { .. })));
    }

    #[test]
    fn test_latest_error_wins_and_dismiss_keeps_tracks() {
        let mut session = loaded(30);
        session.report(MirrorError::NotLoaded);
        session.report(MirrorError::encode("boom"));
        assert!(matches!(session.last_error(), Some(MirrorError::Encode { .. })));

        let effects = session.dispatch(Command::ErrorDismissed);
        assert_eq!(effects, vec![Effect::ClearError]);
        assert!(session.last_error().is_none());
        assert!(session.is_loaded(TrackId::Original));
    }

    #[test]
    fn test_stale_load_is_ignored() {
        let mut session = Session::new(SessionConfig::default());
        let first = session.begin_load("first.wav");
        let second = session.begin_load("second.wav");

        assert!(session.finish_load(first, Ok(source(5))).is_empty());
        assert!(session.windows().is_none());

        session.finish_load(second, Ok(source(5)));
        assert_eq!(session.track_name(), "second");
    }

    #[test]
    fn test_load_superseded_by_removal() {
        let mut session = Session::new(SessionConfig::default());
        let ticket = session.begin_load("a.wav");
        session.dispatch(Command::AudioRemoved);

        assert!(session.finish_load(ticket, Ok(source(5))).is_empty());
        assert!(session.track(TrackId::Original).is_none());
    }

    #[test]
    fn test_decode_failure_reported() {
        let mut session = Session::new(SessionConfig::default());
        let ticket = session.begin_load("bad.mp3");

        let effects = session.finish_load(
            ticket,
            Err(MirrorError::Decode {
                reason: "garbage".to_string(),
                source: None,
            }),
        );

        assert!(matches!(
            effects.as_slice(),
            [Effect::ShowError {
                code: "DECODE_ERROR",
                ..
            }]
        ));
        assert!(session.windows().is_none());
    }

    #[test]
    fn test_audio_removed_resets_state() {
        let mut session = loaded(30);
        session.dispatch(Command::Play(TrackId::Original));
        let generation = session.generation();

        let effects = session.dispatch(Command::AudioRemoved);

        assert_eq!(effects, vec![Effect::Reset]);
        assert_eq!(session.generation(), generation + 1);
        assert!(session.windows().is_none());
        assert!(!session.is_playing(TrackId::Original));
        assert_eq!(session.track_name(), DEFAULT_TRACK_NAME);
    }

    #[test]
    fn test_export_request_uses_track_windows() {
        let mut session = loaded(90);
        session.dispatch(Command::MoveWindow {
            track: TrackId::Reversed,
            start: 70.0,
            end: 85.0,
        });

        let effects = session.dispatch(Command::ExportRequested(ExportOptions::default()));
        let [Effect::StartExport(request)] = effects.as_slice() else {
            panic!("expected a single export effect, got {:?}", effects);
        };

        assert_eq!(request.track_name, "track");
        assert_eq!(request.bitrate_kbps, 320);
        assert_window(Some(request.files[0].window), 5.0, 20.0);
        assert_window(Some(request.files[1].window), 70.0, 85.0);
    }
}
