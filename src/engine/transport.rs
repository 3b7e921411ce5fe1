//! Playback transport for the two tracks
//!
//! At most one track plays at a time. Playback is driven by a 3-state
//! action:
//! - `Play`: the target plays, every other track pauses
//! - `Pause`: every track pauses
//! - `Restart`: every track pauses, then the target plays from its window
//!   start (used when a playing track's window moves)

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::window::{TrackId, TrackPair};

/// Transport state of one track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// Track is paused (default state)
    #[default]
    Paused,
    /// Track is playing its window
    Playing,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Paused => write!(f, "Paused"),
            TransportState::Playing => write!(f, "Playing"),
        }
    }
}

/// Playback action requested for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackAction {
    Play,
    Pause,
    Restart,
}

/// Host-side steps needed to carry out a playback action, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackPlan {
    /// Tracks to pause, issued first
    pub pause: Vec<TrackId>,
    /// Track to start from its window, issued last
    pub play: Option<TrackId>,
}

/// Transport state of both tracks
#[derive(Debug, Clone, Default)]
pub struct Transport {
    states: TrackPair<TransportState>,
}

impl Transport {
    /// Create a transport with both tracks paused
    ///
    /// # Example
    /// ```
    /// use mirrorwave::engine::{PlaybackAction, Transport};
    /// use mirrorwave::window::TrackId;
    ///
    /// let mut transport = Transport::new();
    /// transport.apply(PlaybackAction::Play, TrackId::Reversed);
    /// assert!(transport.is_playing(TrackId::Reversed));
    /// assert!(!transport.is_playing(TrackId::Original));
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, track: TrackId) -> TransportState {
        self.states[track]
    }

    pub fn is_playing(&self, track: TrackId) -> bool {
        self.states[track] == TransportState::Playing
    }

    /// The track currently playing, if any
    pub fn playing_track(&self) -> Option<TrackId> {
        self.states
            .iter()
            .find(|(_, state)| **state == TransportState::Playing)
            .map(|(track, _)| track)
    }

    /// Update states for `action` on `track` and return the host steps
    pub fn apply(&mut self, action: PlaybackAction, track: TrackId) -> PlaybackPlan {
        let plan = match action {
            PlaybackAction::Play => PlaybackPlan {
                pause: vec![track.other()],
                play: Some(track),
            },
            PlaybackAction::Pause => PlaybackPlan {
                pause: TrackId::ALL.to_vec(),
                play: None,
            },
            PlaybackAction::Restart => PlaybackPlan {
                pause: TrackId::ALL.to_vec(),
                play: Some(track),
            },
        };

        for (id, state) in self.states.iter_mut() {
            *state = if plan.play == Some(id) {
                TransportState::Playing
            } else {
                TransportState::Paused
            };
        }

        debug!(
            "[TRANSPORT] {:?} on {}: original {}, reversed {}",
            action, track, self.states.original, self.states.reversed
        );
        plan
    }

    /// Playback of `track` reached the end of its window
    pub fn on_finished(&mut self, track: TrackId) {
        self.states[track] = TransportState::Paused;
    }

    /// Pause everything without producing host steps
    pub fn reset(&mut self) {
        self.states = TrackPair::default();
    }
}
