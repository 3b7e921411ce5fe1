//! Track identifiers
//!
//! The editor always works on exactly two coupled tracks. `TrackPair<T>`
//! makes that a property of the type rather than of string keys.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MirrorError;

/// One of the two mirrored tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackId {
    Original,
    Reversed,
}

impl TrackId {
    pub const ALL: [TrackId; 2] = [TrackId::Original, TrackId::Reversed];

    /// The counterpart track
    pub fn other(self) -> TrackId {
        match self {
            TrackId::Original => TrackId::Reversed,
            TrackId::Reversed => TrackId::Original,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrackId::Original => "original",
            TrackId::Reversed => "reversed",
        }
    }

    /// Tag used in export filenames
    pub fn label(self) -> &'static str {
        match self {
            TrackId::Original => "ORIGINAL",
            TrackId::Reversed => "REVERSED",
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackId {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(TrackId::Original),
            "reversed" => Ok(TrackId::Reversed),
            other => Err(MirrorError::InvalidConfig {
                reason: format!("unknown track '{}'", other),
            }),
        }
    }
}

/// Exactly one value per track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPair<T> {
    pub original: T,
    pub reversed: T,
}

impl<T> TrackPair<T> {
    pub fn new(original: T, reversed: T) -> Self {
        Self { original, reversed }
    }

    /// Build a pair by calling `f` for each track, original first
    pub fn from_fn(mut f: impl FnMut(TrackId) -> T) -> Self {
        let original = f(TrackId::Original);
        let reversed = f(TrackId::Reversed);
        Self { original, reversed }
    }

    pub fn map<U>(self, mut f: impl FnMut(TrackId, T) -> U) -> TrackPair<U> {
        TrackPair {
            original: f(TrackId::Original, self.original),
            reversed: f(TrackId::Reversed, self.reversed),
        }
    }

    pub fn as_refs(&self) -> TrackPair<&T> {
        TrackPair {
            original: &self.original,
            reversed: &self.reversed,
        }
    }

    /// Iterate in track order, original first
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &T)> {
        [
            (TrackId::Original, &self.original),
            (TrackId::Reversed, &self.reversed),
        ]
        .into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TrackId, &mut T)> {
        [
            (TrackId::Original, &mut self.original),
            (TrackId::Reversed, &mut self.reversed),
        ]
        .into_iter()
    }
}

impl<T> Index<TrackId> for TrackPair<T> {
    type Output = T;

    fn index(&self, track: TrackId) -> &T {
        match track {
            TrackId::Original => &self.original,
            TrackId::Reversed => &self.reversed,
        }
    }
}

impl<T> IndexMut<TrackId> for TrackPair<T> {
    fn index_mut(&mut self, track: TrackId) -> &mut T {
        match track {
            TrackId::Original => &mut self.original,
            TrackId::Reversed => &mut self.reversed,
        }
    }
}
