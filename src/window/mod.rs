//! Window Coordinate Model
//!
//! Time windows, the mirror rule between original and reversed time bases,
//! and the two-track identifiers.

mod model;
mod time_window;
mod track;

pub use model::{Edge, WindowModel};
pub use time_window::{mirror, TimeWindow};
pub use track::{TrackId, TrackPair};
