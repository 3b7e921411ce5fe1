//! Mirror/Sync Engine
//!
//! Keeps the original and reversed displays consistent. The [`Session`]
//! reduces [`Command`]s into ordered [`Effect`]s; region effects always
//! come before playback effects so a restart reads committed geometry.

mod command;
mod host;
mod session;

pub use command::{Command, Effect};
pub use host::{apply_effects, WaveformHost};
pub use session::{LoadTicket, Session, TrackState};
